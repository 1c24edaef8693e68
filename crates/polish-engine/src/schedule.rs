//! Ordering the active rule set.
//!
//! Ordering constraints form a directed graph where `A -> B` means "A runs
//! before B". The schedule is a topological order of that graph with ties
//! broken by ascending rule id, so the same active set always yields the
//! same order.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use polish_syntax::Symbol;

use crate::catalog::{RuleCatalog, RuleEntry};
use crate::error::ScheduleError;
use crate::selection::RuleSelection;

/// An ordering constraint declared on only one of the two rules involved.
///
/// Such constraints are still honored; they are reported so rule authors
/// can declare them on both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AsymmetricConstraint {
    pub before: Symbol,
    pub after: Symbol,
    /// The rule whose descriptor declares the constraint.
    pub declared_by: Symbol,
}

impl std::fmt::Display for AsymmetricConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` before `{}` is declared only by `{}`",
            self.before, self.after, self.declared_by
        )
    }
}

/// The active rules in execution order.
#[derive(Debug)]
pub struct Schedule<'c> {
    entries: Vec<&'c RuleEntry>,
    lints: Vec<AsymmetricConstraint>,
}

impl<'c> Schedule<'c> {
    pub fn entries(&self) -> &[&'c RuleEntry] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<Symbol> {
        self.entries.iter().map(|e| e.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One-sided constraints between active rules.
    pub fn lints(&self) -> &[AsymmetricConstraint] {
        &self.lints
    }
}

/// Select the active rules and order them.
pub fn compute_active_schedule<'c>(
    catalog: &'c RuleCatalog,
    selection: &RuleSelection,
) -> Result<Schedule<'c>, ScheduleError> {
    let active = selection.resolve(catalog)?;
    order(catalog, &active)
}

/// Order an already selected set of primary ids.
pub fn order<'c>(
    catalog: &'c RuleCatalog,
    active: &BTreeSet<Symbol>,
) -> Result<Schedule<'c>, ScheduleError> {
    let mut entries: BTreeMap<Symbol, &'c RuleEntry> = BTreeMap::new();
    for &id in active {
        let entry = catalog.get(id).ok_or(ScheduleError::UnknownRule { id })?;
        entries.insert(entry.id(), entry);
    }

    // Edges as (before, after), with who declared them.
    let mut declared: BTreeMap<(Symbol, Symbol), BTreeSet<Symbol>> = BTreeMap::new();
    for (&id, entry) in &entries {
        for &before in &entry.descriptor.run_before_me {
            if entries.contains_key(&before) {
                declared.entry((before, id)).or_default().insert(id);
            }
        }
        for &after in &entry.descriptor.run_after_me {
            if entries.contains_key(&after) {
                declared.entry((id, after)).or_default().insert(id);
            }
        }
    }

    let mut lints = Vec::new();
    for (&(before, after), by) in &declared {
        let Some(&declared_by) = by.first() else {
            continue;
        };
        if by.len() > 1 {
            continue;
        }
        tracing::debug!(%before, %after, %declared_by, "asymmetric ordering constraint");
        lints.push(AsymmetricConstraint {
            before,
            after,
            declared_by,
        });
    }

    let mut successors: BTreeMap<Symbol, BTreeSet<Symbol>> = BTreeMap::new();
    let mut in_degree: BTreeMap<Symbol, usize> = entries.keys().map(|&id| (id, 0)).collect();
    for &(before, after) in declared.keys() {
        if successors.entry(before).or_default().insert(after) {
            *in_degree.entry(after).or_default() += 1;
        }
    }

    let mut ready: BTreeSet<Symbol> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut ordered = Vec::with_capacity(entries.len());
    while let Some(id) = ready.pop_first() {
        ordered.push(entries[&id]);
        for &next in successors.get(&id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(next);
                }
            }
        }
    }

    if ordered.len() < entries.len() {
        let placed: BTreeSet<Symbol> = ordered.iter().map(|e| e.id()).collect();
        let remaining: Vec<Symbol> = entries
            .keys()
            .copied()
            .filter(|id| !placed.contains(id))
            .collect();
        return Err(ScheduleError::Cycle {
            rules: cycle_members(&remaining, &successors),
        });
    }

    tracing::debug!(rules = ordered.len(), "computed rule schedule");
    Ok(Schedule {
        entries: ordered,
        lints,
    })
}

/// The rules lying on a cycle among `remaining`, sorted by id.
///
/// Kahn's algorithm leaves cycle members and everything downstream of them;
/// strongly connected components separate the two.
fn cycle_members(
    remaining: &[Symbol],
    successors: &BTreeMap<Symbol, BTreeSet<Symbol>>,
) -> Vec<Symbol> {
    let mut graph = DiGraph::<Symbol, ()>::new();
    let index: BTreeMap<Symbol, _> = remaining
        .iter()
        .map(|&id| (id, graph.add_node(id)))
        .collect();
    for (&from, &from_ix) in &index {
        for to in successors.get(&from).into_iter().flatten() {
            if let Some(&to_ix) = index.get(to) {
                graph.add_edge(from_ix, to_ix, ());
            }
        }
    }

    let mut members: Vec<Symbol> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|ix| graph[ix])
        .collect();
    members.sort();
    members
}
