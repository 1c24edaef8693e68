//! The rule catalog: every registered rule plus named bundles.

use std::collections::{BTreeMap, HashMap};

use polish_syntax::Symbol;

use crate::descriptor::RuleDescriptor;
use crate::error::CatalogError;
use crate::mutator::Mutator;

/// A registered rule.
pub struct RuleEntry {
    pub descriptor: RuleDescriptor,
    pub mutator: Box<dyn Mutator>,
}

impl RuleEntry {
    pub fn id(&self) -> Symbol {
        self.descriptor.id
    }
}

impl std::fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEntry")
            .field("id", &self.descriptor.id)
            .field("mutator", &self.mutator.name())
            .finish()
    }
}

/// A named group of rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub id: Symbol,
    pub description: String,
    /// Primary ids, sorted.
    pub members: Vec<Symbol>,
}

enum BundleMembers {
    Listed(Vec<Symbol>),
    Matching(Box<dyn Fn(&RuleDescriptor) -> bool>),
}

struct BundleSpec {
    id: Symbol,
    description: String,
    members: BundleMembers,
}

/// Collects rules and bundles, then validates them into a [`RuleCatalog`].
#[derive(Default)]
pub struct CatalogBuilder {
    entries: Vec<RuleEntry>,
    bundles: Vec<BundleSpec>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule.
    pub fn rule(mut self, descriptor: RuleDescriptor, mutator: impl Mutator + 'static) -> Self {
        self.register(descriptor, mutator);
        self
    }

    pub fn register(&mut self, descriptor: RuleDescriptor, mutator: impl Mutator + 'static) {
        self.entries.push(RuleEntry {
            descriptor,
            mutator: Box::new(mutator),
        });
    }

    /// Register a bundle with an explicit member list (ids or aliases).
    pub fn bundle(
        mut self,
        id: impl Into<Symbol>,
        description: impl Into<String>,
        members: impl IntoIterator<Item = Symbol>,
    ) -> Self {
        self.bundles.push(BundleSpec {
            id: id.into(),
            description: description.into(),
            members: BundleMembers::Listed(members.into_iter().collect()),
        });
        self
    }

    /// Register a bundle of every rule whose descriptor matches `filter`.
    pub fn bundle_where(
        mut self,
        id: impl Into<Symbol>,
        description: impl Into<String>,
        filter: impl Fn(&RuleDescriptor) -> bool + 'static,
    ) -> Self {
        self.bundles.push(BundleSpec {
            id: id.into(),
            description: description.into(),
            members: BundleMembers::Matching(Box::new(filter)),
        });
        self
    }

    /// Validate ids and ordering constraints.
    ///
    /// Primary ids, aliases and bundle ids share one namespace. Ordering
    /// constraints naming an alias are rewritten to the primary id.
    pub fn build(self) -> Result<RuleCatalog, CatalogError> {
        let CatalogBuilder {
            mut entries,
            bundles,
        } = self;
        entries.sort_by(|a, b| a.descriptor.id.cmp(&b.descriptor.id));

        let mut primary: HashMap<Symbol, usize> = HashMap::new();
        let mut aliases: HashMap<Symbol, usize> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            let id = entry.descriptor.id;
            if primary.insert(id, index).is_some() {
                return Err(CatalogError::DuplicateId { id });
            }
        }
        for (index, entry) in entries.iter().enumerate() {
            for &alias in &entry.descriptor.aliases {
                if primary.contains_key(&alias) || aliases.insert(alias, index).is_some() {
                    return Err(CatalogError::DuplicateId { id: alias });
                }
            }
        }

        let canonical = |id: Symbol| -> Option<Symbol> {
            primary
                .get(&id)
                .or_else(|| aliases.get(&id))
                .map(|&index| entries[index].descriptor.id)
        };

        let mut canonicalized = Vec::with_capacity(entries.len());
        for entry in &entries {
            let rule = entry.descriptor.id;
            let resolve = |targets: &[Symbol]| -> Result<Vec<Symbol>, CatalogError> {
                let mut out = Vec::with_capacity(targets.len());
                for &target in targets {
                    let id = canonical(target)
                        .ok_or(CatalogError::UnknownOrderingTarget { rule, target })?;
                    if !out.contains(&id) {
                        out.push(id);
                    }
                }
                Ok(out)
            };
            canonicalized.push((
                resolve(&entry.descriptor.run_before_me)?,
                resolve(&entry.descriptor.run_after_me)?,
            ));
        }

        let mut resolved_bundles = BTreeMap::new();
        for spec in bundles {
            if primary.contains_key(&spec.id)
                || aliases.contains_key(&spec.id)
                || resolved_bundles.contains_key(&spec.id)
            {
                return Err(CatalogError::DuplicateId { id: spec.id });
            }
            let mut members = match spec.members {
                BundleMembers::Listed(ids) => {
                    let mut members = Vec::with_capacity(ids.len());
                    for rule in ids {
                        let id = canonical(rule).ok_or(CatalogError::UnknownBundleMember {
                            bundle: spec.id,
                            rule,
                        })?;
                        members.push(id);
                    }
                    members
                }
                BundleMembers::Matching(filter) => entries
                    .iter()
                    .filter(|e| filter(&e.descriptor))
                    .map(|e| e.descriptor.id)
                    .collect(),
            };
            members.sort();
            members.dedup();
            resolved_bundles.insert(
                spec.id,
                Bundle {
                    id: spec.id,
                    description: spec.description,
                    members,
                },
            );
        }

        for (entry, (before, after)) in entries.iter_mut().zip(canonicalized) {
            entry.descriptor.run_before_me = before;
            entry.descriptor.run_after_me = after;
        }

        tracing::debug!(
            rules = entries.len(),
            bundles = resolved_bundles.len(),
            "rule catalog built"
        );
        Ok(RuleCatalog {
            entries,
            primary,
            aliases,
            bundles: resolved_bundles,
        })
    }
}

/// Validated registry of rules and bundles.
///
/// Read-only after construction; shared between parallel sessions.
pub struct RuleCatalog {
    /// Sorted by primary id.
    entries: Vec<RuleEntry>,
    primary: HashMap<Symbol, usize>,
    aliases: HashMap<Symbol, usize>,
    bundles: BTreeMap<Symbol, Bundle>,
}

impl RuleCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// All rules, sorted by primary id.
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look a rule up by primary id or alias.
    pub fn get(&self, id: Symbol) -> Option<&RuleEntry> {
        self.primary
            .get(&id)
            .or_else(|| self.aliases.get(&id))
            .map(|&index| &self.entries[index])
    }

    /// The primary id a rule id or alias refers to.
    pub fn canonical(&self, id: Symbol) -> Option<Symbol> {
        self.get(id).map(RuleEntry::id)
    }

    pub fn bundle(&self, id: Symbol) -> Option<&Bundle> {
        self.bundles.get(&id)
    }

    /// All bundles, sorted by id.
    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.values()
    }
}

impl std::fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCatalog")
            .field("entries", &self.entries)
            .field("bundles", &self.bundles)
            .finish()
    }
}
