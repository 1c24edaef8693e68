//! Configuration-time errors.
//!
//! Everything here is raised while building the catalog or computing a
//! schedule, never while rewriting a unit.

use derive_more::{Display, Error};
use polish_syntax::Symbol;

/// Inconsistencies detected while building a [`RuleCatalog`](crate::RuleCatalog).
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum CatalogError {
    #[display("duplicate rule id `{id}`")]
    DuplicateId { id: Symbol },

    #[display("rule `{rule}` has an ordering constraint on unknown rule `{target}`")]
    UnknownOrderingTarget { rule: Symbol, target: Symbol },

    #[display("bundle `{bundle}` names unknown rule `{rule}`")]
    UnknownBundleMember { bundle: Symbol, rule: Symbol },
}

/// Errors raised while selecting and ordering the active rule set.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum ScheduleError {
    #[display("ordering constraints form a cycle: {}", join_ids(rules))]
    Cycle { rules: Vec<Symbol> },

    #[display("unknown rule or bundle `{id}`")]
    UnknownRule { id: Symbol },
}

fn join_ids(ids: &[Symbol]) -> String {
    ids.iter()
        .map(Symbol::to_text)
        .collect::<Vec<_>>()
        .join(", ")
}
