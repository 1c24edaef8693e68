//! Rule catalog, scheduler and fixed-point driver for polish.
//!
//! The pieces fit together as follows:
//!
//! 1. Rules implement [`Mutator`] and are registered with a
//!    [`RuleDescriptor`] in a [`RuleCatalog`].
//! 2. A [`RuleSelection`] picks the active rules and
//!    [`compute_active_schedule`] orders them by their constraints.
//! 3. [`run`] applies the schedule to one tree until it reaches a fixed
//!    point, reporting events to a [`DiagnosticSink`].

pub mod catalog;
pub mod context;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod mutator;
pub mod schedule;
pub mod selection;
pub mod session;

pub use catalog::{Bundle, CatalogBuilder, RuleCatalog, RuleEntry};
pub use context::RewriteContext;
pub use descriptor::{ExternalRef, Maturity, RepeatPolicy, RuleDescriptor};
pub use diagnostics::{DiagnosticSink, Diagnostics, EventKind, MutationEvent, NullSink};
pub use error::{CatalogError, ScheduleError};
pub use mutator::{FnMutator, Granularity, Mutator};
pub use schedule::{AsymmetricConstraint, Schedule, compute_active_schedule};
pub use selection::RuleSelection;
pub use session::{DriverConfig, MutationSession, RunOutcome, run};
