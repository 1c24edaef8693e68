//! The built-in rule library.
//!
//! Every rule is a unit struct implementing [`Mutator`](polish_engine::Mutator),
//! registered together with its descriptor by the module that defines it.
//! [`catalog`] assembles them, plus the standard bundles, into one validated
//! [`RuleCatalog`].

mod boolean;
mod boxing;
mod collections;
mod declarations;
mod expressions;
mod imports;
mod lambdas;
mod literals;
mod patterns;
mod statements;
mod strings;

#[cfg(test)]
mod testing;

use polish_engine::{CatalogBuilder, CatalogError, Maturity, RuleCatalog};
use polish_syntax::Symbol;

/// Tag marking rules whose output not every team agrees with.
pub const CONTROVERSIAL: &str = "Controversial";

/// Build the catalog of every built-in rule.
pub fn catalog() -> Result<RuleCatalog, CatalogError> {
    builder().build()
}

/// The built-in rules and bundles, open for further registrations.
pub fn builder() -> CatalogBuilder {
    let builder = CatalogBuilder::new();
    let builder = boolean::register(builder);
    let builder = expressions::register(builder);
    let builder = strings::register(builder);
    let builder = boxing::register(builder);
    let builder = collections::register(builder);
    let builder = literals::register(builder);
    let builder = lambdas::register(builder);
    let builder = statements::register(builder);
    let builder = declarations::register(builder);
    let builder = imports::register(builder);

    let controversial = Symbol::new(CONTROVERSIAL);
    builder
        .bundle_where(
            "SafeAndConsensual",
            "Production rules nobody objects to",
            move |rule| rule.maturity == Maturity::Production && !rule.has_tag(controversial),
        )
        .bundle_where(
            "SafeButControversial",
            "Production rules that are safe but a matter of taste",
            move |rule| rule.maturity == Maturity::Production && rule.has_tag(controversial),
        )
        .bundle_where("AllIncludingDraft", "Every rule, drafts included", |_| true)
}
