//! Choosing the active rule set.

use std::collections::BTreeSet;

use polish_syntax::{LanguageLevel, Symbol};
use serde::Deserialize;

use crate::catalog::RuleCatalog;
use crate::error::ScheduleError;

/// Which rules take part in a session.
///
/// An empty `include` list selects every production rule. Naming a rule (by
/// id or alias) or a bundle opts its members in even when they are drafts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSelection {
    /// Rule ids, aliases or bundle ids.
    pub include: Vec<Symbol>,
    /// If non-empty, only rules carrying one of these tags.
    pub tags: Vec<Symbol>,
    /// Rule ids, aliases or bundle ids to drop.
    pub exclude: Vec<Symbol>,
    /// Admit draft rules without naming them.
    pub include_draft: bool,
    /// Target language level of the project.
    pub language_level: LanguageLevel,
}

impl RuleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, id: impl Into<Symbol>) -> Self {
        self.include.push(id.into());
        self
    }

    pub fn exclude(mut self, id: impl Into<Symbol>) -> Self {
        self.exclude.push(id.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<Symbol>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_drafts(mut self) -> Self {
        self.include_draft = true;
        self
    }

    pub fn language_level(mut self, level: LanguageLevel) -> Self {
        self.language_level = level;
        self
    }

    /// Resolve the selection to a set of primary ids.
    pub fn resolve(&self, catalog: &RuleCatalog) -> Result<BTreeSet<Symbol>, ScheduleError> {
        let mut explicit = BTreeSet::new();
        let mut candidates = BTreeSet::new();
        if self.include.is_empty() {
            candidates.extend(catalog.entries().iter().map(|e| e.id()));
        } else {
            for &id in &self.include {
                let members = expand(catalog, id)?;
                explicit.extend(members.iter().copied());
                candidates.extend(members);
            }
        }

        let mut excluded = BTreeSet::new();
        for &id in &self.exclude {
            excluded.extend(expand(catalog, id)?);
        }

        let active = candidates
            .into_iter()
            .filter(|id| !excluded.contains(id))
            .filter(|&id| {
                let Some(entry) = catalog.get(id) else {
                    return false;
                };
                let descriptor = &entry.descriptor;
                if descriptor.is_draft() && !self.include_draft && !explicit.contains(&id) {
                    return false;
                }
                if descriptor.min_level > self.language_level {
                    tracing::trace!(rule = %id, level = %self.language_level, "rule needs a newer language level");
                    return false;
                }
                self.tags.is_empty() || self.tags.iter().any(|&t| descriptor.has_tag(t))
            })
            .collect();
        Ok(active)
    }
}

/// The primary ids a rule id, alias or bundle id stands for.
fn expand(catalog: &RuleCatalog, id: Symbol) -> Result<Vec<Symbol>, ScheduleError> {
    if let Some(primary) = catalog.canonical(id) {
        return Ok(vec![primary]);
    }
    match catalog.bundle(id) {
        Some(bundle) => Ok(bundle.members.clone()),
        None => Err(ScheduleError::UnknownRule { id }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RewriteContext;
    use crate::descriptor::RuleDescriptor;
    use crate::mutator::FnMutator;
    use polish_syntax::NodeRef;

    fn never(_cx: &mut RewriteContext<'_>, _node: NodeRef) -> bool {
        false
    }

    fn catalog() -> RuleCatalog {
        let m = FnMutator::expression(never);
        RuleCatalog::builder()
            .rule(RuleDescriptor::new("Alpha").alias("OldAlpha"), m)
            .rule(RuleDescriptor::new("Beta").tag("Controversial"), m)
            .rule(RuleDescriptor::new("Gamma").draft(), m)
            .rule(RuleDescriptor::new("Delta").min_level(LanguageLevel::V11), m)
            .bundle("Everything", "", [Symbol::new("Alpha"), Symbol::new("Gamma")])
            .build()
            .unwrap()
    }

    fn ids(set: &BTreeSet<Symbol>) -> Vec<String> {
        set.iter().map(Symbol::to_text).collect()
    }

    #[test]
    fn default_selection_skips_drafts_and_newer_levels() {
        let active = RuleSelection::new().resolve(&catalog()).unwrap();
        assert_eq!(ids(&active), ["Alpha", "Beta"]);
    }

    #[test]
    fn level_admits_newer_rules() {
        let active = RuleSelection::new()
            .language_level(LanguageLevel::V17)
            .with_drafts()
            .resolve(&catalog())
            .unwrap();
        assert_eq!(ids(&active), ["Alpha", "Beta", "Delta", "Gamma"]);
    }

    #[test]
    fn naming_a_draft_opts_in() {
        let active = RuleSelection::new()
            .include("OldAlpha")
            .include("Gamma")
            .resolve(&catalog())
            .unwrap();
        assert_eq!(ids(&active), ["Alpha", "Gamma"]);

        let bundle = RuleSelection::new().include("Everything").resolve(&catalog()).unwrap();
        assert_eq!(ids(&bundle), ["Alpha", "Gamma"]);
    }

    #[test]
    fn tags_and_exclusions() {
        let tagged = RuleSelection::new().tag("Controversial").resolve(&catalog()).unwrap();
        assert_eq!(ids(&tagged), ["Beta"]);

        let excluded = RuleSelection::new().exclude("OldAlpha").resolve(&catalog()).unwrap();
        assert_eq!(ids(&excluded), ["Beta"]);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = RuleSelection::new().include("Nope").resolve(&catalog()).unwrap_err();
        assert_eq!(err, ScheduleError::UnknownRule { id: Symbol::new("Nope") });
    }

    #[test]
    fn deserializes_from_json() {
        let selection: RuleSelection = serde_json::from_str(
            r#"{"include": ["SafeAndConsensual"], "exclude": ["Beta"], "language_level": 11}"#,
        )
        .unwrap();
        assert_eq!(selection.include, vec![Symbol::new("SafeAndConsensual")]);
        assert_eq!(selection.language_level, LanguageLevel::V11);
        assert!(!selection.include_draft);
    }
}
