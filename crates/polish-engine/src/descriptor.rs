//! Rule metadata.

use polish_syntax::{LanguageLevel, Symbol};
use serde::{Deserialize, Serialize};

/// Whether a rule is part of default active sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    /// Only active when explicitly requested.
    Draft,
    Production,
}

/// How often a rule fires at one position within a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    OncePerPass,
    /// Re-invoke at the same position until the rule stops matching.
    UntilNoMatch,
}

/// A reference to the same rule in another rule catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExternalRef {
    /// Catalog name (`"PMD"`, `"Sonar"`, ...).
    pub catalog: String,
    /// Key inside that catalog.
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl std::fmt::Display for ExternalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.catalog, self.key)
    }
}

/// Static description of one rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub id: Symbol,
    /// Legacy ids that still select this rule.
    pub aliases: Vec<Symbol>,
    pub external_refs: Vec<ExternalRef>,
    /// Lowest language level the rewritten code compiles under.
    pub min_level: LanguageLevel,
    pub maturity: Maturity,
    /// Classification for reporting and selection only.
    pub tags: Vec<Symbol>,
    pub repeat: RepeatPolicy,
    /// Rules that must run before this one.
    pub run_before_me: Vec<Symbol>,
    /// Rules that must run after this one.
    pub run_after_me: Vec<Symbol>,
    pub description: String,
}

impl RuleDescriptor {
    pub fn new(id: impl Into<Symbol>) -> Self {
        Self {
            id: id.into(),
            aliases: Vec::new(),
            external_refs: Vec::new(),
            min_level: LanguageLevel::BASELINE,
            maturity: Maturity::Production,
            tags: Vec::new(),
            repeat: RepeatPolicy::OncePerPass,
            run_before_me: Vec::new(),
            run_after_me: Vec::new(),
            description: String::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<Symbol>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn external(mut self, catalog: impl Into<String>, key: impl Into<String>) -> Self {
        self.external_refs.push(ExternalRef {
            catalog: catalog.into(),
            key: key.into(),
            url: None,
        });
        self
    }

    pub fn external_with_url(
        mut self,
        catalog: impl Into<String>,
        key: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.external_refs.push(ExternalRef {
            catalog: catalog.into(),
            key: key.into(),
            url: Some(url.into()),
        });
        self
    }

    pub fn min_level(mut self, level: LanguageLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn draft(mut self) -> Self {
        self.maturity = Maturity::Draft;
        self
    }

    pub fn tag(mut self, tag: impl Into<Symbol>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn repeat_until_no_match(mut self) -> Self {
        self.repeat = RepeatPolicy::UntilNoMatch;
        self
    }

    /// `other` must run before this rule.
    pub fn after(mut self, other: impl Into<Symbol>) -> Self {
        self.run_before_me.push(other.into());
        self
    }

    /// `other` must run after this rule.
    pub fn before(mut self, other: impl Into<Symbol>) -> Self {
        self.run_after_me.push(other.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_draft(&self) -> bool {
        self.maturity == Maturity::Draft
    }

    pub fn has_tag(&self, tag: Symbol) -> bool {
        self.tags.contains(&tag)
    }

    /// Whether `id` is the primary id or one of the aliases.
    pub fn answers_to(&self, id: Symbol) -> bool {
        self.id == id || self.aliases.contains(&id)
    }
}
