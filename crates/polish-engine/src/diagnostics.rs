//! Per-session diagnostic events.
//!
//! The driver reports what happened to a unit through a [`DiagnosticSink`]
//! instead of global state, so parallel sessions never share anything.

use std::fmt;

use polish_syntax::{NodeRef, Span, Symbol};

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// The rule rewrote the tree.
    Applied,
    /// A mutation primitive refused the rule's rewrite.
    Rejected { primitive: &'static str },
    /// A repeating rule still matched after the per-node retry cap.
    RetryCapReached { attempts: usize },
    /// The rule panicked and was disabled for the rest of the session.
    Panicked { message: String },
    /// The pass bound was reached and another pass would still rewrite.
    NonConverged { passes: usize },
}

/// A structured diagnostic event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationEvent {
    /// 1-based pass number; 0 for session-level events.
    pub pass: usize,
    pub rule: Option<Symbol>,
    pub node: Option<NodeRef>,
    pub span: Span,
    pub kind: EventKind,
}

impl fmt::Display for MutationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pass > 0 {
            write!(f, "pass {}: ", self.pass)?;
        }
        if let Some(rule) = self.rule {
            write!(f, "{rule}: ")?;
        }
        match &self.kind {
            EventKind::Applied => write!(f, "applied at {}", self.span),
            EventKind::Rejected { primitive } => {
                write!(f, "{primitive} rejected at {}", self.span)
            }
            EventKind::RetryCapReached { attempts } => {
                write!(f, "still matching after {attempts} attempts at {}", self.span)
            }
            EventKind::Panicked { message } => {
                write!(f, "panicked at {} ({message}); rule disabled", self.span)
            }
            EventKind::NonConverged { passes } => {
                write!(f, "did not converge within {passes} pass(es)")
            }
        }
    }
}

/// Receiver of diagnostic events.
pub trait DiagnosticSink {
    fn record(&mut self, event: MutationEvent);
}

impl DiagnosticSink for Vec<MutationEvent> {
    fn record(&mut self, event: MutationEvent) {
        self.push(event);
    }
}

/// A sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _event: MutationEvent) {}
}

/// Collected events of one session, with summary helpers.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    events: Vec<MutationEvent>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MutationEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<MutationEvent> {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of applied rewrites per rule, sorted by rule id.
    pub fn applied_by_rule(&self) -> Vec<(Symbol, usize)> {
        let mut counts: std::collections::BTreeMap<Symbol, usize> = Default::default();
        for event in &self.events {
            if let (EventKind::Applied, Some(rule)) = (&event.kind, event.rule) {
                *counts.entry(rule).or_default() += 1;
            }
        }
        counts.into_iter().collect()
    }

    /// Events other than `Applied`.
    pub fn problems(&self) -> impl Iterator<Item = &MutationEvent> {
        self.events
            .iter()
            .filter(|e| !matches!(e.kind, EventKind::Applied))
    }
}

impl DiagnosticSink for Diagnostics {
    fn record(&mut self, event: MutationEvent) {
        self.events.push(event);
    }
}
