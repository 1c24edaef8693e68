//! The fixed-point driver.
//!
//! A session applies a schedule to one tree in passes. Each pass walks the
//! tree in pre-order and offers every live node to each scheduled rule whose
//! granularity admits it. Passes repeat until one makes no rewrite or the
//! pass bound is reached.

use std::panic::{AssertUnwindSafe, catch_unwind};

use polish_syntax::{NodeRef, Resolver, SyntaxTree};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::catalog::RuleEntry;
use crate::context::RewriteContext;
use crate::descriptor::RepeatPolicy;
use crate::diagnostics::{DiagnosticSink, EventKind, MutationEvent, NullSink};
use crate::schedule::Schedule;

/// Driver limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Maximum number of mutating passes.
    pub pass_bound: usize,
    /// Maximum consecutive rewrites of one repeating rule at one position.
    pub retry_cap: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pass_bound: 10,
            retry_cap: 16,
        }
    }
}

impl DriverConfig {
    pub fn with_pass_bound(mut self, pass_bound: usize) -> Self {
        self.pass_bound = pass_bound;
        self
    }

    pub fn with_retry_cap(mut self, retry_cap: usize) -> Self {
        self.retry_cap = retry_cap;
        self
    }
}

/// Result of running a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Whether any pass rewrote the tree.
    pub changed: bool,
    /// Whether a further pass would make no rewrite.
    pub converged: bool,
    /// Number of productive passes.
    pub passes: usize,
    /// Total number of rewrites applied.
    pub rewrites: usize,
}

/// Run `schedule` over `tree` until it converges or the pass bound is hit.
pub fn run(
    tree: &mut SyntaxTree,
    resolver: &dyn Resolver,
    schedule: &Schedule<'_>,
    config: DriverConfig,
    sink: &mut dyn DiagnosticSink,
) -> RunOutcome {
    MutationSession::new(tree, resolver, schedule)
        .with_config(config)
        .run(sink)
}

/// One source unit bound to a schedule.
pub struct MutationSession<'s, 'c> {
    tree: &'s mut SyntaxTree,
    resolver: &'s dyn Resolver,
    schedule: &'s Schedule<'c>,
    config: DriverConfig,
    /// Rules that panicked, by schedule index.
    disabled: Vec<bool>,
}

impl<'s, 'c> MutationSession<'s, 'c> {
    pub fn new(
        tree: &'s mut SyntaxTree,
        resolver: &'s dyn Resolver,
        schedule: &'s Schedule<'c>,
    ) -> Self {
        Self {
            tree,
            resolver,
            schedule,
            config: DriverConfig::default(),
            disabled: vec![false; schedule.len()],
        }
    }

    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn run(mut self, sink: &mut dyn DiagnosticSink) -> RunOutcome {
        let mut outcome = RunOutcome::default();
        loop {
            let pass = outcome.passes + 1;
            if outcome.passes >= self.config.pass_bound {
                // Decide convergence without touching the real tree.
                let mut probe = self.tree.clone();
                let mut disabled = self.disabled.clone();
                let pending = self.pass(&mut probe, &mut disabled, pass, &mut NullSink);
                outcome.converged = pending == 0;
                break;
            }

            let tree = &mut *self.tree;
            let rewrites = Self::run_pass(
                self.schedule,
                self.resolver,
                self.config,
                tree,
                &mut self.disabled,
                pass,
                sink,
            );
            tracing::debug!(pass, rewrites, "pass finished");
            if rewrites == 0 {
                outcome.converged = true;
                break;
            }
            outcome.passes += 1;
            outcome.rewrites += rewrites;
            outcome.changed = true;
        }

        if !outcome.converged {
            tracing::warn!(
                passes = outcome.passes,
                "rewriting did not converge within the pass bound"
            );
            sink.record(MutationEvent {
                pass: 0,
                rule: None,
                node: None,
                span: self.tree.root().map(|r| self.tree.span(r)).unwrap_or_default(),
                kind: EventKind::NonConverged {
                    passes: outcome.passes,
                },
            });
        }
        outcome
    }

    fn pass(
        &self,
        tree: &mut SyntaxTree,
        disabled: &mut [bool],
        pass: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> usize {
        Self::run_pass(
            self.schedule,
            self.resolver,
            self.config,
            tree,
            disabled,
            pass,
            sink,
        )
    }

    /// One pre-order pass; returns the number of rewrites.
    fn run_pass(
        schedule: &Schedule<'_>,
        resolver: &dyn Resolver,
        config: DriverConfig,
        tree: &mut SyntaxTree,
        disabled: &mut [bool],
        pass: usize,
        sink: &mut dyn DiagnosticSink,
    ) -> usize {
        let Some(root) = tree.root() else {
            return 0;
        };
        let mut rewrites = 0;
        let mut stack = vec![root];

        'visit: while let Some(start) = stack.pop() {
            // Destroyed or unlinked earlier in this pass.
            if !tree.is_attached(start) {
                continue;
            }
            let mut node = start;

            for (index, entry) in schedule.entries().iter().enumerate() {
                if disabled[index] {
                    continue;
                }
                let mut attempts = 0;
                loop {
                    if !entry
                        .mutator
                        .granularity()
                        .admits(tree.node(node).category())
                    {
                        break;
                    }
                    attempts += 1;
                    match invoke(entry, tree, resolver, sink, node, pass) {
                        Invocation::NoMatch => break,
                        Invocation::Panicked => {
                            disabled[index] = true;
                            break;
                        }
                        Invocation::Rewrote => {
                            rewrites += 1;
                            match tree.successor_of(node) {
                                Some(next) if tree.is_attached(next) => node = next,
                                // The position is gone; nothing left to visit here.
                                _ => continue 'visit,
                            }
                        }
                    }
                    if entry.descriptor.repeat == RepeatPolicy::OncePerPass {
                        break;
                    }
                    if attempts >= config.retry_cap {
                        tracing::debug!(rule = %entry.id(), %node, attempts, "retry cap reached");
                        sink.record(MutationEvent {
                            pass,
                            rule: Some(entry.id()),
                            node: Some(node),
                            span: tree.span(node),
                            kind: EventKind::RetryCapReached { attempts },
                        });
                        break;
                    }
                }
            }

            let children: SmallVec<[NodeRef; 8]> = tree.children(node).collect();
            stack.extend(children.into_iter().rev());
        }

        rewrites
    }
}

enum Invocation {
    NoMatch,
    Rewrote,
    Panicked,
}

fn invoke(
    entry: &RuleEntry,
    tree: &mut SyntaxTree,
    resolver: &dyn Resolver,
    sink: &mut dyn DiagnosticSink,
    node: NodeRef,
    pass: usize,
) -> Invocation {
    let rule = entry.id();
    let span = tree.span(node);
    let before = tree.revision();

    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut cx = RewriteContext::new(tree, resolver, sink, rule, pass);
        entry.mutator.mutate(&mut cx, node)
    }));

    let reported = match result {
        Ok(reported) => reported,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(%rule, %node, %message, "rule panicked; disabled for this session");
            sink.record(MutationEvent {
                pass,
                rule: Some(rule),
                node: Some(node),
                span,
                kind: EventKind::Panicked { message },
            });
            return Invocation::Panicked;
        }
    };

    let rewrote = tree.revision() != before;
    if reported != rewrote {
        tracing::debug!(%rule, %node, reported, rewrote, "rule result does not match tree state");
    }
    if !rewrote {
        return Invocation::NoMatch;
    }
    tracing::trace!(%rule, %node, pass, "rewrite applied");
    sink.record(MutationEvent {
        pass,
        rule: Some(rule),
        node: Some(node),
        span,
        kind: EventKind::Applied,
    });
    Invocation::Rewrote
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

impl std::fmt::Debug for MutationSession<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationSession")
            .field("tree", &self.tree)
            .field("rules", &self.schedule.len())
            .field("config", &self.config)
            .finish()
    }
}
