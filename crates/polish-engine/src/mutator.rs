//! The mutator contract.
//!
//! A mutator is one rewrite rule: a match-and-rewrite function over nodes of
//! one granularity. Given a node it either performs a coherent rewrite
//! through the [`RewriteContext`] primitives and returns `true`, or leaves
//! the tree untouched and returns `false`.

use polish_syntax::{NodeCategory, NodeRef};

use crate::context::RewriteContext;

/// Which nodes the driver offers to a mutator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Expression nodes.
    Expression,
    /// Statement nodes; the rule may also rewrite a window of the following
    /// sibling statements.
    Statement,
    /// Every node.
    Node,
}

impl Granularity {
    pub fn admits(self, category: NodeCategory) -> bool {
        match self {
            Granularity::Expression => category == NodeCategory::Expression,
            Granularity::Statement => category == NodeCategory::Statement,
            Granularity::Node => true,
        }
    }
}

/// A pattern that matches and rewrites syntax tree nodes.
///
/// # Contract
///
/// - Unresolvable types mean "no match", never an error.
/// - A `false` return leaves the tree as found. The context primitives are
///   atomic, so a rule that builds its replacement first and commits it with
///   a single primitive call satisfies this automatically.
/// - No state is kept across invocations.
pub trait Mutator: Send + Sync {
    fn granularity(&self) -> Granularity;

    /// Attempt to match and rewrite `node`.
    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool;

    /// Optional: return a human-readable name for debugging.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A mutator backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnMutator {
    granularity: Granularity,
    f: fn(&mut RewriteContext<'_>, NodeRef) -> bool,
}

impl FnMutator {
    pub const fn new(granularity: Granularity, f: fn(&mut RewriteContext<'_>, NodeRef) -> bool) -> Self {
        Self { granularity, f }
    }

    pub const fn expression(f: fn(&mut RewriteContext<'_>, NodeRef) -> bool) -> Self {
        Self::new(Granularity::Expression, f)
    }

    pub const fn statement(f: fn(&mut RewriteContext<'_>, NodeRef) -> bool) -> Self {
        Self::new(Granularity::Statement, f)
    }

    pub const fn node(f: fn(&mut RewriteContext<'_>, NodeRef) -> bool) -> Self {
        Self::new(Granularity::Node, f)
    }
}

impl Mutator for FnMutator {
    fn granularity(&self) -> Granularity {
        self.granularity
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        (self.f)(cx, node)
    }
}

impl std::fmt::Debug for FnMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMutator")
            .field("granularity", &self.granularity)
            .finish_non_exhaustive()
    }
}
