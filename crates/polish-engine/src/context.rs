//! Rewrite context handed to mutators.

use polish_syntax::{
    NodeBuilder, NodeKind, NodeRef, ResolutionHandle, Resolver, Span, Symbol, SyntaxTree,
    TreeError,
};
use smallvec::SmallVec;

use crate::diagnostics::{DiagnosticSink, EventKind, MutationEvent};

/// Everything a mutator may see or do during one invocation.
///
/// Reads go through the shared tree and resolver. Writes are limited to
/// constructing detached nodes and the atomic `try_*` primitives of the
/// tree; a refused primitive is recorded as a `Rejected` event.
pub struct RewriteContext<'a> {
    tree: &'a mut SyntaxTree,
    resolver: &'a dyn Resolver,
    sink: &'a mut dyn DiagnosticSink,
    rule: Symbol,
    pass: usize,
}

impl<'a> RewriteContext<'a> {
    pub fn new(
        tree: &'a mut SyntaxTree,
        resolver: &'a dyn Resolver,
        sink: &'a mut dyn DiagnosticSink,
        rule: Symbol,
        pass: usize,
    ) -> Self {
        Self {
            tree,
            resolver,
            sink,
            rule,
            pass,
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        self.tree
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver
    }

    /// The id of the rule being invoked.
    pub fn rule(&self) -> Symbol {
        self.rule
    }

    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn kind(&self, node: NodeRef) -> &NodeKind {
        self.tree.kind(node)
    }

    pub fn slot(&self, node: NodeRef, index: usize) -> Option<NodeRef> {
        self.tree.slot(node, index)
    }

    pub fn list(&self, node: NodeRef) -> &[NodeRef] {
        self.tree.list(node)
    }

    pub fn span(&self, node: NodeRef) -> Span {
        self.tree.span(node)
    }

    /// A resolution-scoped view of `node`.
    pub fn handle(&self, node: NodeRef) -> ResolutionHandle<'_> {
        ResolutionHandle::new(self.tree, self.resolver, node)
    }

    /// `len` consecutive statements starting at `first`, if that many exist.
    pub fn window(&self, first: NodeRef, len: usize) -> Option<SmallVec<[NodeRef; 4]>> {
        self.tree.list_window(first, len).map(SmallVec::from_slice)
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a detached node.
    ///
    /// # Panics
    ///
    /// Panics if the builder violates the kind's layout; the driver contains
    /// the panic and disables the rule.
    pub fn create(&mut self, builder: NodeBuilder) -> NodeRef {
        self.tree.create(builder)
    }

    pub fn try_create(&mut self, builder: NodeBuilder) -> Result<NodeRef, TreeError> {
        self.tree.try_create(builder)
    }

    /// Deep-copy a subtree into a detached one.
    pub fn clone_subtree(&mut self, node: NodeRef) -> NodeRef {
        self.tree.clone_subtree(node)
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    pub fn replace(&mut self, old: NodeRef, new: NodeRef) -> bool {
        let span = self.tree.span(old);
        let done = self.tree.try_replace(old, new);
        self.check(done, "replace", old, span)
    }

    pub fn remove(&mut self, node: NodeRef) -> bool {
        let span = self.tree.span(node);
        let done = self.tree.try_remove(node);
        self.check(done, "remove", node, span)
    }

    pub fn insert_before(&mut self, anchor: NodeRef, new: NodeRef) -> bool {
        let span = self.tree.span(anchor);
        let done = self.tree.try_insert_before(anchor, new);
        self.check(done, "insert", anchor, span)
    }

    pub fn insert_after(&mut self, anchor: NodeRef, new: NodeRef) -> bool {
        let span = self.tree.span(anchor);
        let done = self.tree.try_insert_after(anchor, new);
        self.check(done, "insert", anchor, span)
    }

    pub fn splice(&mut self, first: NodeRef, count: usize, replacements: &[NodeRef]) -> bool {
        let span = self.tree.span(first);
        let done = self.tree.try_splice(first, count, replacements);
        self.check(done, "splice", first, span)
    }

    fn check(&mut self, done: bool, primitive: &'static str, node: NodeRef, span: Span) -> bool {
        if !done {
            tracing::debug!(rule = %self.rule, %node, primitive, "rewrite rejected");
            self.sink.record(MutationEvent {
                pass: self.pass,
                rule: Some(self.rule),
                node: Some(node),
                span,
                kind: EventKind::Rejected { primitive },
            });
        }
        done
    }
}
