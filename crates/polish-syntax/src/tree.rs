//! SyntaxTree: arena-based mutable syntax tree storage.
//!
//! All nodes are stored in a `PrimaryMap` owned by the `SyntaxTree`. Each node
//! keeps a parent back-link, its fixed slots and its variadic list. The tree
//! exposes two kinds of mutation:
//!
//! - construction of *detached* nodes (`create`, `clone_subtree`), which is
//!   never observable through the attached tree;
//! - the `try_*` primitives, which check every structural precondition before
//!   touching anything and either commit completely (returning `true`) or
//!   leave the tree exactly as found (returning `false`).
//!
//! Nodes removed from the tree are destroyed: they stay in the arena (refs
//! are never reused) but are marked dead. A replaced node records its
//! successor, so a caller holding a stale ref can find "the node now at this
//! position" via [`SyntaxTree::successor_of`].

use std::sync::atomic::{AtomicU64, Ordering};

use cranelift_entity::PrimaryMap;
use derive_more::{Display, Error};
use smallvec::SmallVec;

use crate::kind::{NodeCategory, NodeKind, SlotClass};
use crate::location::Span;
use crate::refs::{NodeRef, Position};
use crate::types::TypeDesc;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Errors
// ============================================================================

/// Structural errors reported by checked construction.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum TreeError {
    #[display("{kind}: expected at most {expected} slot(s), found {found}")]
    ArityMismatch {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[display("{kind}: required slot #{index} is empty")]
    MissingSlot { kind: &'static str, index: usize },
    #[display("{kind}: {position} does not accept a {child} node")]
    RejectedChild {
        kind: &'static str,
        position: Position,
        child: &'static str,
    },
    #[display("{kind}: list needs at least {min} element(s), found {found}")]
    ListTooShort {
        kind: &'static str,
        min: usize,
        found: usize,
    },
    #[display("{kind}: node kind has no list")]
    UnexpectedList { kind: &'static str },
    #[display("node {node} is not detached")]
    NotDetached { node: NodeRef },
    #[display("node {node} is used twice")]
    DuplicateChild { node: NodeRef },
}

// ============================================================================
// NodeData
// ============================================================================

/// Data for a single node in the arena.
#[derive(Clone, Debug)]
pub struct NodeData {
    kind: NodeKind,
    span: Span,
    ty: Option<TypeDesc>,
    slots: SmallVec<[Option<NodeRef>; 3]>,
    list: SmallVec<[NodeRef; 4]>,
    parent: Option<NodeRef>,
    alive: bool,
    successor: Option<NodeRef>,
}

impl NodeData {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn category(&self) -> NodeCategory {
        self.kind.category()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Type annotation supplied by the front-end (or copied by a clone).
    pub fn ty(&self) -> Option<&TypeDesc> {
        self.ty.as_ref()
    }

    /// Fixed slots, always padded to the layout's slot count.
    pub fn slots(&self) -> &[Option<NodeRef>] {
        &self.slots
    }

    /// Variadic list children.
    pub fn list(&self) -> &[NodeRef] {
        &self.list
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

// ============================================================================
// NodeBuilder
// ============================================================================

/// Builder for detached nodes.
///
/// Slots are filled in layout order; trailing optional slots may be omitted.
#[derive(Clone, Debug)]
pub struct NodeBuilder {
    kind: NodeKind,
    span: Span,
    ty: Option<TypeDesc>,
    slots: SmallVec<[Option<NodeRef>; 3]>,
    list: SmallVec<[NodeRef; 4]>,
}

impl NodeBuilder {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            span: Span::default(),
            ty: None,
            slots: SmallVec::new(),
            list: SmallVec::new(),
        }
    }

    /// Fill the next fixed slot.
    pub fn slot(mut self, child: NodeRef) -> Self {
        self.slots.push(Some(child));
        self
    }

    /// Fill (or leave empty) the next fixed slot.
    pub fn opt_slot(mut self, child: Option<NodeRef>) -> Self {
        self.slots.push(child);
        self
    }

    /// Append a list element.
    pub fn item(mut self, child: NodeRef) -> Self {
        self.list.push(child);
        self
    }

    pub fn items(mut self, children: impl IntoIterator<Item = NodeRef>) -> Self {
        self.list.extend(children);
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn ty(mut self, ty: TypeDesc) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn opt_ty(mut self, ty: Option<TypeDesc>) -> Self {
        self.ty = ty;
        self
    }
}

// ============================================================================
// SyntaxTree
// ============================================================================

/// Arena-based mutable syntax tree.
pub struct SyntaxTree {
    nodes: PrimaryMap<NodeRef, NodeData>,
    root: Option<NodeRef>,
    /// Process-unique identity; clones get a fresh one.
    id: u64,
    /// Bumped by every committed mutation of the attached tree.
    revision: u64,
}

impl Clone for SyntaxTree {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            revision: self.revision,
        }
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("id", &self.id)
            .field("revision", &self.revision)
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl SyntaxTree {
    /// Create an empty tree with no root.
    pub fn new() -> Self {
        Self {
            nodes: PrimaryMap::new(),
            root: None,
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            revision: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    /// Make a detached node the root. A previous root is destroyed.
    pub fn set_root(&mut self, node: NodeRef) -> Result<(), TreeError> {
        if !self.is_detached(node) {
            return Err(TreeError::NotDetached { node });
        }
        if let Some(previous) = self.root.take() {
            self.destroy(previous);
        }
        self.root = Some(node);
        self.revision += 1;
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn node(&self, node: NodeRef) -> &NodeData {
        &self.nodes[node]
    }

    pub fn kind(&self, node: NodeRef) -> &NodeKind {
        &self.nodes[node].kind
    }

    pub fn span(&self, node: NodeRef) -> Span {
        self.nodes[node].span
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes[node].parent
    }

    /// The child in fixed slot `index`, if present.
    pub fn slot(&self, node: NodeRef, index: usize) -> Option<NodeRef> {
        self.nodes[node].slots.get(index).copied().flatten()
    }

    pub fn list(&self, node: NodeRef) -> &[NodeRef] {
        &self.nodes[node].list
    }

    /// All children: fixed slots in order, then the list.
    pub fn children(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        let data = &self.nodes[node];
        data.slots
            .iter()
            .filter_map(|s| *s)
            .chain(data.list.iter().copied())
    }

    /// Number of nodes ever allocated (dead ones included).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_alive(&self, node: NodeRef) -> bool {
        self.nodes[node].alive
    }

    /// Alive and not owned by any parent, and not the root.
    pub fn is_detached(&self, node: NodeRef) -> bool {
        let data = &self.nodes[node];
        data.alive && data.parent.is_none() && self.root != Some(node)
    }

    /// Alive and reachable from the root.
    pub fn is_attached(&self, node: NodeRef) -> bool {
        if !self.nodes[node].alive {
            return false;
        }
        let mut current = node;
        loop {
            if self.root == Some(current) {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeRef, node: NodeRef) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Strict ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(self.nodes[node].parent, move |&n| self.nodes[n].parent)
    }

    /// Where `node` sits inside its parent.
    pub fn position(&self, node: NodeRef) -> Option<Position> {
        let parent = self.nodes[node].parent?;
        let data = &self.nodes[parent];
        if let Some(i) = data.slots.iter().position(|s| *s == Some(node)) {
            return Some(Position::Slot(i));
        }
        data.list.iter().position(|&n| n == node).map(Position::List)
    }

    /// Follow successor links from a destroyed node to the live node that
    /// took its place. Returns `None` when the position no longer exists.
    pub fn successor_of(&self, node: NodeRef) -> Option<NodeRef> {
        let mut current = node;
        // Chains are bounded by the number of nodes; guard against cycles anyway.
        for _ in 0..=self.nodes.len() {
            let data = &self.nodes[current];
            if data.alive {
                return Some(current);
            }
            current = data.successor?;
        }
        None
    }

    /// `len` consecutive list siblings starting at `first`.
    pub fn list_window(&self, first: NodeRef, len: usize) -> Option<&[NodeRef]> {
        let parent = self.nodes[first].parent?;
        let Some(Position::List(index)) = self.position(first) else {
            return None;
        };
        self.nodes[parent].list.get(index..index + len)
    }

    /// The list sibling immediately after `node`.
    pub fn next_sibling(&self, node: NodeRef) -> Option<NodeRef> {
        self.list_window(node, 2).map(|w| w[1])
    }

    /// The list sibling immediately before `node`.
    pub fn prev_sibling(&self, node: NodeRef) -> Option<NodeRef> {
        let parent = self.nodes[node].parent?;
        let Some(Position::List(index)) = self.position(node) else {
            return None;
        };
        index
            .checked_sub(1)
            .map(|i| self.nodes[parent].list[i])
    }

    /// Live nodes reachable from the root, in pre-order.
    pub fn descendants(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            let children: SmallVec<[NodeRef; 8]> = self.children(n).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a detached node, checking it against its kind's layout.
    ///
    /// Every child must be detached; on success each child's parent link
    /// points at the new node.
    pub fn try_create(&mut self, builder: NodeBuilder) -> Result<NodeRef, TreeError> {
        let NodeBuilder {
            kind,
            span,
            ty,
            mut slots,
            list,
        } = builder;
        let layout = kind.layout();
        let tag = kind.tag();

        if slots.len() > layout.slots.len() {
            return Err(TreeError::ArityMismatch {
                kind: tag,
                expected: layout.slots.len(),
                found: slots.len(),
            });
        }
        slots.resize(layout.slots.len(), None);

        let mut seen: SmallVec<[NodeRef; 8]> = SmallVec::new();
        let mut check_child = |tree: &Self, child: NodeRef| -> Result<(), TreeError> {
            if !tree.is_detached(child) {
                return Err(TreeError::NotDetached { node: child });
            }
            if seen.contains(&child) {
                return Err(TreeError::DuplicateChild { node: child });
            }
            seen.push(child);
            Ok(())
        };

        for (index, (slot, spec)) in slots.iter().zip(layout.slots).enumerate() {
            match slot {
                Some(child) => {
                    check_child(self, *child)?;
                    if !spec.class.accepts(self.kind(*child)) {
                        return Err(TreeError::RejectedChild {
                            kind: tag,
                            position: Position::Slot(index),
                            child: self.kind(*child).tag(),
                        });
                    }
                }
                None if !spec.optional => {
                    return Err(TreeError::MissingSlot { kind: tag, index });
                }
                None => {}
            }
        }

        match layout.list {
            None if !list.is_empty() => return Err(TreeError::UnexpectedList { kind: tag }),
            None => {}
            Some(spec) => {
                if list.len() < spec.min {
                    return Err(TreeError::ListTooShort {
                        kind: tag,
                        min: spec.min,
                        found: list.len(),
                    });
                }
                for (index, &child) in list.iter().enumerate() {
                    check_child(self, child)?;
                    if !spec.class.accepts(self.kind(child)) {
                        return Err(TreeError::RejectedChild {
                            kind: tag,
                            position: Position::List(index),
                            child: self.kind(child).tag(),
                        });
                    }
                }
            }
        }

        let node = self.nodes.push(NodeData {
            kind,
            span,
            ty,
            slots,
            list,
            parent: None,
            alive: true,
            successor: None,
        });
        let children: SmallVec<[NodeRef; 8]> = self.children(node).collect();
        for child in children {
            self.nodes[child].parent = Some(node);
        }
        Ok(node)
    }

    /// Create a detached node.
    ///
    /// # Panics
    ///
    /// Panics if the builder violates the kind's layout or reuses a child that
    /// is not detached. Use [`SyntaxTree::try_create`] for untrusted input.
    pub fn create(&mut self, builder: NodeBuilder) -> NodeRef {
        match self.try_create(builder) {
            Ok(node) => node,
            Err(err) => panic!("create: {err}"),
        }
    }

    /// Deep-copy a subtree (kinds, spans and type annotations) into a new
    /// detached subtree.
    pub fn clone_subtree(&mut self, node: NodeRef) -> NodeRef {
        let data = self.nodes[node].clone();
        let slots: SmallVec<[Option<NodeRef>; 3]> = data
            .slots
            .iter()
            .map(|s| s.map(|child| self.clone_subtree(child)))
            .collect();
        let list: SmallVec<[NodeRef; 4]> = data
            .list
            .iter()
            .map(|&child| self.clone_subtree(child))
            .collect();
        let copy = self.nodes.push(NodeData {
            kind: data.kind,
            span: data.span,
            ty: data.ty,
            slots,
            list,
            parent: None,
            alive: true,
            successor: None,
        });
        let children: SmallVec<[NodeRef; 8]> = self.children(copy).collect();
        for child in children {
            self.nodes[child].parent = Some(copy);
        }
        copy
    }

    /// Set or clear the type annotation of a node.
    pub fn set_type(&mut self, node: NodeRef, ty: Option<TypeDesc>) {
        self.nodes[node].ty = ty;
        self.revision += 1;
    }

    // ========================================================================
    // Safe mutation primitives
    // ========================================================================

    /// Substitute `new` at the position of `old`.
    ///
    /// `new` must be detached, or a strict descendant of `old` (which unwraps
    /// it). Replacing the root makes `new` the root. Returns `false` without
    /// touching the tree when `old` is not attached, `new` would alias another
    /// position, or the parent's slot does not accept `new`'s kind.
    pub fn try_replace(&mut self, old: NodeRef, new: NodeRef) -> bool {
        if old == new || !self.is_attached(old) || !self.nodes[new].alive {
            return false;
        }
        let reuse = if self.is_detached(new) {
            false
        } else if self.is_ancestor(old, new) {
            true
        } else {
            return false;
        };

        match self.nodes[old].parent {
            None => {
                if reuse {
                    self.unlink(new);
                }
                self.root = Some(new);
            }
            Some(parent) => {
                let Some(position) = self.position(old) else {
                    return false;
                };
                if !self.accepts(parent, position, self.kind(new)) {
                    return false;
                }
                if reuse {
                    self.unlink(new);
                }
                match position {
                    Position::Slot(i) => self.nodes[parent].slots[i] = Some(new),
                    Position::List(i) => self.nodes[parent].list[i] = new,
                }
                self.nodes[new].parent = Some(parent);
                self.nodes[old].parent = None;
            }
        }

        self.destroy(old);
        self.nodes[old].successor = Some(new);
        self.revision += 1;
        true
    }

    /// Detach and destroy `node`.
    ///
    /// Returns `false` without touching the tree when `node` is the root, not
    /// attached, in a required slot, or in a list already at its minimum
    /// length.
    pub fn try_remove(&mut self, node: NodeRef) -> bool {
        if !self.is_attached(node) {
            return false;
        }
        let Some(parent) = self.nodes[node].parent else {
            return false;
        };
        let Some(position) = self.position(node) else {
            return false;
        };
        let layout = self.kind(parent).layout();
        match position {
            Position::Slot(i) => {
                if !layout.slots[i].optional {
                    return false;
                }
                self.nodes[parent].slots[i] = None;
            }
            Position::List(i) => {
                let min = layout.list.map_or(0, |l| l.min);
                if self.nodes[parent].list.len() <= min {
                    return false;
                }
                self.nodes[parent].list.remove(i);
            }
        }
        self.nodes[node].parent = None;
        self.destroy(node);
        self.revision += 1;
        true
    }

    /// Insert a detached node into the list right before `anchor`.
    pub fn try_insert_before(&mut self, anchor: NodeRef, new: NodeRef) -> bool {
        self.try_insert(anchor, new, 0)
    }

    /// Insert a detached node into the list right after `anchor`.
    pub fn try_insert_after(&mut self, anchor: NodeRef, new: NodeRef) -> bool {
        self.try_insert(anchor, new, 1)
    }

    fn try_insert(&mut self, anchor: NodeRef, new: NodeRef, offset: usize) -> bool {
        if !self.is_attached(anchor) || !self.is_detached(new) {
            return false;
        }
        let Some(parent) = self.nodes[anchor].parent else {
            return false;
        };
        let Some(Position::List(index)) = self.position(anchor) else {
            return false;
        };
        if !self.accepts(parent, Position::List(index), self.kind(new)) {
            return false;
        }
        self.nodes[parent].list.insert(index + offset, new);
        self.nodes[new].parent = Some(parent);
        self.revision += 1;
        true
    }

    /// Atomically replace `count` consecutive list siblings starting at
    /// `first` with `replacements`.
    ///
    /// Each replacement must be detached or a descendant of one of the
    /// replaced siblings. The first replaced node's successor becomes the
    /// first replacement.
    pub fn try_splice(&mut self, first: NodeRef, count: usize, replacements: &[NodeRef]) -> bool {
        if count == 0 || !self.is_attached(first) {
            return false;
        }
        let Some(parent) = self.nodes[first].parent else {
            return false;
        };
        let Some(Position::List(index)) = self.position(first) else {
            return false;
        };
        let Some(removed) = self.nodes[parent].list.get(index..index + count) else {
            return false;
        };
        let removed: SmallVec<[NodeRef; 4]> = removed.into();

        let layout = self.kind(parent).layout();
        let Some(spec) = layout.list else {
            return false;
        };
        let new_len = self.nodes[parent].list.len() - count + replacements.len();
        if new_len < spec.min {
            return false;
        }

        let mut reused: SmallVec<[NodeRef; 4]> = SmallVec::new();
        for (i, &new) in replacements.iter().enumerate() {
            if replacements[..i].contains(&new) || !self.nodes[new].alive {
                return false;
            }
            if removed.contains(&new) {
                return false;
            }
            if !self.is_detached(new) {
                if !removed.iter().any(|&r| self.is_ancestor(r, new)) {
                    return false;
                }
                reused.push(new);
            }
            if !spec.class.accepts(self.kind(new)) {
                return false;
            }
        }

        for &new in &reused {
            self.unlink(new);
        }
        self.nodes[parent]
            .list
            .drain(index..index + count)
            .for_each(drop);
        for (offset, &new) in replacements.iter().enumerate() {
            self.nodes[parent].list.insert(index + offset, new);
            self.nodes[new].parent = Some(parent);
        }
        for &old in &removed {
            self.nodes[old].parent = None;
            self.destroy(old);
        }
        if let Some(&head) = replacements.first() {
            self.nodes[first].successor = Some(head);
        }
        self.revision += 1;
        true
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn accepts(&self, parent: NodeRef, position: Position, kind: &NodeKind) -> bool {
        let layout = self.kind(parent).layout();
        let class = match position {
            Position::Slot(i) => layout.slots.get(i).map(|s| s.class),
            Position::List(_) => layout.list.map(|l| l.class),
        };
        class.is_some_and(|c: SlotClass| c.accepts(kind))
    }

    /// Remove `node` from its parent's storage without any layout check.
    /// Only used on parents that are about to be destroyed.
    fn unlink(&mut self, node: NodeRef) {
        let Some(parent) = self.nodes[node].parent else {
            return;
        };
        match self.position(node) {
            Some(Position::Slot(i)) => self.nodes[parent].slots[i] = None,
            Some(Position::List(i)) => {
                self.nodes[parent].list.remove(i);
            }
            None => {}
        }
        self.nodes[node].parent = None;
    }

    /// Mark a subtree dead.
    fn destroy(&mut self, node: NodeRef) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let data = &mut self.nodes[n];
            data.alive = false;
            if n != node {
                data.parent = None;
            }
            stack.extend(data.slots.iter().filter_map(|s| *s));
            stack.extend(data.list.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;
    use crate::kind::{BinaryOp, LiteralKind, PrimitiveKind, UnaryOp};

    fn name(tree: &mut SyntaxTree, text: &'static str) -> NodeRef {
        tree.create(NodeBuilder::new(NodeKind::Name {
            name: Symbol::new(text),
        }))
    }

    fn not(tree: &mut SyntaxTree, operand: NodeRef) -> NodeRef {
        tree.create(NodeBuilder::new(NodeKind::Unary { op: UnaryOp::Not }).slot(operand))
    }

    fn block_of(tree: &mut SyntaxTree, stmts: Vec<NodeRef>) -> NodeRef {
        let block = tree.create(NodeBuilder::new(NodeKind::Block).items(stmts));
        tree.set_root(block).unwrap();
        block
    }

    fn expr_stmt(tree: &mut SyntaxTree, expr: NodeRef) -> NodeRef {
        tree.create(NodeBuilder::new(NodeKind::ExprStmt).slot(expr))
    }

    #[test]
    fn create_links_children() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        let neg = not(&mut tree, x);
        assert_eq!(tree.parent(x), Some(neg));
        assert_eq!(tree.slot(neg, 0), Some(x));
        assert!(tree.is_detached(neg));
        assert!(!tree.is_detached(x));
    }

    #[test]
    fn create_rejects_wrong_child_category() {
        let mut tree = SyntaxTree::new();
        let ty = tree.create(NodeBuilder::new(NodeKind::PrimitiveType {
            primitive: PrimitiveKind::Int,
        }));
        let err = tree
            .try_create(NodeBuilder::new(NodeKind::ExprStmt).slot(ty))
            .unwrap_err();
        assert!(matches!(err, TreeError::RejectedChild { .. }));
        // The rejected child is still detached and reusable.
        assert!(tree.is_detached(ty));
    }

    #[test]
    fn create_rejects_missing_required_slot() {
        let mut tree = SyntaxTree::new();
        let err = tree
            .try_create(NodeBuilder::new(NodeKind::Binary { op: BinaryOp::Eq }))
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::MissingSlot {
                kind: "binary",
                index: 0
            }
        );
    }

    #[test]
    fn create_rejects_attached_child() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        let _first = not(&mut tree, x);
        let err = tree
            .try_create(NodeBuilder::new(NodeKind::Paren).slot(x))
            .unwrap_err();
        assert_eq!(err, TreeError::NotDetached { node: x });
    }

    #[test]
    fn replace_with_descendant_unwraps() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        let inner = not(&mut tree, x);
        let outer = not(&mut tree, inner);
        let stmt = expr_stmt(&mut tree, outer);
        block_of(&mut tree, vec![stmt]);

        assert!(tree.try_replace(outer, x));
        assert_eq!(tree.slot(stmt, 0), Some(x));
        assert_eq!(tree.parent(x), Some(stmt));
        assert!(!tree.is_alive(outer));
        assert!(!tree.is_alive(inner));
        assert_eq!(tree.successor_of(outer), Some(x));
    }

    #[test]
    fn replace_rejected_leaves_tree_untouched() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        let stmt = expr_stmt(&mut tree, x);
        block_of(&mut tree, vec![stmt]);
        let ty = tree.create(NodeBuilder::new(NodeKind::VarType));

        let revision = tree.revision();
        assert!(!tree.try_replace(x, ty));
        assert_eq!(tree.revision(), revision);
        assert_eq!(tree.slot(stmt, 0), Some(x));
        assert!(tree.is_detached(ty));
    }

    #[test]
    fn replace_rejects_aliasing() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        let y = name(&mut tree, "y");
        let s1 = expr_stmt(&mut tree, x);
        let s2 = expr_stmt(&mut tree, y);
        block_of(&mut tree, vec![s1, s2]);

        // `y` is attached elsewhere, not below `x`.
        assert!(!tree.try_replace(x, y));
        assert_eq!(tree.parent(y), Some(s2));
    }

    #[test]
    fn replace_root() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        let neg = not(&mut tree, x);
        tree.set_root(neg).unwrap();

        assert!(tree.try_replace(neg, x));
        assert_eq!(tree.root(), Some(x));
        assert_eq!(tree.parent(x), None);
        assert!(tree.is_attached(x));
    }

    #[test]
    fn remove_from_list_and_optional_slot() {
        let mut tree = SyntaxTree::new();
        let empty = tree.create(NodeBuilder::new(NodeKind::Empty));
        let value = tree.create(NodeBuilder::new(NodeKind::Literal {
            literal: LiteralKind::Int,
            text: Symbol::new("1"),
        }));
        let ret = tree.create(NodeBuilder::new(NodeKind::Return).slot(value));
        let block = block_of(&mut tree, vec![empty, ret]);

        assert!(tree.try_remove(empty));
        assert_eq!(tree.list(block), &[ret]);
        assert!(tree.try_remove(value));
        assert_eq!(tree.slot(ret, 0), None);
    }

    #[test]
    fn remove_required_slot_is_rejected() {
        let mut tree = SyntaxTree::new();
        let x = name(&mut tree, "x");
        let stmt = expr_stmt(&mut tree, x);
        block_of(&mut tree, vec![stmt]);

        assert!(!tree.try_remove(x));
        assert!(tree.is_attached(x));
        // The root cannot be removed either.
        let root = tree.root().unwrap();
        assert!(!tree.try_remove(root));
    }

    #[test]
    fn insert_before_and_after() {
        let mut tree = SyntaxTree::new();
        let a = tree.create(NodeBuilder::new(NodeKind::Break));
        let block = block_of(&mut tree, vec![a]);
        let before = tree.create(NodeBuilder::new(NodeKind::Empty));
        let after = tree.create(NodeBuilder::new(NodeKind::Continue));

        assert!(tree.try_insert_before(a, before));
        assert!(tree.try_insert_after(a, after));
        assert_eq!(tree.list(block), &[before, a, after]);

        let ty = tree.create(NodeBuilder::new(NodeKind::VarType));
        assert!(!tree.try_insert_after(a, ty));
    }

    #[test]
    fn splice_replaces_window() {
        let mut tree = SyntaxTree::new();
        let a = tree.create(NodeBuilder::new(NodeKind::Empty));
        let b = tree.create(NodeBuilder::new(NodeKind::Break));
        let c = tree.create(NodeBuilder::new(NodeKind::Continue));
        let block = block_of(&mut tree, vec![a, b, c]);
        let merged = tree.create(NodeBuilder::new(NodeKind::Return));

        assert!(tree.try_splice(a, 2, &[merged]));
        assert_eq!(tree.list(block), &[merged, c]);
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(b));
        assert_eq!(tree.successor_of(a), Some(merged));
    }

    #[test]
    fn splice_out_of_range_is_rejected() {
        let mut tree = SyntaxTree::new();
        let a = tree.create(NodeBuilder::new(NodeKind::Empty));
        let block = block_of(&mut tree, vec![a]);
        let merged = tree.create(NodeBuilder::new(NodeKind::Return));

        assert!(!tree.try_splice(a, 2, &[merged]));
        assert_eq!(tree.list(block), &[a]);
        assert!(tree.is_detached(merged));
    }

    #[test]
    fn clone_subtree_copies_annotations() {
        let mut tree = SyntaxTree::new();
        let x = tree.create(
            NodeBuilder::new(NodeKind::Name {
                name: Symbol::new("x"),
            })
            .ty(TypeDesc::boolean()),
        );
        let neg = not(&mut tree, x);
        let copy = tree.clone_subtree(neg);

        assert_ne!(copy, neg);
        let copied_x = tree.slot(copy, 0).unwrap();
        assert_ne!(copied_x, x);
        assert_eq!(tree.node(copied_x).ty(), Some(&TypeDesc::boolean()));
        assert_eq!(tree.parent(copied_x), Some(copy));
    }

    #[test]
    fn cloned_tree_gets_fresh_identity() {
        let tree = SyntaxTree::new();
        let copy = tree.clone();
        assert_ne!(tree.id(), copy.id());
    }
}
