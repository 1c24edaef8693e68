//! Recursive traversal utilities for syntax trees.

use std::ops::ControlFlow;

use crate::kind::NodeKind;
use crate::refs::NodeRef;
use crate::tree::SyntaxTree;

/// What the walk does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Continue walking and descend into children.
    Advance,
    /// Skip the children of the current node.
    Skip,
}

/// Walk a node and its descendants in pre-order.
pub fn walk_node<B>(
    tree: &SyntaxTree,
    node: NodeRef,
    f: &mut dyn FnMut(NodeRef) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    match f(node) {
        ControlFlow::Break(b) => return ControlFlow::Break(b),
        ControlFlow::Continue(WalkAction::Skip) => return ControlFlow::Continue(()),
        ControlFlow::Continue(WalkAction::Advance) => {}
    }
    for child in tree.children(node) {
        walk_node(tree, child, f)?;
    }
    ControlFlow::Continue(())
}

/// Walk the whole attached tree; a tree without root visits nothing.
pub fn walk_tree<B>(
    tree: &SyntaxTree,
    f: &mut dyn FnMut(NodeRef) -> ControlFlow<B, WalkAction>,
) -> ControlFlow<B, ()> {
    match tree.root() {
        Some(root) => walk_node(tree, root, f),
        None => ControlFlow::Continue(()),
    }
}

/// Whether any node below (and including) `node` satisfies `pred`.
pub fn any_node(tree: &SyntaxTree, node: NodeRef, pred: impl Fn(&NodeKind) -> bool) -> bool {
    walk_node(tree, node, &mut |n| {
        if pred(tree.kind(n)) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(WalkAction::Advance)
        }
    })
    .is_break()
}
