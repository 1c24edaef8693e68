//! Structural validation for syntax trees.
//!
//! The mutation primitives keep trees well-formed on their own; this module
//! re-checks the invariants from scratch so tests and the driver's debug
//! assertions can confirm it:
//!
//! 1. **Links**: every reachable node is alive, appears exactly once, and its
//!    parent link names the node that holds it.
//! 2. **Layout**: every slot and list element is admitted by the parent's
//!    layout, required slots are filled and lists meet their minimum length.

use std::collections::HashSet;
use std::fmt;

use crate::refs::{NodeRef, Position};
use crate::tree::SyntaxTree;

// ============================================================================
// Error types
// ============================================================================

/// A single structural violation.
pub struct StructureError {
    pub node: NodeRef,
    /// Kind tag of `node`.
    pub kind: &'static str,
    pub message: String,
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.node, self.kind, self.message)
    }
}

impl fmt::Debug for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Result of validation.
pub struct ValidationResult {
    pub link_errors: Vec<StructureError>,
    pub layout_errors: Vec<StructureError>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.link_errors.is_empty() && self.layout_errors.is_empty()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "validation passed");
        }
        if !self.link_errors.is_empty() {
            writeln!(f, "{} link error(s) found:", self.link_errors.len())?;
            for err in &self.link_errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        if !self.layout_errors.is_empty() {
            writeln!(f, "{} layout error(s) found:", self.layout_errors.len())?;
            for err in &self.layout_errors {
                writeln!(f, "  - {}", err)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate the attached tree.
pub fn validate_tree(tree: &SyntaxTree) -> ValidationResult {
    let mut result = ValidationResult {
        link_errors: Vec::new(),
        layout_errors: Vec::new(),
    };
    let Some(root) = tree.root() else {
        return result;
    };
    if tree.parent(root).is_some() {
        result.link_errors.push(error(tree, root, "root has a parent"));
    }

    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            result
                .link_errors
                .push(error(tree, node, "reachable more than once"));
            continue;
        }
        if !tree.is_alive(node) {
            result.link_errors.push(error(tree, node, "dead node is reachable"));
        }
        check_layout(tree, node, &mut result.layout_errors);
        for child in tree.children(node) {
            if tree.parent(child) != Some(node) {
                result.link_errors.push(error(
                    tree,
                    child,
                    format!("parent link does not point at {node}"),
                ));
            }
            stack.push(child);
        }
    }
    result
}

fn check_layout(tree: &SyntaxTree, node: NodeRef, errors: &mut Vec<StructureError>) {
    let data = tree.node(node);
    let layout = data.kind().layout();

    if data.slots().len() != layout.slots.len() {
        errors.push(error(
            tree,
            node,
            format!(
                "expected {} slot(s), found {}",
                layout.slots.len(),
                data.slots().len()
            ),
        ));
    }
    for (index, (slot, spec)) in data.slots().iter().zip(layout.slots).enumerate() {
        match slot {
            Some(child) if !spec.class.accepts(tree.kind(*child)) => errors.push(error(
                tree,
                node,
                format!(
                    "{} holds a {} node",
                    Position::Slot(index),
                    tree.kind(*child).tag()
                ),
            )),
            None if !spec.optional => errors.push(error(
                tree,
                node,
                format!("required slot #{index} is empty"),
            )),
            _ => {}
        }
    }

    match layout.list {
        None if !data.list().is_empty() => {
            errors.push(error(tree, node, "node kind has no list"));
        }
        None => {}
        Some(spec) => {
            if data.list().len() < spec.min {
                errors.push(error(
                    tree,
                    node,
                    format!("list below minimum length {}", spec.min),
                ));
            }
            for (index, &child) in data.list().iter().enumerate() {
                if !spec.class.accepts(tree.kind(child)) {
                    errors.push(error(
                        tree,
                        node,
                        format!(
                            "{} holds a {} node",
                            Position::List(index),
                            tree.kind(child).tag()
                        ),
                    ));
                }
            }
        }
    }
}

fn error(tree: &SyntaxTree, node: NodeRef, message: impl Into<String>) -> StructureError {
    StructureError {
        node,
        kind: tree.kind(node).tag(),
        message: message.into(),
    }
}
