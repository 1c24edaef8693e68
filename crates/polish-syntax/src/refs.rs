//! Entity references for the arena syntax tree.
//!
//! A ref is a thin `u32` wrapper providing type-safe indexing into the
//! `PrimaryMap` storage of a `SyntaxTree`.

use cranelift_entity::entity_impl;

/// Reference to a node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u32);
entity_impl!(NodeRef, "n");

/// Where a node sits inside its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    /// Fixed slot at the given index of the parent's layout.
    Slot(usize),
    /// Element at the given index of the parent's variadic list.
    List(usize),
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Slot(i) => write!(f, "slot#{i}"),
            Position::List(i) => write!(f, "list#{i}"),
        }
    }
}
