//! Mutable syntax tree model for the polish rewriting engine.
//!
//! This crate provides:
//!
//! - An arena-allocated tree of typed nodes with parent back-links
//!   ([`SyntaxTree`], [`NodeKind`]) and atomic mutation primitives
//! - Static type resolution with three-valued answers ([`resolve`])
//! - A JSON interchange format for source units ([`interchange`])
//! - A source printer ([`printer`]) and structural validation ([`validation`])

pub mod interchange;
pub mod kind;
pub mod location;
pub mod printer;
pub mod refs;
pub mod resolve;
pub mod symbol;
pub mod tree;
pub mod types;
pub mod validation;
pub mod walk;

pub use interchange::{LoadError, SourceUnit};
pub use kind::{
    AssignOp, BinaryOp, ClassKind, LiteralKind, ModifierKeyword, NodeCategory, NodeKind,
    PrimitiveKind, SlotClass, UnaryOp,
};
pub use location::Span;
pub use refs::{NodeRef, Position};
pub use resolve::{ClassTable, Resolution, ResolutionHandle, Resolver, ScopeResolver, Unresolved};
pub use symbol::Symbol;
pub use tree::{NodeBuilder, NodeData, SyntaxTree, TreeError};
pub use types::{ClassInfo, LanguageLevel, MethodInfo, TypeDesc};
