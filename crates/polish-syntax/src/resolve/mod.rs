//! Static type resolution.
//!
//! Resolution never fails with an error: every query answers with a
//! three-valued [`Resolution`], and callers treat anything but `Resolved` as
//! "no match".

mod classes;
mod scope;

pub use classes::ClassTable;
pub use scope::ScopeResolver;

use crate::Symbol;
use crate::kind::NodeKind;
use crate::refs::NodeRef;
use crate::tree::SyntaxTree;
use crate::types::{ClassInfo, TypeDesc};

/// Outcome of a resolution query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    /// The answer is known to be "does not exist".
    KnownAbsent,
    /// Not enough information to decide.
    Unknown,
}

impl<T> Resolution<T> {
    pub fn resolved(self) -> Option<T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Resolution<&T> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(value),
            Resolution::KnownAbsent => Resolution::KnownAbsent,
            Resolution::Unknown => Resolution::Unknown,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::KnownAbsent => Resolution::KnownAbsent,
            Resolution::Unknown => Resolution::Unknown,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Resolution<U>) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => f(value),
            Resolution::KnownAbsent => Resolution::KnownAbsent,
            Resolution::Unknown => Resolution::Unknown,
        }
    }
}

impl Resolution<bool> {
    /// `true` only when resolved to `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Resolution::Resolved(true))
    }
}

impl<T> From<Option<T>> for Resolution<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Resolution::Resolved(value),
            None => Resolution::Unknown,
        }
    }
}

/// Resolution capability for one compilation unit.
pub trait Resolver {
    /// Static type of an expression, or the declared type of a declaration.
    fn type_of(&self, tree: &SyntaxTree, node: NodeRef) -> Resolution<TypeDesc>;

    /// Class table entry by qualified name.
    fn lookup_class(&self, name: Symbol) -> Option<&ClassInfo>;

    /// Qualified name a simple type name denotes at `node`.
    fn visible_type(&self, tree: &SyntaxTree, node: NodeRef, simple: Symbol) -> Resolution<Symbol>;

    /// Whether `class` is `ancestor` or inherits from it.
    fn is_subtype(&self, class: Symbol, ancestor: Symbol) -> Resolution<bool> {
        let mut pending = vec![class];
        let mut seen = Vec::new();
        let mut complete = true;
        while let Some(current) = pending.pop() {
            if current == ancestor {
                return Resolution::Resolved(true);
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            match self.lookup_class(current) {
                Some(info) => pending.extend(info.supertypes.iter().copied()),
                None => complete = false,
            }
        }
        if complete {
            Resolution::Resolved(false)
        } else {
            Resolution::Unknown
        }
    }
}

/// A resolver that knows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unresolved;

impl Resolver for Unresolved {
    fn type_of(&self, tree: &SyntaxTree, node: NodeRef) -> Resolution<TypeDesc> {
        tree.node(node).ty().cloned().into()
    }

    fn lookup_class(&self, _name: Symbol) -> Option<&ClassInfo> {
        None
    }

    fn visible_type(&self, _tree: &SyntaxTree, _node: NodeRef, _simple: Symbol) -> Resolution<Symbol> {
        Resolution::Unknown
    }
}

/// A node paired with the resolver of its compilation unit.
///
/// Handles are cheap copies; [`ResolutionHandle::scoped`] re-targets one at a
/// nested node, which is how sub-expressions are passed to helpers.
#[derive(Clone, Copy)]
pub struct ResolutionHandle<'a> {
    tree: &'a SyntaxTree,
    resolver: &'a dyn Resolver,
    node: NodeRef,
}

impl<'a> ResolutionHandle<'a> {
    pub fn new(tree: &'a SyntaxTree, resolver: &'a dyn Resolver, node: NodeRef) -> Self {
        Self {
            tree,
            resolver,
            node,
        }
    }

    pub fn node(&self) -> NodeRef {
        self.node
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn resolver(&self) -> &'a dyn Resolver {
        self.resolver
    }

    pub fn kind(&self) -> &'a NodeKind {
        self.tree.kind(self.node)
    }

    /// A handle for another node of the same tree.
    pub fn scoped(&self, node: NodeRef) -> Self {
        Self { node, ..*self }
    }

    /// A handle for the child in fixed slot `index`.
    pub fn slot(&self, index: usize) -> Option<Self> {
        self.tree.slot(self.node, index).map(|n| self.scoped(n))
    }

    /// Handles for the list children.
    pub fn list(&self) -> impl Iterator<Item = ResolutionHandle<'a>> + 'a {
        let this = *self;
        self.tree.list(self.node).iter().map(move |&n| this.scoped(n))
    }

    pub fn ty(&self) -> Resolution<TypeDesc> {
        self.resolver.type_of(self.tree, self.node)
    }

    pub fn visible_type(&self, simple: Symbol) -> Resolution<Symbol> {
        self.resolver.visible_type(self.tree, self.node, simple)
    }

    /// Whether the node's static type is a class inheriting from `ancestor`.
    pub fn is_subtype_of(&self, ancestor: Symbol) -> Resolution<bool> {
        self.ty().and_then(|ty| match ty.class_name() {
            Some(class) => self.resolver.is_subtype(class, ancestor),
            None => Resolution::Resolved(false),
        })
    }
}

impl std::fmt::Debug for ResolutionHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionHandle")
            .field("node", &self.node)
            .field("kind", self.kind())
            .finish()
    }
}
