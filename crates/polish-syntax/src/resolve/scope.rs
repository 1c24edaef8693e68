//! Scope-walking resolver built from front-end annotations and a class table.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::Symbol;
use crate::kind::{BinaryOp, LiteralKind, NodeKind, PrimitiveKind, UnaryOp};
use crate::refs::{NodeRef, Position};
use crate::resolve::{ClassTable, Resolution, Resolver};
use crate::tree::SyntaxTree;
use crate::types::{ClassInfo, TypeDesc};

/// Memoized answers, valid for one (tree, revision) pair.
#[derive(Default)]
struct TypeCache {
    tree_id: u64,
    revision: u64,
    types: HashMap<NodeRef, Resolution<TypeDesc>>,
}

/// Default [`Resolver`] implementation.
///
/// Type annotations on nodes win; everything else is derived from the
/// enclosing scopes, the unit's imports and the class table.
pub struct ScopeResolver {
    classes: ClassTable,
    cache: RefCell<TypeCache>,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new(ClassTable::builtin())
    }
}

impl ScopeResolver {
    pub fn new(classes: ClassTable) -> Self {
        Self {
            classes,
            cache: RefCell::new(TypeCache::default()),
        }
    }

    /// Built-in classes plus unit-supplied entries.
    pub fn with_classes(extra: impl IntoIterator<Item = ClassInfo>) -> Self {
        let mut classes = ClassTable::builtin();
        classes.extend(extra);
        Self::new(classes)
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    fn cached(&self, tree: &SyntaxTree, node: NodeRef) -> Option<Resolution<TypeDesc>> {
        let mut cache = self.cache.borrow_mut();
        if cache.tree_id != tree.id() || cache.revision != tree.revision() {
            cache.tree_id = tree.id();
            cache.revision = tree.revision();
            cache.types.clear();
            return None;
        }
        cache.types.get(&node).cloned()
    }

    fn compute(&self, tree: &SyntaxTree, node: NodeRef) -> Resolution<TypeDesc> {
        if let Some(ty) = tree.node(node).ty() {
            return Resolution::Resolved(ty.clone());
        }
        match *tree.kind(node) {
            NodeKind::Literal { literal, .. } => Resolution::Resolved(literal_type(literal)),
            NodeKind::Name { name } => match lookup_variable(tree, node, name) {
                Some(decl) => self.type_of(tree, decl),
                None => Resolution::Unknown,
            },
            NodeKind::TypeName { name } => self
                .qualify(tree, node, name)
                .map(TypeDesc::class),
            NodeKind::This => enclosing_class(tree, node)
                .map(|class| TypeDesc::class(self.declared_class_name(tree, class)))
                .into(),
            NodeKind::Paren | NodeKind::Assign { .. } => self.slot_type(tree, node, 0),
            NodeKind::Unary { op } => self.unary_type(tree, node, op),
            NodeKind::Binary { op } => self.binary_type(tree, node, op),
            NodeKind::Conditional => {
                let then_ty = self.slot_type(tree, node, 1);
                let else_ty = self.slot_type(tree, node, 2);
                match (then_ty, else_ty) {
                    (Resolution::Resolved(a), Resolution::Resolved(b)) if a == b => {
                        Resolution::Resolved(a)
                    }
                    (Resolution::Resolved(a), Resolution::Resolved(b)) => {
                        numeric_promotion(&a, &b).map(TypeDesc::primitive).into()
                    }
                    _ => Resolution::Unknown,
                }
            }
            NodeKind::InstanceOf => Resolution::Resolved(TypeDesc::boolean()),
            NodeKind::Cast | NodeKind::New => self.slot_type(tree, node, 0),
            NodeKind::MethodCall { name } => self.call_type(tree, node, name),
            NodeKind::FieldAccess { name } => {
                let is_array = self
                    .slot_type(tree, node, 0)
                    .resolved()
                    .is_some_and(|ty| matches!(ty, TypeDesc::Array { .. }));
                if is_array && name == "length" {
                    Resolution::Resolved(TypeDesc::int())
                } else {
                    Resolution::Unknown
                }
            }
            NodeKind::ArrayAccess => self.slot_type(tree, node, 0).and_then(|ty| match ty {
                TypeDesc::Array { element } => Resolution::Resolved(*element),
                _ => Resolution::Unknown,
            }),
            NodeKind::LocalVar { .. } | NodeKind::Param { .. } | NodeKind::ForEach { .. } => {
                self.slot_type(tree, node, 0)
            }
            NodeKind::FieldDecl { .. } => self.slot_type(tree, node, 1),
            NodeKind::PrimitiveType { primitive } => {
                Resolution::Resolved(TypeDesc::primitive(primitive))
            }
            NodeKind::ClassType { name, .. } => {
                let args: Option<Vec<TypeDesc>> = tree
                    .list(node)
                    .iter()
                    .map(|&arg| self.type_of(tree, arg).resolved())
                    .collect();
                let args = args.unwrap_or_default();
                self.qualify(tree, node, name)
                    .map(|qualified| TypeDesc::generic(qualified, args))
            }
            NodeKind::ArrayType => self.slot_type(tree, node, 0).map(TypeDesc::array),
            NodeKind::VarType => match tree.parent(node) {
                Some(parent) if matches!(tree.kind(parent), NodeKind::LocalVar { .. }) => {
                    self.slot_type(tree, parent, 1)
                }
                _ => Resolution::Unknown,
            },
            _ => Resolution::Unknown,
        }
    }

    fn slot_type(&self, tree: &SyntaxTree, node: NodeRef, index: usize) -> Resolution<TypeDesc> {
        match tree.slot(node, index) {
            Some(child) => self.type_of(tree, child),
            None => Resolution::Unknown,
        }
    }

    /// Qualified name for a (possibly already qualified) type name.
    fn qualify(&self, tree: &SyntaxTree, node: NodeRef, name: Symbol) -> Resolution<Symbol> {
        if name.is_qualified() {
            return Resolution::Resolved(name);
        }
        match self.visible_type(tree, node, name) {
            Resolution::Resolved(q) => Resolution::Resolved(q),
            _ => Resolution::Unknown,
        }
    }

    fn declared_class_name(&self, tree: &SyntaxTree, class: NodeRef) -> Symbol {
        let NodeKind::ClassDecl { name, .. } = *tree.kind(class) else {
            return Symbol::new("java.lang.Object");
        };
        match unit_of(tree, class).and_then(|unit| match tree.kind(unit) {
            NodeKind::CompilationUnit { package } => *package,
            _ => None,
        }) {
            Some(package) => Symbol::from(format!("{package}.{name}")),
            None => name,
        }
    }

    fn unary_type(&self, tree: &SyntaxTree, node: NodeRef, op: UnaryOp) -> Resolution<TypeDesc> {
        match op {
            UnaryOp::Not => Resolution::Resolved(TypeDesc::boolean()),
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                self.slot_type(tree, node, 0)
            }
            UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => self
                .slot_type(tree, node, 0)
                .and_then(|ty| Resolution::from(unary_promotion(&ty).map(TypeDesc::primitive))),
        }
    }

    fn binary_type(&self, tree: &SyntaxTree, node: NodeRef, op: BinaryOp) -> Resolution<TypeDesc> {
        if op.is_logical() || op.is_equality() || op.is_relational() {
            return Resolution::Resolved(TypeDesc::boolean());
        }
        let lhs = self.slot_type(tree, node, 0);
        let rhs = self.slot_type(tree, node, 1);
        if op == BinaryOp::Add
            && (lhs.as_ref().resolved().is_some_and(TypeDesc::is_string)
                || rhs.as_ref().resolved().is_some_and(TypeDesc::is_string))
        {
            return Resolution::Resolved(TypeDesc::string());
        }
        let (Resolution::Resolved(lhs), Resolution::Resolved(rhs)) = (lhs, rhs) else {
            return Resolution::Unknown;
        };
        match op {
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
                unary_promotion(&lhs).map(TypeDesc::primitive).into()
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
                if lhs.unboxed() == Some(PrimitiveKind::Boolean)
                    && rhs.unboxed() == Some(PrimitiveKind::Boolean) =>
            {
                Resolution::Resolved(TypeDesc::boolean())
            }
            _ => numeric_promotion(&lhs, &rhs).map(TypeDesc::primitive).into(),
        }
    }

    fn call_type(&self, tree: &SyntaxTree, node: NodeRef, name: Symbol) -> Resolution<TypeDesc> {
        match tree.slot(node, 0) {
            Some(receiver) => {
                let Resolution::Resolved(ty) = self.type_of(tree, receiver) else {
                    return Resolution::Unknown;
                };
                let Some(class) = ty.class_name() else {
                    return Resolution::Unknown;
                };
                self.classes
                    .find_method(class, name)
                    .map(|m| m.returns.clone())
                    .into()
            }
            None => {
                // Unqualified call: a method declared in an enclosing class.
                let Some(class) = enclosing_class(tree, node) else {
                    return Resolution::Unknown;
                };
                let mut candidates = tree.list(class).iter().filter(|&&member| {
                    matches!(tree.kind(member), NodeKind::MethodDecl { name: n } if *n == name)
                });
                match (candidates.next(), candidates.next()) {
                    (Some(&method), None) => self.slot_type(tree, method, 1),
                    _ => Resolution::Unknown,
                }
            }
        }
    }
}

impl Resolver for ScopeResolver {
    fn type_of(&self, tree: &SyntaxTree, node: NodeRef) -> Resolution<TypeDesc> {
        if let Some(hit) = self.cached(tree, node) {
            return hit;
        }
        let ty = self.compute(tree, node);
        self.cache.borrow_mut().types.insert(node, ty.clone());
        ty
    }

    fn lookup_class(&self, name: Symbol) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    fn visible_type(&self, tree: &SyntaxTree, node: NodeRef, simple: Symbol) -> Resolution<Symbol> {
        let Some(unit) = unit_of(tree, node) else {
            return Resolution::Unknown;
        };
        let NodeKind::CompilationUnit { package } = *tree.kind(unit) else {
            return Resolution::Unknown;
        };

        let mut has_wildcard = false;
        if let Some(imports) = tree.slot(unit, 0) {
            for &import in tree.list(imports) {
                let NodeKind::Import {
                    path,
                    is_static,
                    wildcard,
                } = *tree.kind(import)
                else {
                    continue;
                };
                if is_static {
                    continue;
                }
                if wildcard {
                    has_wildcard |= path != "java.lang";
                } else if path.simple_name() == simple {
                    return Resolution::Resolved(path);
                }
            }
        }

        let declared = tree.descendants(unit).into_iter().any(|n| {
            matches!(tree.kind(n), NodeKind::ClassDecl { name, .. } if *name == simple)
        });
        if declared {
            return Resolution::Resolved(match package {
                Some(package) => Symbol::from(format!("{package}.{simple}")),
                None => simple,
            });
        }

        // `java.lang` is itself imported on demand, so any wildcard import
        // may shadow it ambiguously.
        if has_wildcard {
            return Resolution::Unknown;
        }
        let implicit = Symbol::from(format!("java.lang.{simple}"));
        if self.classes.contains(implicit) {
            Resolution::Resolved(implicit)
        } else {
            Resolution::KnownAbsent
        }
    }
}

// ============================================================================
// Scope helpers
// ============================================================================

fn literal_type(literal: LiteralKind) -> TypeDesc {
    match literal {
        LiteralKind::Int => TypeDesc::int(),
        LiteralKind::Long => TypeDesc::primitive(PrimitiveKind::Long),
        LiteralKind::Float => TypeDesc::primitive(PrimitiveKind::Float),
        LiteralKind::Double => TypeDesc::primitive(PrimitiveKind::Double),
        LiteralKind::Char => TypeDesc::primitive(PrimitiveKind::Char),
        LiteralKind::String => TypeDesc::string(),
        LiteralKind::Boolean => TypeDesc::boolean(),
        LiteralKind::Null => TypeDesc::Null,
    }
}

fn unary_promotion(ty: &TypeDesc) -> Option<PrimitiveKind> {
    let primitive = ty.unboxed().filter(|p| p.is_numeric())?;
    Some(match primitive {
        PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => PrimitiveKind::Int,
        other => other,
    })
}

fn numeric_promotion(lhs: &TypeDesc, rhs: &TypeDesc) -> Option<PrimitiveKind> {
    let a = unary_promotion(lhs)?;
    let b = unary_promotion(rhs)?;
    let rank = |p: PrimitiveKind| match p {
        PrimitiveKind::Double => 3,
        PrimitiveKind::Float => 2,
        PrimitiveKind::Long => 1,
        _ => 0,
    };
    Some(if rank(a) >= rank(b) { a } else { b })
}

/// The compilation unit containing `node`, or the root when it is one.
fn unit_of(tree: &SyntaxTree, node: NodeRef) -> Option<NodeRef> {
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .find(|&n| matches!(tree.kind(n), NodeKind::CompilationUnit { .. }))
}

fn enclosing_class(tree: &SyntaxTree, node: NodeRef) -> Option<NodeRef> {
    tree.ancestors(node)
        .find(|&n| matches!(tree.kind(n), NodeKind::ClassDecl { .. }))
}

/// Find the declaration a simple name refers to at `node`.
///
/// Walks outwards: preceding local variables of enclosing blocks, for-each
/// variables, lambda and method parameters, then fields of enclosing classes.
pub(crate) fn lookup_variable(tree: &SyntaxTree, node: NodeRef, name: Symbol) -> Option<NodeRef> {
    let mut child = node;
    for scope in tree.ancestors(node) {
        match tree.kind(scope) {
            NodeKind::Block => {
                if let Some(Position::List(index)) = tree.position(child) {
                    let preceding = &tree.list(scope)[..index];
                    let found = preceding.iter().rev().find(|&&stmt| {
                        matches!(tree.kind(stmt), NodeKind::LocalVar { name: n } if *n == name)
                    });
                    if let Some(&decl) = found {
                        return Some(decl);
                    }
                }
            }
            NodeKind::ForEach { name: var } if *var == name => {
                if tree.slot(scope, 2) == Some(child) {
                    return Some(scope);
                }
            }
            NodeKind::Lambda { .. } | NodeKind::MethodDecl { .. } | NodeKind::ConstructorDecl { .. } => {
                let param = tree.list(scope).iter().find(|&&p| {
                    matches!(tree.kind(p), NodeKind::Param { name: n } if *n == name)
                });
                if let Some(&param) = param {
                    return Some(param);
                }
            }
            NodeKind::ClassDecl { .. } => {
                let field = tree.list(scope).iter().find(|&&m| {
                    matches!(tree.kind(m), NodeKind::FieldDecl { name: n } if *n == name)
                });
                if let Some(&field) = field {
                    return Some(field);
                }
            }
            _ => {}
        }
        child = scope;
    }
    None
}
