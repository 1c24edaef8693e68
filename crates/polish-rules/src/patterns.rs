//! Matching and building helpers shared by the rules.
//!
//! Matchers are plain functions over the tree (or the rewrite context when
//! they need types). They answer `None`/`false` for anything they cannot
//! decide, so a rule built from them treats "unknown" as "no match".

use polish_engine::RewriteContext;
use polish_syntax::walk::any_node;
use polish_syntax::{
    BinaryOp, LiteralKind, NodeBuilder, NodeKind, NodeRef, Position, PrimitiveKind, Symbol,
    SyntaxTree, TypeDesc, UnaryOp,
};
use smallvec::SmallVec;

// ============================================================================
// Shape matchers
// ============================================================================

/// Skip any number of enclosing parentheses.
pub fn strip_parens(tree: &SyntaxTree, mut node: NodeRef) -> NodeRef {
    while let NodeKind::Paren = tree.kind(node) {
        match tree.slot(node, 0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

pub fn boolean_literal(tree: &SyntaxTree, node: NodeRef) -> Option<bool> {
    match *tree.kind(node) {
        NodeKind::Literal {
            literal: LiteralKind::Boolean,
            text,
        } => Some(text == "true"),
        _ => None,
    }
}

pub fn is_null_literal(tree: &SyntaxTree, node: NodeRef) -> bool {
    matches!(
        tree.kind(node),
        NodeKind::Literal {
            literal: LiteralKind::Null,
            ..
        }
    )
}

pub fn is_literal(tree: &SyntaxTree, node: NodeRef) -> bool {
    matches!(tree.kind(node), NodeKind::Literal { .. })
}

/// Value of an `int` literal.
pub fn int_literal(tree: &SyntaxTree, node: NodeRef) -> Option<i64> {
    match *tree.kind(node) {
        NodeKind::Literal {
            literal: LiteralKind::Int,
            text,
        } => text.with_str(|s| s.replace('_', "").parse().ok()),
        _ => None,
    }
}

/// Content of a string literal.
pub fn string_literal(tree: &SyntaxTree, node: NodeRef) -> Option<Symbol> {
    match *tree.kind(node) {
        NodeKind::Literal {
            literal: LiteralKind::String,
            text,
        } => Some(text),
        _ => None,
    }
}

/// The pieces of a method call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub name: Symbol,
    pub receiver: Option<NodeRef>,
    pub args: SmallVec<[NodeRef; 4]>,
}

impl Call {
    pub fn is(&self, name: &str, arity: usize) -> bool {
        self.name == name && self.args.len() == arity
    }
}

pub fn call(tree: &SyntaxTree, node: NodeRef) -> Option<Call> {
    let NodeKind::MethodCall { name } = *tree.kind(node) else {
        return None;
    };
    Some(Call {
        name,
        receiver: tree.slot(node, 0),
        args: SmallVec::from_slice(tree.list(node)),
    })
}

/// The receiver of `receiver.name()`.
pub fn nullary_call(tree: &SyntaxTree, node: NodeRef, name: &str) -> Option<NodeRef> {
    let call = call(tree, node)?;
    if call.is(name, 0) { call.receiver } else { None }
}

/// Whether evaluating `node` cannot have observable effects.
///
/// Conservative: calls, object creation, assignments and increments all
/// count as effects.
pub fn is_side_effect_free(tree: &SyntaxTree, node: NodeRef) -> bool {
    !any_node(tree, node, |kind| match kind {
        NodeKind::MethodCall { .. } | NodeKind::New | NodeKind::Assign { .. } => true,
        NodeKind::Unary { op } => op.has_side_effect(),
        _ => false,
    })
}

/// Whether the variable `name` is referenced anywhere below `node`.
pub fn mentions(tree: &SyntaxTree, node: NodeRef, name: Symbol) -> bool {
    any_node(tree, node, |kind| matches!(kind, NodeKind::Name { name: n } if *n == name))
}

/// The single statement a branch consists of: `s` or `{ s }`.
pub fn single_statement(tree: &SyntaxTree, stmt: NodeRef) -> Option<NodeRef> {
    match tree.kind(stmt) {
        NodeKind::Block => match tree.list(stmt) {
            [only] => Some(*only),
            _ => None,
        },
        _ => Some(stmt),
    }
}

/// The literal returned by `return true;` / `return false;`.
pub fn returned_boolean(tree: &SyntaxTree, stmt: NodeRef) -> Option<bool> {
    let stmt = single_statement(tree, stmt)?;
    if !matches!(tree.kind(stmt), NodeKind::Return) {
        return None;
    }
    let value = tree.slot(stmt, 0)?;
    boolean_literal(tree, strip_parens(tree, value))
}

/// Match a size test such as `x.size() == 0` or `0 < x.size()`.
///
/// Returns the receiver of the nullary `method` call and whether the test
/// asks for emptiness.
pub fn emptiness_test(tree: &SyntaxTree, node: NodeRef, method: &str) -> Option<(NodeRef, bool)> {
    let NodeKind::Binary { op } = *tree.kind(node) else {
        return None;
    };
    let lhs = strip_parens(tree, tree.slot(node, 0)?);
    let rhs = strip_parens(tree, tree.slot(node, 1)?);
    let (measured, op, bound) = match (int_literal(tree, lhs), int_literal(tree, rhs)) {
        (None, Some(bound)) => (lhs, op, bound),
        (Some(bound), None) => (rhs, op.mirrored()?, bound),
        _ => return None,
    };
    let receiver = nullary_call(tree, measured, method)?;
    let empty = match (op, bound) {
        (BinaryOp::Eq, 0) | (BinaryOp::Lt, 1) | (BinaryOp::Le, 0) => true,
        (BinaryOp::Ne, 0) | (BinaryOp::Gt, 0) | (BinaryOp::Ge, 1) => false,
        _ => return None,
    };
    Some((receiver, empty))
}

// ============================================================================
// Type queries
// ============================================================================

pub fn static_type(cx: &RewriteContext<'_>, node: NodeRef) -> Option<TypeDesc> {
    cx.handle(node).ty().resolved()
}

pub fn primitive_of(cx: &RewriteContext<'_>, node: NodeRef) -> Option<PrimitiveKind> {
    static_type(cx, node).and_then(|ty| ty.as_primitive())
}

pub fn is_string(cx: &RewriteContext<'_>, node: NodeRef) -> bool {
    static_type(cx, node).is_some_and(|ty| ty.is_string())
}

/// Whether the static type of `node` is known to inherit from `ancestor`.
pub fn inherits(cx: &RewriteContext<'_>, node: NodeRef, ancestor: &'static str) -> bool {
    cx.handle(node).is_subtype_of(Symbol::new(ancestor)).is_true()
}

/// The primitive a boxed class name denotes, resolving simple names at `at`.
pub fn boxed_class(cx: &RewriteContext<'_>, at: NodeRef, name: Symbol) -> Option<PrimitiveKind> {
    let qualified = if name.is_qualified() {
        name
    } else {
        cx.handle(at).visible_type(name).resolved()?
    };
    qualified
        .with_str(PrimitiveKind::from_boxed_class)
        .filter(|_| qualified.with_str(|s| s.starts_with("java.lang.")))
}

/// Whether a type name used at `at` denotes `qualified`.
pub fn names_class(cx: &RewriteContext<'_>, at: NodeRef, name: Symbol, qualified: &str) -> bool {
    if name.is_qualified() {
        return name == qualified;
    }
    cx.handle(at)
        .visible_type(name)
        .resolved()
        .is_some_and(|resolved| resolved == qualified)
}

// ============================================================================
// Precedence
// ============================================================================

/// How tightly an expression binds; higher binds tighter.
fn binding(kind: &NodeKind) -> u8 {
    match kind {
        NodeKind::Lambda { .. } | NodeKind::Assign { .. } => 0,
        NodeKind::Conditional => 1,
        NodeKind::Binary { op } => op.precedence() + 1,
        NodeKind::InstanceOf => BinaryOp::Lt.precedence() + 1,
        NodeKind::Unary { op } if !op.is_postfix() => 12,
        NodeKind::Cast => 12,
        _ => 13,
    }
}

/// Whether an expression of `kind` needs parentheses at the position `at`
/// currently occupies.
pub fn needs_parens(tree: &SyntaxTree, at: NodeRef, kind: &NodeKind) -> bool {
    let (Some(parent), Some(position)) = (tree.parent(at), tree.position(at)) else {
        return false;
    };
    let child = binding(kind);
    match (tree.kind(parent), position) {
        (NodeKind::Binary { op }, Position::Slot(0)) => child < op.precedence() + 1,
        (NodeKind::Binary { op }, _) => child <= op.precedence() + 1,
        (NodeKind::InstanceOf, Position::Slot(0)) => child < binding(&NodeKind::InstanceOf),
        (NodeKind::Unary { .. }, _) | (NodeKind::Cast, Position::Slot(1)) => child < 12,
        (
            NodeKind::FieldAccess { .. }
            | NodeKind::MethodRef { .. }
            | NodeKind::ArrayAccess
            | NodeKind::MethodCall { .. },
            Position::Slot(0),
        ) => child < 13,
        (NodeKind::Conditional, Position::Slot(0)) => child <= 1,
        (NodeKind::Conditional, _) => child < 1,
        _ => false,
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn literal(literal: LiteralKind, text: impl Into<Symbol>) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Literal {
        literal,
        text: text.into(),
    })
}

/// Wrap a detached expression in parentheses if it binds looser than `level`.
fn parenthesized(cx: &mut RewriteContext<'_>, expr: NodeRef, level: u8) -> NodeRef {
    if binding(cx.kind(expr)) < level {
        let span = cx.span(expr);
        cx.create(NodeBuilder::new(NodeKind::Paren).slot(expr).span(span))
    } else {
        expr
    }
}

/// `!expr` for a detached `expr`.
pub fn not(cx: &mut RewriteContext<'_>, expr: NodeRef) -> NodeRef {
    let span = cx.span(expr);
    let operand = parenthesized(cx, expr, 12);
    cx.create(
        NodeBuilder::new(NodeKind::Unary { op: UnaryOp::Not })
            .slot(operand)
            .span(span),
    )
}

/// `lhs op rhs` for detached operands, parenthesizing them as needed.
pub fn binary(cx: &mut RewriteContext<'_>, op: BinaryOp, lhs: NodeRef, rhs: NodeRef) -> NodeRef {
    let span = cx.span(lhs).cover(cx.span(rhs));
    let level = op.precedence() + 1;
    let lhs = parenthesized(cx, lhs, level);
    let rhs = parenthesized(cx, rhs, level + 1);
    cx.create(
        NodeBuilder::new(NodeKind::Binary { op })
            .slot(lhs)
            .slot(rhs)
            .span(span),
    )
}

/// `cond ? then : otherwise` for detached operands.
pub fn conditional(
    cx: &mut RewriteContext<'_>,
    cond: NodeRef,
    then: NodeRef,
    otherwise: NodeRef,
) -> NodeRef {
    let span = cx.span(cond).cover(cx.span(otherwise));
    let cond = parenthesized(cx, cond, 2);
    cx.create(
        NodeBuilder::new(NodeKind::Conditional)
            .slot(cond)
            .slot(then)
            .slot(otherwise)
            .span(span),
    )
}

/// A detached copy of `receiver.name()`.
pub fn call_on_copy(cx: &mut RewriteContext<'_>, receiver: NodeRef, name: &'static str) -> NodeRef {
    let span = cx.span(receiver);
    let receiver = cx.clone_subtree(receiver);
    let receiver = parenthesized(cx, receiver, 13);
    cx.create(
        NodeBuilder::new(NodeKind::MethodCall {
            name: Symbol::new(name),
        })
        .slot(receiver)
        .span(span),
    )
}

/// Substitute `replacement` for the expression `at`, adding parentheses when
/// the surrounding operator binds tighter.
///
/// `replacement` may be detached or a descendant of `at`.
pub fn replace_expr(cx: &mut RewriteContext<'_>, at: NodeRef, replacement: NodeRef) -> bool {
    if !needs_parens(cx.tree(), at, cx.kind(replacement)) {
        return cx.replace(at, replacement);
    }
    let inner = if cx.tree().is_detached(replacement) {
        replacement
    } else {
        cx.clone_subtree(replacement)
    };
    let span = cx.span(at);
    let wrapped = cx.create(NodeBuilder::new(NodeKind::Paren).slot(inner).span(span));
    cx.replace(at, wrapped)
}
