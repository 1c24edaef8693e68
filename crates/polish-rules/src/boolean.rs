//! Boolean simplifications.
//!
//! - `!(!x)` -> `x`
//! - `b == true` -> `b`, `b != true` -> `!b`, ...
//! - `!(a == b)` -> `a != b`

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{BinaryOp, NodeKind, NodeRef, PrimitiveKind, SyntaxTree, UnaryOp};

use crate::patterns::{binary, boolean_literal, not, primitive_of, replace_expr, strip_parens};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("DoubleNegation")
                .external("Sonar", "S2761")
                .tag("Boolean")
                .repeat_until_no_match()
                .before("NegatedComparison")
                .describe("Remove doubled logical negations"),
            DoubleNegation,
        )
        .rule(
            RuleDescriptor::new("BooleanLiteralComparison")
                .alias("SimplifyBooleanExpression")
                .external("PMD", "SimplifyBooleanExpressions")
                .external("Sonar", "S1125")
                .tag("Boolean")
                .describe("Drop comparisons of a boolean against a boolean literal"),
            BooleanLiteralComparison,
        )
        .rule(
            RuleDescriptor::new("NegatedComparison")
                .external("Sonar", "S1940")
                .tag("Boolean")
                .after("DoubleNegation")
                .describe("Fold a negation into the comparison it negates"),
            NegatedComparison,
        )
}

fn negated_operand(tree: &SyntaxTree, node: NodeRef) -> Option<NodeRef> {
    match *tree.kind(node) {
        NodeKind::Unary { op: UnaryOp::Not } => tree.slot(node, 0).map(|n| strip_parens(tree, n)),
        _ => None,
    }
}

/// `!(!x)` -> `x`
struct DoubleNegation;

impl Mutator for DoubleNegation {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let Some(inner) = negated_operand(tree, node) else {
            return false;
        };
        let Some(operand) = negated_operand(tree, inner) else {
            return false;
        };
        replace_expr(cx, node, operand)
    }
}

/// `b == true` -> `b`, `b == false` -> `!b` for a primitive `b`.
///
/// Boxed operands are left alone: comparing against a literal unboxes and
/// throws on `null`, which dropping the comparison would hide.
struct BooleanLiteralComparison;

impl Mutator for BooleanLiteralComparison {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let NodeKind::Binary { op } = *tree.kind(node) else {
            return false;
        };
        if !op.is_equality() {
            return false;
        }
        let (Some(lhs), Some(rhs)) = (tree.slot(node, 0), tree.slot(node, 1)) else {
            return false;
        };
        let (operand, literal) = match (
            boolean_literal(tree, strip_parens(tree, lhs)),
            boolean_literal(tree, strip_parens(tree, rhs)),
        ) {
            (_, Some(literal)) => (lhs, literal),
            (Some(literal), None) => (rhs, literal),
            (None, None) => return false,
        };
        if primitive_of(cx, operand) != Some(PrimitiveKind::Boolean) {
            return false;
        }

        let keeps_sense = (op == BinaryOp::Eq) == literal;
        if keeps_sense {
            return replace_expr(cx, node, operand);
        }
        let copy = cx.clone_subtree(operand);
        let negated = not(cx, copy);
        replace_expr(cx, node, negated)
    }
}

/// `!(a == b)` -> `a != b`; relational operators only on integral operands.
struct NegatedComparison;

impl Mutator for NegatedComparison {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let Some(comparison) = negated_operand(tree, node) else {
            return false;
        };
        let NodeKind::Binary { op } = *tree.kind(comparison) else {
            return false;
        };
        let Some(negated) = op.negated() else {
            return false;
        };
        let (Some(lhs), Some(rhs)) = (tree.slot(comparison, 0), tree.slot(comparison, 1)) else {
            return false;
        };
        // Floating point comparisons with NaN are false both ways.
        if op.is_relational() {
            let integral = |n| primitive_of(cx, n).is_some_and(PrimitiveKind::is_integral);
            if !integral(lhs) || !integral(rhs) {
                return false;
            }
        }

        let lhs = cx.clone_subtree(lhs);
        let rhs = cx.clone_subtree(rhs);
        let folded = binary(cx, negated, lhs, rhs);
        replace_expr(cx, node, folded)
    }
}
