//! Operand order and grouping.

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{NodeBuilder, NodeKind, NodeRef};

use crate::CONTROVERSIAL;
use crate::patterns::{
    binary, call, is_literal, is_null_literal, is_string, replace_expr, string_literal,
    strip_parens,
};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("RedundantParentheses")
                .external("PMD", "UselessParentheses")
                .repeat_until_no_match()
                .describe("Remove parentheses around primaries and doubled parentheses"),
            RedundantParentheses,
        )
        .rule(
            RuleDescriptor::new("NullLiteralOnRight")
                .tag(CONTROVERSIAL)
                .describe("Put the `null` literal on the right of an equality test"),
            NullLiteralOnRight,
        )
        .rule(
            RuleDescriptor::new("LiteralsFirstInComparisons")
                .external("PMD", "LiteralsFirstInComparisons")
                .external("Sonar", "S1132")
                .tag("String")
                .tag(CONTROVERSIAL)
                .describe("Call `equals` on the string literal instead of the variable"),
            LiteralsFirstInComparisons,
        )
}

/// `((x))` -> `x`, `(a.b())` -> `a.b()`
struct RedundantParentheses;

impl Mutator for RedundantParentheses {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::Paren) {
            return false;
        }
        let Some(inner) = cx.slot(node, 0) else {
            return false;
        };
        let primary = matches!(
            cx.kind(inner),
            NodeKind::Paren
                | NodeKind::Name { .. }
                | NodeKind::TypeName { .. }
                | NodeKind::This
                | NodeKind::Literal { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::FieldAccess { .. }
                | NodeKind::ArrayAccess
                | NodeKind::New
                | NodeKind::MethodRef { .. }
        );
        primary && cx.replace(node, inner)
    }
}

/// `null == x` -> `x == null`
struct NullLiteralOnRight;

impl Mutator for NullLiteralOnRight {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let NodeKind::Binary { op } = *tree.kind(node) else {
            return false;
        };
        let (Some(lhs), Some(rhs)) = (tree.slot(node, 0), tree.slot(node, 1)) else {
            return false;
        };
        if !op.is_equality()
            || !is_null_literal(tree, strip_parens(tree, lhs))
            || is_null_literal(tree, strip_parens(tree, rhs))
        {
            return false;
        }

        let lhs = cx.clone_subtree(lhs);
        let rhs = cx.clone_subtree(rhs);
        let swapped = binary(cx, op, rhs, lhs);
        replace_expr(cx, node, swapped)
    }
}

/// `s.equals("lit")` -> `"lit".equals(s)` for a `String` receiver.
struct LiteralsFirstInComparisons;

impl Mutator for LiteralsFirstInComparisons {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let Some(call) = call(tree, node) else {
            return false;
        };
        if !(call.is("equals", 1) || call.is("equalsIgnoreCase", 1)) {
            return false;
        }
        let Some(receiver) = call.receiver else {
            return false;
        };
        let literal = strip_parens(tree, call.args[0]);
        if string_literal(tree, literal).is_none()
            || is_literal(tree, strip_parens(tree, receiver))
            || !is_string(cx, receiver)
        {
            return false;
        }

        let span = cx.span(node);
        let literal = cx.clone_subtree(literal);
        let argument = cx.clone_subtree(receiver);
        let flipped = cx.create(
            NodeBuilder::new(NodeKind::MethodCall { name: call.name })
                .slot(literal)
                .item(argument)
                .span(span),
        );
        cx.replace(node, flipped)
    }
}
