//! Collection, `Optional` and stream rules.

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{LanguageLevel, NodeBuilder, NodeKind, NodeRef, Symbol, UnaryOp};

use crate::patterns::{
    call, call_on_copy, emptiness_test, inherits, not, nullary_call, replace_expr, strip_parens,
};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("CollectionIsEmpty")
                .external("PMD", "UseCollectionIsEmpty")
                .external("Sonar", "S1155")
                .tag("Collection")
                .describe("Test collections and maps for emptiness with `isEmpty()`"),
            CollectionIsEmpty,
        )
        .rule(
            RuleDescriptor::new("OptionalNotEmpty")
                .min_level(LanguageLevel::V11)
                .tag("Optional")
                .describe("Replace a negated `isPresent()`/`isEmpty()` with its counterpart"),
            OptionalNotEmpty,
        )
        .rule(
            RuleDescriptor::new("StreamForEach")
                .min_level(LanguageLevel::V8)
                .tag("Collection")
                .describe("Iterate collections directly instead of through a stream"),
            StreamForEach,
        )
}

fn is_sized(cx: &RewriteContext<'_>, node: NodeRef) -> bool {
    inherits(cx, node, "java.util.Collection") || inherits(cx, node, "java.util.Map")
}

/// `c.size() == 0` -> `c.isEmpty()`, `c.size() != 0` -> `!c.isEmpty()`
struct CollectionIsEmpty;

impl Mutator for CollectionIsEmpty {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let Some((receiver, empty)) = emptiness_test(cx.tree(), node, "size") else {
            return false;
        };
        if !is_sized(cx, receiver) {
            return false;
        }
        let mut test = call_on_copy(cx, receiver, "isEmpty");
        if !empty {
            test = not(cx, test);
        }
        replace_expr(cx, node, test)
    }
}

/// `!o.isPresent()` -> `o.isEmpty()` and back.
struct OptionalNotEmpty;

impl Mutator for OptionalNotEmpty {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        if !matches!(tree.kind(node), NodeKind::Unary { op: UnaryOp::Not }) {
            return false;
        }
        let Some(operand) = tree.slot(node, 0).map(|n| strip_parens(tree, n)) else {
            return false;
        };
        let (receiver, opposite) = if let Some(receiver) = nullary_call(tree, operand, "isPresent") {
            (receiver, "isEmpty")
        } else if let Some(receiver) = nullary_call(tree, operand, "isEmpty") {
            (receiver, "isPresent")
        } else {
            return false;
        };
        if !inherits(cx, receiver, "java.util.Optional") {
            return false;
        }
        let test = call_on_copy(cx, receiver, opposite);
        replace_expr(cx, node, test)
    }
}

/// `c.stream().forEach(f)` -> `c.forEach(f)`
struct StreamForEach;

impl Mutator for StreamForEach {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let Some(call) = call(tree, node) else {
            return false;
        };
        let Some(stream) = call.receiver.filter(|_| call.is("forEach", 1)) else {
            return false;
        };
        let Some(source) = nullary_call(tree, strip_parens(tree, stream), "stream") else {
            return false;
        };
        if !inherits(cx, source, "java.util.Collection") {
            return false;
        }

        let span = cx.span(node);
        let source = cx.clone_subtree(source);
        let action = cx.clone_subtree(call.args[0]);
        let for_each = cx.create(
            NodeBuilder::new(NodeKind::MethodCall {
                name: Symbol::new("forEach"),
            })
            .slot(source)
            .item(action)
            .span(span),
        );
        cx.replace(node, for_each)
    }
}
