//! Wrapper class rules.

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{BinaryOp, NodeBuilder, NodeKind, NodeRef, PrimitiveKind, Symbol};

use crate::patterns::{
    binary, boxed_class, call, names_class, primitive_of, replace_expr, strip_parens,
};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("PrimitiveWrapperInstantiation")
                .external("PMD", "PrimitiveWrapperInstantiation")
                .external("Sonar", "S2129")
                .tag("Boxing")
                .before("BoxedPrimitiveToString")
                .describe("Use `valueOf` instead of the deprecated wrapper constructors"),
            PrimitiveWrapperInstantiation,
        )
        .rule(
            RuleDescriptor::new("BoxedPrimitiveToString")
                .external("Sonar", "S2131")
                .tag("Boxing")
                .after("PrimitiveWrapperInstantiation")
                .describe("Convert primitives to strings without boxing them first"),
            BoxedPrimitiveToString,
        )
        .rule(
            RuleDescriptor::new("PrimitiveObjectsEquals")
                .tag("Boxing")
                .describe("Compare primitives with `==` instead of `Objects.equals`"),
            PrimitiveObjectsEquals,
        )
}

/// The wrapper class named by a `ClassType` without type arguments.
fn wrapper_type(cx: &RewriteContext<'_>, ty: NodeRef) -> Option<(Symbol, PrimitiveKind)> {
    let NodeKind::ClassType { name, .. } = *cx.kind(ty) else {
        return None;
    };
    if !cx.list(ty).is_empty() {
        return None;
    }
    boxed_class(cx, ty, name).map(|primitive| (name, primitive))
}

/// `Integer.valueOf(x)` or `new Integer(x)`: the wrapper as written, its
/// primitive and the single argument.
fn boxing(cx: &RewriteContext<'_>, node: NodeRef) -> Option<(Symbol, PrimitiveKind, NodeRef)> {
    match *cx.kind(node) {
        NodeKind::New => {
            let [argument] = *cx.list(node) else {
                return None;
            };
            let (name, primitive) = wrapper_type(cx, cx.slot(node, 0)?)?;
            Some((name, primitive, argument))
        }
        NodeKind::MethodCall { .. } => {
            let call = call(cx.tree(), node)?;
            if !call.is("valueOf", 1) {
                return None;
            }
            let receiver = call.receiver?;
            let NodeKind::TypeName { name } = *cx.kind(receiver) else {
                return None;
            };
            let primitive = boxed_class(cx, receiver, name)?;
            Some((name, primitive, call.args[0]))
        }
        _ => None,
    }
}

/// `new Integer(x)` -> `Integer.valueOf(x)`
struct PrimitiveWrapperInstantiation;

impl Mutator for PrimitiveWrapperInstantiation {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::New) {
            return false;
        }
        let Some((name, _, argument)) = boxing(cx, node) else {
            return false;
        };

        let span = cx.span(node);
        let class = cx.create(NodeBuilder::new(NodeKind::TypeName { name }).span(span));
        let argument = cx.clone_subtree(argument);
        let value_of = cx.create(
            NodeBuilder::new(NodeKind::MethodCall {
                name: Symbol::new("valueOf"),
            })
            .slot(class)
            .item(argument)
            .span(span),
        );
        cx.replace(node, value_of)
    }
}

/// `Integer.valueOf(i).toString()` -> `Integer.toString(i)`
struct BoxedPrimitiveToString;

impl Mutator for BoxedPrimitiveToString {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let Some(call) = call(cx.tree(), node) else {
            return false;
        };
        let Some(receiver) = call.receiver.filter(|_| call.is("toString", 0)) else {
            return false;
        };
        let boxed = strip_parens(cx.tree(), receiver);
        let Some((name, primitive, argument)) = boxing(cx, boxed) else {
            return false;
        };
        // `Integer.valueOf("1").toString()` has no static counterpart.
        if primitive_of(cx, argument) != Some(primitive) {
            return false;
        }

        let span = cx.span(node);
        let class = cx.create(NodeBuilder::new(NodeKind::TypeName { name }).span(span));
        let argument = cx.clone_subtree(argument);
        let to_string = cx.create(
            NodeBuilder::new(NodeKind::MethodCall {
                name: Symbol::new("toString"),
            })
            .slot(class)
            .item(argument)
            .span(span),
        );
        cx.replace(node, to_string)
    }
}

/// `Objects.equals(a, b)` -> `a == b` for integral or boolean primitives.
struct PrimitiveObjectsEquals;

impl Mutator for PrimitiveObjectsEquals {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let Some(call) = call(cx.tree(), node) else {
            return false;
        };
        let Some(receiver) = call.receiver.filter(|_| call.is("equals", 2)) else {
            return false;
        };
        let NodeKind::TypeName { name } = *cx.kind(receiver) else {
            return false;
        };
        if !names_class(cx, receiver, name, "java.util.Objects") {
            return false;
        }
        let (lhs, rhs) = (call.args[0], call.args[1]);
        let Some(primitive) = primitive_of(cx, lhs) else {
            return false;
        };
        let comparable = primitive.is_integral() || primitive == PrimitiveKind::Boolean;
        if !comparable || primitive_of(cx, rhs) != Some(primitive) {
            return false;
        }

        let lhs = cx.clone_subtree(lhs);
        let rhs = cx.clone_subtree(rhs);
        let equal = binary(cx, BinaryOp::Eq, lhs, rhs);
        replace_expr(cx, node, equal)
    }
}
