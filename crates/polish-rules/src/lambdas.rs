//! Lambda shortening.
//!
//! The three rules cooperate: braces go first, so that a lambda whose body
//! was `{ return x.m(); }` can still become a method reference in the same
//! pass.

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{LanguageLevel, NodeBuilder, NodeKind, NodeRef};

use crate::patterns::{call, static_type};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("LambdaParenthesesRemoval")
                .external("Sonar", "S1611")
                .min_level(LanguageLevel::V8)
                .tag("Lambda")
                .describe("Drop the parentheses around a single untyped lambda parameter"),
            LambdaParenthesesRemoval,
        )
        .rule(
            RuleDescriptor::new("LambdaReturnsSingleStatement")
                .external("Sonar", "S1602")
                .min_level(LanguageLevel::V8)
                .tag("Lambda")
                .before("LambdaIsMethodReference")
                .describe("Use an expression body for lambdas holding a single statement"),
            LambdaReturnsSingleStatement,
        )
        .rule(
            RuleDescriptor::new("LambdaIsMethodReference")
                .external("Sonar", "S1612")
                .external("PMD", "LambdaCanBeMethodReference")
                .min_level(LanguageLevel::V8)
                .tag("Lambda")
                .after("LambdaReturnsSingleStatement")
                .describe("Replace `x -> x.m()` with a method reference"),
            LambdaIsMethodReference,
        )
}

/// `(x) -> ...` -> `x -> ...`
struct LambdaParenthesesRemoval;

impl Mutator for LambdaParenthesesRemoval {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let NodeKind::Lambda {
            parenthesized: true,
        } = *cx.kind(node)
        else {
            return false;
        };
        let [param] = *cx.list(node) else {
            return false;
        };
        if cx.slot(param, 0).is_some() {
            return false;
        }
        let Some(body) = cx.slot(node, 0) else {
            return false;
        };

        let span = cx.span(node);
        let body = cx.clone_subtree(body);
        let param = cx.clone_subtree(param);
        let bare = cx.create(
            NodeBuilder::new(NodeKind::Lambda {
                parenthesized: false,
            })
            .slot(body)
            .item(param)
            .span(span),
        );
        cx.replace(node, bare)
    }
}

/// `x -> { return e; }` -> `x -> e`, `x -> { f(x); }` -> `x -> f(x)`
struct LambdaReturnsSingleStatement;

impl Mutator for LambdaReturnsSingleStatement {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::Lambda { .. }) {
            return false;
        }
        let Some(body) = cx.slot(node, 0) else {
            return false;
        };
        if !matches!(cx.kind(body), NodeKind::Block) {
            return false;
        }
        let [stmt] = *cx.list(body) else {
            return false;
        };
        let expr = match cx.kind(stmt) {
            NodeKind::Return => cx.slot(stmt, 0),
            // Only statement expressions may stand alone as a body.
            NodeKind::ExprStmt => cx.slot(stmt, 0).filter(|&e| {
                match cx.kind(e) {
                    NodeKind::MethodCall { .. } | NodeKind::Assign { .. } | NodeKind::New => true,
                    NodeKind::Unary { op } => op.has_side_effect(),
                    _ => false,
                }
            }),
            _ => None,
        };
        match expr {
            Some(expr) => cx.replace(body, expr),
            None => false,
        }
    }
}

/// `(String s) -> s.trim()` -> `String::trim`
///
/// The parameter type must be spelled out and resolve to a class.
struct LambdaIsMethodReference;

impl Mutator for LambdaIsMethodReference {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::Lambda { .. }) {
            return false;
        }
        let [param] = *cx.list(node) else {
            return false;
        };
        let NodeKind::Param { name: param_name } = *cx.kind(param) else {
            return false;
        };
        let (Some(ty), Some(body)) = (cx.slot(param, 0), cx.slot(node, 0)) else {
            return false;
        };
        let Some(call) = call(cx.tree(), body) else {
            return false;
        };
        let Some(receiver) = call.receiver.filter(|_| call.args.is_empty()) else {
            return false;
        };
        if !matches!(cx.kind(receiver), NodeKind::Name { name } if *name == param_name) {
            return false;
        }
        let NodeKind::ClassType { name: class, .. } = *cx.kind(ty) else {
            return false;
        };
        if static_type(cx, ty).and_then(|t| t.class_name()).is_none() {
            return false;
        }

        let span = cx.span(node);
        let qualifier = cx.create(NodeBuilder::new(NodeKind::TypeName { name: class }).span(span));
        let reference = cx.create(
            NodeBuilder::new(NodeKind::MethodRef { name: call.name })
                .slot(qualifier)
                .span(span),
        );
        cx.replace(node, reference)
    }
}
