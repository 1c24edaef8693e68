//! Statement-level rules.
//!
//! These rules look at a statement together with the one following it, so
//! they rewrite windows of sibling statements through `splice`:
//!
//! - `T x = a; if (c) x = b;` -> `T x = c ? b : a;`
//! - `T x = e; return x;` -> `return e;`
//! - `if (c) return true; else return false;` -> `return c;`
//! - a stray `;` in a block is dropped

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{AssignOp, NodeBuilder, NodeKind, NodeRef, UnaryOp};

use crate::CONTROVERSIAL;
use crate::patterns::{
    conditional, is_side_effect_free, mentions, not, primitive_of, returned_boolean,
    single_statement, static_type, strip_parens,
};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("ConditionalAssignmentToTernary")
                .tag("Statement")
                .tag(CONTROVERSIAL)
                .describe("Fold a conditional reassignment into the declaration"),
            ConditionalAssignmentToTernary,
        )
        .rule(
            RuleDescriptor::new("UnnecessaryLocalBeforeReturn")
                .external("PMD", "UnnecessaryLocalBeforeReturn")
                .external("Sonar", "S1488")
                .tag("Statement")
                .describe("Return the value directly instead of through a local"),
            UnnecessaryLocalBeforeReturn,
        )
        .rule(
            RuleDescriptor::new("SimplifyBooleanReturn")
                .external("PMD", "SimplifyBooleanReturns")
                .external("Sonar", "S1126")
                .tag("Statement")
                .describe("Return a condition instead of branching to boolean literals"),
            SimplifyBooleanReturn,
        )
        .rule(
            RuleDescriptor::new("EmptyStatement")
                .external("PMD", "UnnecessarySemicolon")
                .external("Sonar", "S1116")
                .tag("Statement")
                .describe("Remove empty statements"),
            EmptyStatement,
        )
}

/// `T x = a; if (c) x = b;` -> `T x = c ? b : a;`
///
/// `a` is evaluated in fewer paths afterwards and `c` earlier, so both must
/// be free of effects, and neither `b` nor `c` may read `x`. `a` and `b`
/// must have the same static type.
struct ConditionalAssignmentToTernary;

impl Mutator for ConditionalAssignmentToTernary {
    fn granularity(&self) -> Granularity {
        Granularity::Statement
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let NodeKind::LocalVar { name } = *cx.kind(node) else {
            return false;
        };
        let (Some(ty), Some(initial)) = (cx.slot(node, 0), cx.slot(node, 1)) else {
            return false;
        };
        let Some(window) = cx.window(node, 2) else {
            return false;
        };
        let branch = window[1];
        if !matches!(cx.kind(branch), NodeKind::If) || cx.slot(branch, 2).is_some() {
            return false;
        }
        let (Some(cond), Some(then)) = (cx.slot(branch, 0), cx.slot(branch, 1)) else {
            return false;
        };
        let tree = cx.tree();
        let Some(assignment) = single_statement(tree, then)
            .filter(|&stmt| matches!(tree.kind(stmt), NodeKind::ExprStmt))
            .and_then(|stmt| tree.slot(stmt, 0))
        else {
            return false;
        };
        if !matches!(
            tree.kind(assignment),
            NodeKind::Assign {
                op: AssignOp::Assign
            }
        ) {
            return false;
        }
        let (Some(target), Some(value)) = (tree.slot(assignment, 0), tree.slot(assignment, 1))
        else {
            return false;
        };
        if !matches!(tree.kind(target), NodeKind::Name { name: n } if *n == name) {
            return false;
        }
        if !is_side_effect_free(tree, initial)
            || !is_side_effect_free(tree, cond)
            || mentions(tree, cond, name)
            || mentions(tree, value, name)
        {
            return false;
        }
        // Mixed operands would make the conditional unbox or re-box them.
        let same_type = static_type(cx, value)
            .is_some_and(|ty| static_type(cx, initial) == Some(ty));
        if !same_type {
            return false;
        }

        let span = cx.span(node).cover(cx.span(branch));
        let ty = cx.clone_subtree(ty);
        let cond = cx.clone_subtree(cond);
        let value = cx.clone_subtree(value);
        let initial = cx.clone_subtree(initial);
        let init = conditional(cx, cond, value, initial);
        let decl = cx.create(
            NodeBuilder::new(NodeKind::LocalVar { name })
                .slot(ty)
                .slot(init)
                .span(span),
        );
        cx.splice(node, 2, &[decl])
    }
}

/// `T x = e; return x;` -> `return e;`
struct UnnecessaryLocalBeforeReturn;

impl Mutator for UnnecessaryLocalBeforeReturn {
    fn granularity(&self) -> Granularity {
        Granularity::Statement
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let NodeKind::LocalVar { name } = *cx.kind(node) else {
            return false;
        };
        let (Some(ty), Some(init)) = (cx.slot(node, 0), cx.slot(node, 1)) else {
            return false;
        };
        let Some(window) = cx.window(node, 2) else {
            return false;
        };
        let ret = window[1];
        if !matches!(cx.kind(ret), NodeKind::Return) {
            return false;
        }
        let Some(returned) = cx.slot(ret, 0).map(|value| strip_parens(cx.tree(), value)) else {
            return false;
        };
        if !matches!(cx.kind(returned), NodeKind::Name { name: n } if *n == name) {
            return false;
        }
        // The declaration may have been a widening conversion.
        if let Some(declared) = primitive_of(cx, ty) {
            if primitive_of(cx, init) != Some(declared) {
                return false;
            }
        }

        let span = cx.span(node).cover(cx.span(ret));
        let value = cx.clone_subtree(init);
        let direct = cx.create(NodeBuilder::new(NodeKind::Return).slot(value).span(span));
        cx.splice(node, 2, &[direct])
    }
}

/// `if (c) return true; else return false;` -> `return c;`
///
/// Also `if (c) return true; return false;` and the negated variants.
struct SimplifyBooleanReturn;

impl Mutator for SimplifyBooleanReturn {
    fn granularity(&self) -> Granularity {
        Granularity::Statement
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::If) {
            return false;
        }
        let tree = cx.tree();
        let (Some(cond), Some(then)) = (tree.slot(node, 0), tree.slot(node, 1)) else {
            return false;
        };
        let Some(when_true) = returned_boolean(tree, then) else {
            return false;
        };

        let (count, last) = match tree.slot(node, 2) {
            Some(otherwise) => (1, otherwise),
            None => match cx.window(node, 2) {
                Some(window) => (2, window[1]),
                None => return false,
            },
        };
        if returned_boolean(cx.tree(), last) != Some(!when_true) {
            return false;
        }

        let span = cx.span(node).cover(cx.span(last));
        let value = if when_true {
            cx.clone_subtree(cond)
        } else {
            negation(cx, cond)
        };
        let ret = cx.create(NodeBuilder::new(NodeKind::Return).slot(value).span(span));
        if count == 1 {
            cx.replace(node, ret)
        } else {
            cx.splice(node, 2, &[ret])
        }
    }
}

/// A detached negation of `cond`, unwrapping an existing `!`.
fn negation(cx: &mut RewriteContext<'_>, cond: NodeRef) -> NodeRef {
    let inner = strip_parens(cx.tree(), cond);
    if matches!(cx.kind(inner), NodeKind::Unary { op: UnaryOp::Not }) {
        if let Some(operand) = cx.slot(inner, 0) {
            return cx.clone_subtree(operand);
        }
    }
    let copy = cx.clone_subtree(cond);
    not(cx, copy)
}

/// `;` -> nothing
struct EmptyStatement;

impl Mutator for EmptyStatement {
    fn granularity(&self) -> Granularity {
        Granularity::Statement
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::Empty) {
            return false;
        }
        // `if (c) ;` needs its placeholder.
        let in_block = cx
            .tree()
            .parent(node)
            .is_some_and(|parent| matches!(cx.kind(parent), NodeKind::Block));
        in_block && cx.remove(node)
    }
}
