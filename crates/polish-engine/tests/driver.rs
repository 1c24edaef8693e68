//! End-to-end behavior of the fixed-point driver.

use insta::assert_snapshot;
use polish_engine::{
    DiagnosticSink, Diagnostics, DriverConfig, EventKind, FnMutator, MutationEvent, RewriteContext,
    RuleCatalog, RuleDescriptor, RuleSelection, RunOutcome, compute_active_schedule, run,
};
use polish_syntax::printer::print_tree;
use polish_syntax::validation::validate_tree;
use polish_syntax::{
    LiteralKind, NodeBuilder, NodeKind, NodeRef, Symbol, SyntaxTree, UnaryOp, Unresolved,
};

// ========================================================================
// Test rules
// ========================================================================

/// `!!x` -> `x`
fn double_negation(cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
    let NodeKind::Unary { op: UnaryOp::Not } = *cx.kind(node) else {
        return false;
    };
    let Some(inner) = cx.slot(node, 0) else {
        return false;
    };
    let NodeKind::Unary { op: UnaryOp::Not } = *cx.kind(inner) else {
        return false;
    };
    match cx.slot(inner, 0) {
        Some(operand) => cx.replace(node, operand),
        None => false,
    }
}

/// `a` -> `true`
fn name_a_to_true(cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
    if *cx.kind(node) != (NodeKind::Name { name: Symbol::new("a") }) {
        return false;
    }
    let literal = cx.create(NodeBuilder::new(literal(LiteralKind::Boolean, "true")));
    cx.replace(node, literal)
}

/// `!true` -> `false`
fn not_true_to_false(cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
    let NodeKind::Unary { op: UnaryOp::Not } = *cx.kind(node) else {
        return false;
    };
    let Some(operand) = cx.slot(node, 0) else {
        return false;
    };
    if *cx.kind(operand) != literal(LiteralKind::Boolean, "true") {
        return false;
    }
    let replacement = cx.create(NodeBuilder::new(literal(LiteralKind::Boolean, "false")));
    cx.replace(node, replacement)
}

fn never(_cx: &mut RewriteContext<'_>, _node: NodeRef) -> bool {
    false
}

fn panics_on_names(cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
    if matches!(cx.kind(node), NodeKind::Name { .. }) {
        panic!("cannot handle names");
    }
    false
}

/// Replaces every integer literal by its successor, forever.
fn increment(cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
    let NodeKind::Literal {
        literal: LiteralKind::Int,
        text,
    } = *cx.kind(node)
    else {
        return false;
    };
    let Ok(value) = text.with_str(str::parse::<u64>) else {
        return false;
    };
    let next = Symbol::from_dynamic(&(value + 1).to_string());
    let replacement = cx.create(NodeBuilder::new(NodeKind::Literal {
        literal: LiteralKind::Int,
        text: next,
    }));
    cx.replace(node, replacement)
}

fn drop_empty(cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
    matches!(cx.kind(node), NodeKind::Empty) && cx.remove(node)
}

/// Claims a rewrite without touching the tree.
fn liar(_cx: &mut RewriteContext<'_>, _node: NodeRef) -> bool {
    true
}

// ========================================================================
// Helpers
// ========================================================================

fn literal(literal: LiteralKind, text: &'static str) -> NodeKind {
    NodeKind::Literal {
        literal,
        text: Symbol::new(text),
    }
}

fn name(tree: &mut SyntaxTree, text: &'static str) -> NodeRef {
    tree.create(NodeBuilder::new(NodeKind::Name {
        name: Symbol::new(text),
    }))
}

fn not(tree: &mut SyntaxTree, operand: NodeRef) -> NodeRef {
    tree.create(NodeBuilder::new(NodeKind::Unary { op: UnaryOp::Not }).slot(operand))
}

/// A block of expression statements.
fn block(tree: &mut SyntaxTree, exprs: Vec<NodeRef>) -> NodeRef {
    let stmts: Vec<NodeRef> = exprs
        .into_iter()
        .map(|e| tree.create(NodeBuilder::new(NodeKind::ExprStmt).slot(e)))
        .collect();
    let block = tree.create(NodeBuilder::new(NodeKind::Block).items(stmts));
    tree.set_root(block).unwrap();
    block
}

fn catalog() -> RuleCatalog {
    RuleCatalog::builder()
        .rule(
            RuleDescriptor::new("DoubleNegation").repeat_until_no_match(),
            FnMutator::expression(double_negation),
        )
        .rule(
            RuleDescriptor::new("R1").before("R2"),
            FnMutator::expression(name_a_to_true),
        )
        .rule(
            RuleDescriptor::new("R2").after("R1"),
            FnMutator::expression(not_true_to_false),
        )
        .rule(RuleDescriptor::new("Never"), FnMutator::node(never))
        .rule(
            RuleDescriptor::new("Panicky").draft(),
            FnMutator::expression(panics_on_names),
        )
        .rule(
            RuleDescriptor::new("Increment").draft().repeat_until_no_match(),
            FnMutator::expression(increment),
        )
        .rule(
            RuleDescriptor::new("DropEmpty"),
            FnMutator::statement(drop_empty),
        )
        .rule(RuleDescriptor::new("Liar").draft(), FnMutator::expression(liar))
        .build()
        .unwrap()
}

fn select(ids: &[&'static str]) -> RuleSelection {
    ids.iter().fold(RuleSelection::new(), |s, &id| s.include(id))
}

fn run_with(
    tree: &mut SyntaxTree,
    ids: &[&'static str],
    config: DriverConfig,
) -> (RunOutcome, Diagnostics) {
    let catalog = catalog();
    let schedule = compute_active_schedule(&catalog, &select(ids)).unwrap();
    let mut diagnostics = Diagnostics::new();
    let outcome = run(tree, &Unresolved, &schedule, config, &mut diagnostics);
    (outcome, diagnostics)
}

// ========================================================================
// Tests
// ========================================================================

#[test]
fn double_negation_converges_in_one_pass() {
    let mut tree = SyntaxTree::new();
    let x = name(&mut tree, "x");
    let inner = not(&mut tree, x);
    let outer = not(&mut tree, inner);
    block(&mut tree, vec![outer]);

    let (outcome, diagnostics) = run_with(&mut tree, &["DoubleNegation"], DriverConfig::default());

    assert_eq!(
        outcome,
        RunOutcome {
            changed: true,
            converged: true,
            passes: 1,
            rewrites: 1,
        }
    );
    assert_snapshot!(print_tree(&tree), @r"
    {
        x;
    }
    ");
    assert_eq!(
        diagnostics.applied_by_rule(),
        vec![(Symbol::new("DoubleNegation"), 1)]
    );
    assert!(validate_tree(&tree).is_ok());
}

#[test]
fn repeating_rule_strips_every_pair_at_one_position() {
    let mut tree = SyntaxTree::new();
    let mut expr = name(&mut tree, "x");
    for _ in 0..6 {
        expr = not(&mut tree, expr);
    }
    block(&mut tree, vec![expr]);

    let (outcome, _) = run_with(&mut tree, &["DoubleNegation"], DriverConfig::default());

    assert_eq!(outcome.passes, 1);
    assert_eq!(outcome.rewrites, 3);
    assert_snapshot!(print_tree(&tree), @r"
    {
        x;
    }
    ");
}

#[test]
fn dependent_rules_need_two_passes() {
    let mut tree = SyntaxTree::new();
    let a = name(&mut tree, "a");
    let negated = not(&mut tree, a);
    block(&mut tree, vec![negated]);

    let (outcome, _) = run_with(&mut tree, &["R1", "R2"], DriverConfig::default());

    assert_eq!(
        outcome,
        RunOutcome {
            changed: true,
            converged: true,
            passes: 2,
            rewrites: 2,
        }
    );
    assert_snapshot!(print_tree(&tree), @r"
    {
        false;
    }
    ");
}

#[test]
fn dependent_rule_alone_changes_nothing() {
    let mut tree = SyntaxTree::new();
    let a = name(&mut tree, "a");
    let negated = not(&mut tree, a);
    block(&mut tree, vec![negated]);
    let revision = tree.revision();

    let (outcome, diagnostics) = run_with(&mut tree, &["R2"], DriverConfig::default());

    assert_eq!(
        outcome,
        RunOutcome {
            changed: false,
            converged: true,
            passes: 0,
            rewrites: 0,
        }
    );
    assert_eq!(tree.revision(), revision);
    assert!(diagnostics.is_empty());
}

#[test]
fn zero_pass_bound_only_probes() {
    let mut tree = SyntaxTree::new();
    let x = name(&mut tree, "x");
    let inner = not(&mut tree, x);
    let outer = not(&mut tree, inner);
    block(&mut tree, vec![outer]);
    let before = print_tree(&tree);
    let revision = tree.revision();

    let config = DriverConfig::default().with_pass_bound(0);
    let (outcome, diagnostics) = run_with(&mut tree, &["DoubleNegation"], config);

    assert!(!outcome.converged);
    assert!(!outcome.changed);
    assert_eq!(outcome.passes, 0);
    assert_eq!(tree.revision(), revision);
    assert_eq!(print_tree(&tree), before);
    // Only the non-convergence event; the probe reports nothing.
    assert_eq!(diagnostics.events().len(), 1);
    assert!(matches!(
        diagnostics.events()[0].kind,
        EventKind::NonConverged { passes: 0 }
    ));

    let (outcome, _) = run_with(&mut tree, &["Never"], config);
    assert!(outcome.converged);
}

#[test]
fn converged_output_is_a_fixed_point() {
    let mut tree = SyntaxTree::new();
    let a = name(&mut tree, "a");
    let inner = not(&mut tree, a);
    let outer = not(&mut tree, inner);
    let b = name(&mut tree, "a");
    let negated = not(&mut tree, b);
    block(&mut tree, vec![outer, negated]);

    let rules = ["DoubleNegation", "R1", "R2"];
    let (first, _) = run_with(&mut tree, &rules, DriverConfig::default());
    assert!(first.converged);
    assert!(first.changed);
    let output = print_tree(&tree);

    let (second, _) = run_with(&mut tree, &rules, DriverConfig::default());
    assert!(!second.changed);
    assert!(second.converged);
    assert_eq!(print_tree(&tree), output);
    assert_snapshot!(output, @r"
    {
        true;
        false;
    }
    ");
}

#[test]
fn unmatched_rules_leave_the_tree_alone() {
    let mut tree = SyntaxTree::new();
    let x = name(&mut tree, "x");
    let y = name(&mut tree, "y");
    let negated = not(&mut tree, y);
    block(&mut tree, vec![x, negated]);
    let revision = tree.revision();

    let (outcome, _) = run_with(&mut tree, &["Never", "DoubleNegation", "R2"], DriverConfig::default());

    assert!(!outcome.changed);
    assert_eq!(tree.revision(), revision);
}

#[test]
fn removing_statements_keeps_visiting_siblings() {
    let mut tree = SyntaxTree::new();
    let empty1 = tree.create(NodeBuilder::new(NodeKind::Empty));
    let empty2 = tree.create(NodeBuilder::new(NodeKind::Empty));
    let x = name(&mut tree, "x");
    let stmt = tree.create(NodeBuilder::new(NodeKind::ExprStmt).slot(x));
    let empty3 = tree.create(NodeBuilder::new(NodeKind::Empty));
    let root = tree.create(NodeBuilder::new(NodeKind::Block).items([empty1, empty2, stmt, empty3]));
    tree.set_root(root).unwrap();

    let (outcome, _) = run_with(&mut tree, &["DropEmpty"], DriverConfig::default());

    assert_eq!(outcome.passes, 1);
    assert_eq!(outcome.rewrites, 3);
    assert_eq!(tree.list(root), [stmt]);
    assert!(validate_tree(&tree).is_ok());
}

#[test]
fn panicking_rule_is_disabled_and_contained() {
    let mut tree = SyntaxTree::new();
    let x = name(&mut tree, "x");
    let inner = not(&mut tree, x);
    let outer = not(&mut tree, inner);
    let y = name(&mut tree, "y");
    block(&mut tree, vec![outer, y]);

    let (outcome, diagnostics) =
        run_with(&mut tree, &["Panicky", "DoubleNegation"], DriverConfig::default());

    assert!(outcome.converged);
    assert_eq!(outcome.rewrites, 1);
    let panics: Vec<&MutationEvent> = diagnostics
        .events()
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Panicked { .. }))
        .collect();
    assert_eq!(panics.len(), 1);
    assert_eq!(panics[0].rule, Some(Symbol::new("Panicky")));
    assert_eq!(
        panics[0].kind,
        EventKind::Panicked {
            message: "cannot handle names".to_owned()
        }
    );
    assert!(validate_tree(&tree).is_ok());
    assert_snapshot!(print_tree(&tree), @r"
    {
        x;
        y;
    }
    ");
}

#[test]
fn retry_cap_and_pass_bound_stop_a_runaway_rule() {
    let mut tree = SyntaxTree::new();
    let zero = tree.create(NodeBuilder::new(literal(LiteralKind::Int, "0")));
    block(&mut tree, vec![zero]);

    let config = DriverConfig::default()
        .with_pass_bound(2)
        .with_retry_cap(3);
    let (outcome, diagnostics) = run_with(&mut tree, &["Increment"], config);

    assert_eq!(
        outcome,
        RunOutcome {
            changed: true,
            converged: false,
            passes: 2,
            rewrites: 6,
        }
    );
    assert_snapshot!(print_tree(&tree), @r"
    {
        6;
    }
    ");
    let caps = diagnostics
        .problems()
        .filter(|e| matches!(e.kind, EventKind::RetryCapReached { attempts: 3 }))
        .count();
    assert_eq!(caps, 2);
    assert!(
        diagnostics
            .problems()
            .any(|e| e.kind == EventKind::NonConverged { passes: 2 })
    );
}

#[test]
fn claimed_rewrites_without_changes_do_not_count() {
    let mut tree = SyntaxTree::new();
    let x = name(&mut tree, "x");
    block(&mut tree, vec![x]);

    let (outcome, diagnostics) = run_with(&mut tree, &["Liar"], DriverConfig::default());

    assert!(!outcome.changed);
    assert!(outcome.converged);
    assert!(diagnostics.is_empty());
}

#[test]
fn events_reach_a_custom_sink() {
    struct Counter(usize);
    impl DiagnosticSink for Counter {
        fn record(&mut self, _event: MutationEvent) {
            self.0 += 1;
        }
    }

    let mut tree = SyntaxTree::new();
    let x = name(&mut tree, "x");
    let inner = not(&mut tree, x);
    let outer = not(&mut tree, inner);
    block(&mut tree, vec![outer]);

    let catalog = catalog();
    let schedule = compute_active_schedule(&catalog, &select(&["DoubleNegation"])).unwrap();
    let mut counter = Counter(0);
    run(&mut tree, &Unresolved, &schedule, DriverConfig::default(), &mut counter);
    assert_eq!(counter.0, 1);
}
