//! Declaration rules.
//!
//! - `ArrayList<T> xs = new ArrayList<T>();` -> `var xs = new ArrayList<T>();`
//! - `List<T> xs = new ArrayList<T>();` -> `List<T> xs = new ArrayList<>();`
//! - redundant modifiers on interface members are dropped
//! - a leading `super();` in a constructor is dropped

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{
    ClassKind, LanguageLevel, ModifierKeyword, NodeBuilder, NodeKind, NodeRef, SyntaxTree,
};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("LocalVariableTypeInference")
                .external("Sonar", "S6212")
                .min_level(LanguageLevel::V10)
                .draft()
                .tag("Declaration")
                .before("UseDiamondOperator")
                .describe("Declare locals initialized with `new` of the same type as `var`"),
            LocalVariableTypeInference,
        )
        .rule(
            RuleDescriptor::new("UseDiamondOperator")
                .external("PMD", "UseDiamondOperator")
                .external("Sonar", "S2293")
                .min_level(LanguageLevel::V7)
                .tag("Declaration")
                .tag("Generics")
                .after("LocalVariableTypeInference")
                .describe("Let the compiler infer type arguments of `new` in initializers"),
            UseDiamondOperator,
        )
        .rule(
            RuleDescriptor::new("UnnecessaryModifier")
                .external("PMD", "UnnecessaryModifier")
                .external("Sonar", "S2333")
                .tag("Declaration")
                .describe("Remove modifiers interface members carry implicitly"),
            UnnecessaryModifier,
        )
        .rule(
            RuleDescriptor::new("RemoveExplicitSuperCall")
                .tag("Declaration")
                .describe("Remove a no-argument `super()` call at the start of a constructor"),
            RemoveExplicitSuperCall,
        )
}

/// Whether two type nodes spell the same type.
fn same_type(tree: &SyntaxTree, a: NodeRef, b: NodeRef) -> bool {
    let (x, y) = (tree.node(a), tree.node(b));
    let same_slots = x.slots().len() == y.slots().len()
        && x.slots().iter().zip(y.slots()).all(|pair| match pair {
            (Some(a), Some(b)) => same_type(tree, *a, *b),
            (None, None) => true,
            _ => false,
        });
    let same_list = x.list().len() == y.list().len()
        && x.list().iter().zip(y.list()).all(|(a, b)| same_type(tree, *a, *b));
    x.kind() == y.kind() && same_slots && same_list
}

/// `T x = new T(...)` -> `var x = new T(...)`
struct LocalVariableTypeInference;

impl Mutator for LocalVariableTypeInference {
    fn granularity(&self) -> Granularity {
        Granularity::Statement
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::LocalVar { .. }) {
            return false;
        }
        let (Some(declared), Some(init)) = (cx.slot(node, 0), cx.slot(node, 1)) else {
            return false;
        };
        if !matches!(cx.kind(declared), NodeKind::ClassType { .. })
            || !matches!(cx.kind(init), NodeKind::New)
        {
            return false;
        }
        let Some(created) = cx.slot(init, 0) else {
            return false;
        };
        if !same_type(cx.tree(), declared, created) {
            return false;
        }

        let span = cx.span(declared);
        let var = cx.create(NodeBuilder::new(NodeKind::VarType).span(span));
        cx.replace(declared, var)
    }
}

/// `new ArrayList<String>()` -> `new ArrayList<>()` in an initializer whose
/// declared type has type arguments.
struct UseDiamondOperator;

impl Mutator for UseDiamondOperator {
    fn granularity(&self) -> Granularity {
        Granularity::Node
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let (declared, init) = match cx.kind(node) {
            NodeKind::LocalVar { .. } => (cx.slot(node, 0), cx.slot(node, 1)),
            NodeKind::FieldDecl { .. } => (cx.slot(node, 1), cx.slot(node, 2)),
            _ => return false,
        };
        let (Some(declared), Some(init)) = (declared, init) else {
            return false;
        };
        if !is_parameterized(cx, declared) || !matches!(cx.kind(init), NodeKind::New) {
            return false;
        }
        let Some(created) = cx.slot(init, 0).filter(|&ty| is_parameterized(cx, ty)) else {
            return false;
        };
        let NodeKind::ClassType { name, .. } = *cx.kind(created) else {
            return false;
        };

        let span = cx.span(created);
        let diamond = cx.create(
            NodeBuilder::new(NodeKind::ClassType {
                name,
                diamond: true,
            })
            .span(span),
        );
        cx.replace(created, diamond)
    }
}

fn is_parameterized(cx: &RewriteContext<'_>, ty: NodeRef) -> bool {
    matches!(cx.kind(ty), NodeKind::ClassType { .. }) && !cx.list(ty).is_empty()
}

/// `interface I { public abstract void m(); }` -> `interface I { void m(); }`
struct UnnecessaryModifier;

impl Mutator for UnnecessaryModifier {
    fn granularity(&self) -> Granularity {
        Granularity::Node
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let NodeKind::Modifier { keyword } = *cx.kind(node) else {
            return false;
        };
        let tree = cx.tree();
        let (member, owner) = {
            let mut ancestors = tree.ancestors(node).skip(1);
            (ancestors.next(), ancestors.next())
        };
        let (Some(member), Some(owner)) = (member, owner) else {
            return false;
        };
        let in_interface = matches!(
            tree.kind(owner),
            NodeKind::ClassDecl {
                class_kind: ClassKind::Interface,
                ..
            }
        );
        let implied = match tree.kind(member) {
            NodeKind::MethodDecl { .. } => {
                matches!(keyword, ModifierKeyword::Public | ModifierKeyword::Abstract)
            }
            NodeKind::FieldDecl { .. } => matches!(
                keyword,
                ModifierKeyword::Public | ModifierKeyword::Static | ModifierKeyword::Final
            ),
            _ => false,
        };
        in_interface && implied && cx.remove(node)
    }
}

/// `Foo() { super(); ... }` -> `Foo() { ... }`
struct RemoveExplicitSuperCall;

impl Mutator for RemoveExplicitSuperCall {
    fn granularity(&self) -> Granularity {
        Granularity::Node
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(
            cx.kind(node),
            NodeKind::ExplicitConstructorCall { is_super: true }
        ) || !cx.list(node).is_empty()
        {
            return false;
        }
        let tree = cx.tree();
        let Some(body) = tree.parent(node) else {
            return false;
        };
        let leading = tree.list(body).first() == Some(&node);
        let in_constructor = tree
            .parent(body)
            .is_some_and(|owner| matches!(tree.kind(owner), NodeKind::ConstructorDecl { .. }));
        leading && in_constructor && cx.remove(node)
    }
}
