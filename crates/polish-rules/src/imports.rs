//! Import and type name cleanup.

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{NodeBuilder, NodeKind, NodeRef, Symbol, SyntaxTree};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("UnnecessaryImport")
                .external("PMD", "UnnecessaryImport")
                .external("Sonar", "S1128")
                .tag("Import")
                .describe("Remove duplicate imports and imports of implicitly visible types"),
            UnnecessaryImport,
        )
        .rule(
            RuleDescriptor::new("UnnecessaryFullyQualifiedName")
                .external("PMD", "UnnecessaryFullyQualifiedName")
                .tag("Import")
                .describe("Use the simple name of a type that is already visible"),
            UnnecessaryFullyQualifiedName,
        )
}

/// Removes an import that is
///
/// - identical to an earlier one,
/// - `java.lang.*`, or a single type directly in `java.lang` when no other
///   wildcard import could shadow it,
/// - a type of the unit's own package.
struct UnnecessaryImport;

impl Mutator for UnnecessaryImport {
    fn granularity(&self) -> Granularity {
        Granularity::Node
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let NodeKind::Import {
            path,
            is_static,
            wildcard,
        } = *tree.kind(node)
        else {
            return false;
        };
        if is_static {
            return is_duplicate(tree, node) && cx.remove(node);
        }

        // For `import a.b.*;` the path is the package itself.
        let package_of_import = if wildcard {
            path.with_str(str::to_owned)
        } else {
            path.with_str(|s| s.rsplit_once('.').map(|(package, _)| package.to_owned()))
                .unwrap_or_default()
        };
        // A single-type import shadows what any other wildcard import brings in.
        let implicit =
            package_of_import == "java.lang" && (wildcard || !has_foreign_wildcard(tree, node));
        let own_package = unit_package(tree, node)
            .is_some_and(|package| package.with_str(|p| p == package_of_import));

        (is_duplicate(tree, node) || implicit || own_package) && cx.remove(node)
    }
}

fn is_duplicate(tree: &SyntaxTree, node: NodeRef) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    tree.list(parent)
        .iter()
        .take_while(|&&sibling| sibling != node)
        .any(|&sibling| tree.kind(sibling) == tree.kind(node))
}

fn has_foreign_wildcard(tree: &SyntaxTree, node: NodeRef) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    tree.list(parent).iter().any(|&sibling| {
        matches!(
            *tree.kind(sibling),
            NodeKind::Import { path, is_static: false, wildcard: true } if path != "java.lang"
        )
    })
}

fn unit_package(tree: &SyntaxTree, node: NodeRef) -> Option<Symbol> {
    tree.ancestors(node).find_map(|n| match tree.kind(n) {
        NodeKind::CompilationUnit { package } => *package,
        _ => None,
    })
}

/// `java.util.List<String>` -> `List<String>` when `List` already names
/// `java.util.List` here.
struct UnnecessaryFullyQualifiedName;

impl Mutator for UnnecessaryFullyQualifiedName {
    fn granularity(&self) -> Granularity {
        Granularity::Node
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let (name, diamond) = match *cx.kind(node) {
            NodeKind::ClassType { name, diamond } => (name, Some(diamond)),
            NodeKind::TypeName { name } => (name, None),
            _ => return false,
        };
        if !name.is_qualified() {
            return false;
        }
        let simple = name.simple_name();
        let visible = cx.handle(node).visible_type(simple).resolved();
        if visible != Some(name) {
            return false;
        }

        let span = cx.span(node);
        let builder = match diamond {
            Some(diamond) => {
                let args = cx.list(node).to_vec();
                let args: Vec<_> = args.into_iter().map(|arg| cx.clone_subtree(arg)).collect();
                NodeBuilder::new(NodeKind::ClassType {
                    name: simple,
                    diamond,
                })
                .items(args)
            }
            None => NodeBuilder::new(NodeKind::TypeName { name: simple }),
        };
        let short = cx.create(builder.span(span));
        cx.replace(node, short)
    }
}
