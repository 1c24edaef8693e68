//! `String` API rules.

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{LanguageLevel, LiteralKind, NodeBuilder, NodeKind, NodeRef, Symbol};

use crate::patterns::{
    call, call_on_copy, emptiness_test, is_string, literal, not, replace_expr, static_type,
    string_literal, strip_parens,
};

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("StringIsEmpty")
                .min_level(LanguageLevel::V6)
                .tag("String")
                .describe("Test strings for emptiness with `isEmpty()`"),
            StringIsEmpty,
        )
        .rule(
            RuleDescriptor::new("StringToString")
                .external("PMD", "StringToString")
                .tag("String")
                .describe("Drop `toString()` calls on strings"),
            StringToString,
        )
        .rule(
            RuleDescriptor::new("StringIndexOfChar")
                .external("PMD", "UseIndexOfChar")
                .tag("String")
                .describe("Search for a single character with a char literal"),
            StringIndexOfChar,
        )
        .rule(
            RuleDescriptor::new("StringReplaceAllLiteral")
                .external("Sonar", "S5361")
                .tag("String")
                .describe("Use `replace` when `replaceAll` is given no regular expression"),
            StringReplaceAllLiteral,
        )
        .rule(
            RuleDescriptor::new("StringFromString")
                .external("PMD", "StringInstantiation")
                .tag("String")
                .describe("Use string literals instead of copying them with `new String`"),
            StringFromString,
        )
}

/// `s.length() == 0` -> `s.isEmpty()`, `s.length() > 0` -> `!s.isEmpty()`
struct StringIsEmpty;

impl Mutator for StringIsEmpty {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let Some((receiver, empty)) = emptiness_test(cx.tree(), node, "length") else {
            return false;
        };
        if !is_string(cx, receiver) {
            return false;
        }
        let mut test = call_on_copy(cx, receiver, "isEmpty");
        if !empty {
            test = not(cx, test);
        }
        replace_expr(cx, node, test)
    }
}

/// `s.toString()` -> `s`
struct StringToString;

impl Mutator for StringToString {
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
        is_string(cx, receiver) && replace_expr(cx, node, receiver)
    }
}

/// `s.indexOf("a")` -> `s.indexOf('a')`
struct StringIndexOfChar;

impl Mutator for StringIndexOfChar {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let Some(call) = call(tree, node) else {
            return false;
        };
        let searches = call.name == "indexOf" || call.name == "lastIndexOf";
        if !searches || !(1..=2).contains(&call.args.len()) {
            return false;
        }
        let (Some(receiver), needle) = (call.receiver, call.args[0]) else {
            return false;
        };
        let Some(text) = string_literal(tree, needle) else {
            return false;
        };
        // A char literal holds one UTF-16 unit, not a surrogate pair.
        let single_unit = text.with_str(|s| {
            let mut chars = s.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.len_utf16() == 1)
        });
        if !single_unit || !is_string(cx, receiver) {
            return false;
        }

        let span = cx.span(needle);
        let ch = cx.create(literal(LiteralKind::Char, text).span(span));
        cx.replace(needle, ch)
    }
}

/// Characters with a special meaning in a regular expression.
const REGEX_META: &[char] = &[
    '\\', '^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}',
];

/// `s.replaceAll("a", "b")` -> `s.replace("a", "b")` when nothing is a pattern.
struct StringReplaceAllLiteral;

impl Mutator for StringReplaceAllLiteral {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let tree = cx.tree();
        let Some(call) = call(tree, node) else {
            return false;
        };
        let Some(receiver) = call.receiver.filter(|_| call.is("replaceAll", 2)) else {
            return false;
        };
        let (Some(pattern), Some(replacement)) = (
            string_literal(tree, strip_parens(tree, call.args[0])),
            string_literal(tree, strip_parens(tree, call.args[1])),
        ) else {
            return false;
        };
        let plain_pattern = pattern.with_str(|s| !s.is_empty() && !s.contains(REGEX_META));
        let plain_replacement = replacement.with_str(|s| !s.contains(['$', '\\']));
        if !plain_pattern || !plain_replacement || !is_string(cx, receiver) {
            return false;
        }

        let span = cx.span(node);
        let receiver = cx.clone_subtree(receiver);
        let args = [cx.clone_subtree(call.args[0]), cx.clone_subtree(call.args[1])];
        let replace = cx.create(
            NodeBuilder::new(NodeKind::MethodCall {
                name: Symbol::new("replace"),
            })
            .slot(receiver)
            .items(args)
            .span(span),
        );
        cx.replace(node, replace)
    }
}

/// `new String("lit")` -> `"lit"`
struct StringFromString;

impl Mutator for StringFromString {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        if !matches!(cx.kind(node), NodeKind::New) {
            return false;
        }
        let [argument] = *cx.list(node) else {
            return false;
        };
        let argument = strip_parens(cx.tree(), argument);
        if string_literal(cx.tree(), argument).is_none() {
            return false;
        }
        let creates_string = static_type(cx, node).is_some_and(|ty| ty.is_string());
        creates_string && replace_expr(cx, node, argument)
    }
}
