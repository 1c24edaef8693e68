//! Numeric literal spelling.

use polish_engine::{CatalogBuilder, Granularity, Mutator, RewriteContext, RuleDescriptor};
use polish_syntax::{LanguageLevel, LiteralKind, NodeKind, NodeRef, Symbol};

use crate::patterns::literal;

pub(crate) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    builder
        .rule(
            RuleDescriptor::new("LongLiteralSuffix")
                .external("Sonar", "S818")
                .tag("Literal")
                .describe("Write the `long` suffix as an upper-case `L`"),
            LongLiteralSuffix,
        )
        .rule(
            RuleDescriptor::new("NumericLiteralUnderscores")
                .external("PMD", "UseUnderscoresInNumericLiterals")
                .min_level(LanguageLevel::V7)
                .draft()
                .tag("Literal")
                .describe("Group the digits of long decimal literals with underscores"),
            NumericLiteralUnderscores,
        )
}

/// Digits from which a decimal literal gets grouped.
const GROUPING_THRESHOLD: usize = 5;

fn replace_text(cx: &mut RewriteContext<'_>, node: NodeRef, kind: LiteralKind, text: String) -> bool {
    let span = cx.span(node);
    let replacement = cx.create(literal(kind, Symbol::from(text)).span(span));
    cx.replace(node, replacement)
}

/// `10l` -> `10L`
struct LongLiteralSuffix;

impl Mutator for LongLiteralSuffix {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let NodeKind::Literal {
            literal: LiteralKind::Long,
            text,
        } = *cx.kind(node)
        else {
            return false;
        };
        let Some(digits) = text.with_str(|s| s.strip_suffix('l').map(str::to_owned)) else {
            return false;
        };
        replace_text(cx, node, LiteralKind::Long, format!("{digits}L"))
    }
}

/// `1000000` -> `1_000_000`
struct NumericLiteralUnderscores;

impl Mutator for NumericLiteralUnderscores {
    fn granularity(&self) -> Granularity {
        Granularity::Expression
    }

    fn mutate(&self, cx: &mut RewriteContext<'_>, node: NodeRef) -> bool {
        let NodeKind::Literal { literal, text } = *cx.kind(node) else {
            return false;
        };
        if !matches!(literal, LiteralKind::Int | LiteralKind::Long) {
            return false;
        }
        let Some(grouped) = text.with_str(group_digits) else {
            return false;
        };
        replace_text(cx, node, literal, grouped)
    }
}

/// Group a plain decimal literal in threes from the right.
///
/// Hex, octal, binary and already grouped literals are left alone.
fn group_digits(text: &str) -> Option<String> {
    let split = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let (digits, suffix) = text.split_at(split);
    if !matches!(suffix, "" | "l" | "L")
        || digits.len() < GROUPING_THRESHOLD
        || digits.starts_with('0')
    {
        return None;
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + suffix.len());
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('_');
        }
        grouped.push(digit);
    }
    grouped.push_str(suffix);
    Some(grouped)
}

#[cfg(test)]
mod tests {
    use super::group_digits;
    use crate::testing::check_expr;
    use insta::assert_snapshot;

    #[test]
    fn long_suffix() {
        assert_snapshot!(check_expr(&["LongLiteralSuffix"], "", "f(10l, 20L)"), @"f(10L, 20L)");
    }

    #[test]
    fn digit_grouping() {
        assert_eq!(group_digits("1000000").as_deref(), Some("1_000_000"));
        assert_eq!(group_digits("12345L").as_deref(), Some("12_345L"));
        assert_eq!(group_digits("9999"), None);
        assert_eq!(group_digits("1_000_000"), None);
        assert_eq!(group_digits("0x7FFFFFFF"), None);
        assert_eq!(group_digits("017777"), None);
    }

    #[test]
    fn underscores_rule_is_a_draft_but_selectable() {
        assert_snapshot!(
            check_expr(&["NumericLiteralUnderscores"], "", "f(86400000L, 1000)"),
            @"f(86_400_000L, 1000)"
        );
    }
}
