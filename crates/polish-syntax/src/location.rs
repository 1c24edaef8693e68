//! Byte ranges of nodes in the original source.

use serde::{Deserialize, Serialize};

/// Half-open byte range `start..end` in the source text.
///
/// Nodes synthesized by rules carry the span of the node they replace, so
/// diagnostics keep pointing at the original source region.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_spans() {
        assert_eq!(Span::new(4, 8).cover(Span::new(2, 5)), Span::new(2, 8));
        assert!(Span::default().is_empty());
    }
}
