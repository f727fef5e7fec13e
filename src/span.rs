/// Span tracking for positions in description markup
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Represents a span in the markup (character offsets, as ariadne expects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Create a span that covers from the start of one span to the end of another
    pub fn merge(start: Span, end: Span) -> Self {
        Span {
            start: start.start,
            end: end.end,
        }
    }

    /// Shift a span measured inside an attribute value to document offsets
    pub fn offset(self, by: usize) -> Self {
        Span {
            start: self.start + by,
            end: self.end + by,
        }
    }

    /// Convert to a Range for use with ariadne
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Span for nodes created by edits rather than parsed from markup
    pub fn dummy() -> Self {
        Span { start: 0, end: 0 }
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span {
            start: range.start,
            end: range.end,
        }
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_offset() {
        let merged = Span::merge(Span::new(2, 4), Span::new(7, 9));
        assert_eq!(merged, Span::new(2, 9));
        assert_eq!(merged.offset(10).range(), 12..19);
        assert_eq!(merged.len(), 7);
        assert!(Span::dummy().is_empty());
    }
}
