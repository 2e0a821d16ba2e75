//! Source ranges for diagnostics.

use std::fmt;

/// Character range of an AST node in the expression source.
///
/// # Examples
///
/// ```
/// use core_types::SourceSpan;
///
/// let span = SourceSpan::new(2, 5);
/// assert_eq!(span.len(), 3);
/// assert_eq!(span.to_string(), "pos 2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceSpan {
    /// Start offset, inclusive
    pub start: usize,
    /// End offset, exclusive
    pub end: usize,
}

impl SourceSpan {
    /// Create a span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering both spans
    pub fn merge(self, other: SourceSpan) -> SourceSpan {
        SourceSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true for an empty span
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos {}", self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let merged = SourceSpan::new(4, 6).merge(SourceSpan::new(0, 2));
        assert_eq!(merged, SourceSpan::new(0, 6));
    }
}
