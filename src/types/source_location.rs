use alloc::sync::Arc;
use core::fmt::Debug;

use crate::types::ErrorLocationProvider;

/// A span of markup source text.
///
/// Every tag, attribute and text run produced by the lexer carries one of
/// these so that parse, schema and resolution errors can point at the
/// offending text. The input is shared through an [`Arc`] so that cloning a
/// location is cheap and locations from the same document can be merged.
///
/// # Cross-references
///
/// - Used in [`TemplateError`](crate::types::TemplateError) for error
///   location reporting.
/// - Integrated with [`ErrorLocationProvider`] for consistent error handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    /// Reference-counted markup that was processed.
    pub input: Arc<str>,

    /// Zero-based inclusive start byte offset in the input string.
    pub start: usize,

    /// Zero-based exclusive end byte offset in the input string.
    pub end: usize,
}

impl SourceLocation {
    /// Creates a new `SourceLocation` with the given input string and byte
    /// range.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tagtree::types::SourceLocation;
    ///
    /// let input: Arc<str> = Arc::from("<c:If the=\"{x}\"/>");
    /// let loc = SourceLocation::new(input, 0, 5);
    /// assert_eq!(loc.text(), "<c:If");
    /// ```
    #[must_use]
    pub const fn new(input: Arc<str>, start: usize, end: usize) -> Self {
        Self { input, start, end }
    }

    /// Creates a new `SourceLocation` from a string slice and byte range.
    #[must_use]
    pub fn from_str(input: &str, start: usize, end: usize) -> Self {
        Self::new(Arc::from(input), start, end)
    }

    /// Returns the start offset of this source location.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Returns the end offset of this source location.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Returns the full input string this location points into.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the covered slice of the input.
    #[must_use]
    pub fn text(&self) -> &str {
        self.input.get(self.start..self.end).unwrap_or_default()
    }

    /// One-based line and column of the start offset.
    ///
    /// Columns count characters, not bytes.
    #[must_use]
    pub fn line_and_column(&self) -> (usize, usize) {
        let before = self.input.get(..self.start).unwrap_or_default();
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before, |idx| &before[idx + 1..])
            .chars()
            .count()
            + 1;
        (line, column)
    }

    /// Merges two `SourceLocation`s into a single range.
    ///
    /// If either location is `None`, the other is returned. Locations over
    /// different inputs cannot be merged and yield `None`.
    #[must_use]
    pub fn range(first: Option<Self>, second: Option<Self>) -> Option<Self> {
        match (first, second) {
            (Some(fp), None) => Some(fp),
            (None, Some(sp)) => Some(sp),
            (Some(fp), Some(sp)) => {
                if !Arc::ptr_eq(&fp.input, &sp.input) {
                    return None;
                }
                Some(Self {
                    input: Arc::clone(&fp.input),
                    start: fp.start,
                    end: sp.end,
                })
            }
            _ => None,
        }
    }
}

impl ErrorLocationProvider for SourceLocation {
    fn loc(&self) -> Option<&SourceLocation> {
        Some(self)
    }
}

impl ErrorLocationProvider for Option<SourceLocation> {
    fn loc(&self) -> Option<&SourceLocation> {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_creation() {
        let input = Arc::from("<c:For each=\"{rows}\">");
        let loc = SourceLocation::new(Arc::clone(&input), 7, 11);

        assert_eq!(loc.start(), 7);
        assert_eq!(loc.end(), 11);
        assert_eq!(loc.text(), "each");
    }

    #[test]
    fn test_line_and_column() {
        let loc = SourceLocation::from_str("ab\ncd\nef<c:X>", 8, 13);
        assert_eq!(loc.line_and_column(), (3, 3));

        let first = SourceLocation::from_str("hello", 0, 1);
        assert_eq!(first.line_and_column(), (1, 1));
    }

    #[test]
    fn test_range_method() {
        let input = Arc::from("test input");

        let loc1 = SourceLocation::new(Arc::clone(&input), 0, 4);
        let result = SourceLocation::range(Some(loc1.clone()), None);
        assert_eq!(result.as_ref().unwrap().end(), 4);

        let loc2 = SourceLocation::new(Arc::clone(&input), 5, 10);
        let result = SourceLocation::range(Some(loc1.clone()), Some(loc2));
        assert_eq!(result.as_ref().unwrap().text(), "test input");

        let other = SourceLocation::from_str("test input", 5, 10);
        assert!(SourceLocation::range(Some(loc1), Some(other)).is_none());
    }
}
