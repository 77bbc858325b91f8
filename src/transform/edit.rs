//! Byte-range edits and their application.

use std::ops::Range;

/// Replace `range` of the input with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range, String::new())
    }
}

/// Output of a source-to-source transform.
///
/// `edits` are in input coordinates, sorted and non-overlapping.
/// `skipped` holds the byte offsets of candidate calls that were left
/// untouched (inline compile calls with a non-literal argument).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub output: String,
    pub edits: Vec<Edit>,
    pub skipped: Vec<usize>,
}

impl TransformResult {
    /// Result that leaves the input untouched.
    pub fn unchanged(source: &str) -> Self {
        Self {
            output: source.to_string(),
            edits: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Apply `edits` to `source`.
    pub fn from_edits(source: &str, edits: Vec<Edit>, skipped: Vec<usize>) -> Self {
        Self {
            output: apply_edits(source, &edits),
            edits,
            skipped,
        }
    }

    #[inline]
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Apply sorted, non-overlapping edits left to right in a single pass.
///
/// Each edit is spliced relative to the untouched input, so earlier edits
/// never shift the offsets of later ones.
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    debug_assert!(
        edits.windows(2).all(|w| w[0].range.end <= w[1].range.start),
        "edits must be sorted and non-overlapping"
    );

    let grown: usize = edits.iter().map(|e| e.replacement.len()).sum();
    let mut out = String::with_capacity(source.len() + grown);
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_no_edits() {
        assert_eq!(apply_edits("abc", &[]), "abc");
    }

    #[test]
    fn test_apply_multiple_edits() {
        let source = "one two three";
        let edits = vec![Edit::new(0..3, "1"), Edit::delete(3..7), Edit::new(8..13, "3!")];
        assert_eq!(apply_edits(source, &edits), "1 3!");
    }

    #[test]
    fn test_apply_adjacent_edits() {
        let edits = vec![Edit::new(0..1, "x"), Edit::new(1..2, "y")];
        assert_eq!(apply_edits("ab", &edits), "xy");
    }

    #[test]
    fn test_from_edits_records_edits() {
        let result = TransformResult::from_edits("a(b)c", vec![Edit::delete(1..4)], vec![]);
        assert_eq!(result.output, "ac");
        assert!(!result.is_unchanged());
        assert!(TransformResult::unchanged("a").is_unchanged());
    }
}
