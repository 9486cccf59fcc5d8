use serde::Serialize;

use crate::{
    diff::{DiffEntry, DiffOp, DiffSource},
    errors::{Result, ShapeError},
    patch::patch_string,
};

/// A line/column location in a text. Columns count characters.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    #[must_use]
    pub fn new(line: usize, ch: usize) -> Self { Self { line, ch } }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    /// Text present in the edited version only
    Addition,
    /// Text present in the original version only
    Deletion,
}

/// A changed stretch of text. Additions are positioned in the edited text,
/// deletions in the original one.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DiffRange {
    pub from: Position,
    pub to: Position,
    pub kind: RangeKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DiffSource>,
}

impl DiffRange {
    #[must_use]
    pub fn new(from: Position, to: Position, kind: RangeKind) -> Self {
        Self {
            from,
            to,
            kind,
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(self, source: Option<DiffSource>) -> Self { Self { source, ..self } }

    /// The half-open range of lines the range touches. A range covering
    /// whole lines, from a line start to a later line start, doesn't touch
    /// the line it ends on.
    #[must_use]
    pub fn line_span(&self) -> (usize, usize) {
        let whole_lines = self.from.ch == 0 && self.to.ch == 0 && self.to.line > self.from.line;
        let end = if whole_lines {
            self.to.line
        } else {
            self.to.line + 1
        };

        (self.from.line, end)
    }

    /// Number of line breaks inside the range, by which it shifts the lines
    /// that follow it.
    #[must_use]
    pub fn net_lines(&self) -> usize { self.to.line - self.from.line }
}

/// Maps character offsets of a text to line/column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.chars()
                    .enumerate()
                    .filter(|(_, c)| *c == '\n')
                    .map(|(index, _)| index + 1),
            )
            .collect();

        Self { line_starts }
    }

    /// Position of the character at `offset`. Offsets past the end are
    /// placed on the last line.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);

        Position::new(line, offset - self.line_starts[line])
    }

    #[must_use]
    pub fn line_count(&self) -> usize { self.line_starts.len() }
}

/// Converts a string diff into positioned ranges, in the order they appear
/// in the text.
///
/// Deletions are positioned in `base`, additions in the patched text. Each
/// range keeps the provenance label of the entry it came from.
///
/// # Errors
///
/// Fails if the diff can't be applied to `base`.
pub fn string_diff_ranges(base: &str, diff: &[DiffEntry]) -> Result<Vec<DiffRange>> {
    let patched = patch_string(base, diff)?;
    let original_lines = LineIndex::new(base);
    let edited_lines = LineIndex::new(&patched);

    let mut ranges = Vec::with_capacity(diff.len());
    let mut inserted = 0;
    let mut removed = 0;

    for entry in diff {
        let index = entry.key.as_index().unwrap_or_default();

        let range = match &entry.op {
            DiffOp::AddRange { value_list } => {
                let start = index + inserted - removed;
                inserted += value_list.len();

                DiffRange::new(
                    edited_lines.position(start),
                    edited_lines.position(start + value_list.len()),
                    RangeKind::Addition,
                )
            }
            DiffOp::RemoveRange { length } => {
                removed += length;

                DiffRange::new(
                    original_lines.position(index),
                    original_lines.position(index + length),
                    RangeKind::Deletion,
                )
            }
            DiffOp::Add { .. } | DiffOp::Remove | DiffOp::Replace { .. } | DiffOp::Patch { .. } => {
                return Err(ShapeError::InvalidOperation {
                    op: entry.op.name(),
                    target: "a string",
                }
                .into());
            }
        };

        ranges.push(range.with_source(entry.source));
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::diff::{SourceSide, label_source, op_add_range, op_remove_range};

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("ab\nc\n\nd");

        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(0), Position::new(0, 0));
        assert_eq!(index.position(2), Position::new(0, 2));
        assert_eq!(index.position(3), Position::new(1, 0));
        assert_eq!(index.position(6), Position::new(3, 0));
        assert_eq!(index.position(7), Position::new(3, 1));
    }

    #[test_case(Position::new(2, 0), Position::new(4, 0), (2, 4); "whole lines")]
    #[test_case(Position::new(2, 1), Position::new(2, 3), (2, 3); "inside a line")]
    #[test_case(Position::new(2, 1), Position::new(3, 0), (2, 4); "to a line start")]
    #[test_case(Position::new(2, 0), Position::new(2, 0), (2, 3); "empty")]
    fn test_line_span(from: Position, to: Position, expected: (usize, usize)) {
        assert_eq!(DiffRange::new(from, to, RangeKind::Addition).line_span(), expected);
    }

    #[test]
    fn test_string_diff_ranges() {
        let base = "one\ntwo\nthree\n";
        let diff = label_source(
            &[
                op_add_range(0, "zero\n"),
                op_remove_range(4, 4),
                op_add_range(14, "four\nfive\n"),
            ],
            DiffSource::new(1, SourceSide::Local),
        );

        let ranges = string_diff_ranges(base, &diff).unwrap();

        assert_eq!(
            ranges,
            vec![
                DiffRange::new(Position::new(0, 0), Position::new(1, 0), RangeKind::Addition),
                DiffRange::new(Position::new(1, 0), Position::new(2, 0), RangeKind::Deletion),
                DiffRange::new(Position::new(3, 0), Position::new(5, 0), RangeKind::Addition),
            ]
        );
        assert!(
            ranges
                .iter()
                .all(|range| range.source == Some(DiffSource::new(1, SourceSide::Local)))
        );
    }

    #[test]
    fn test_string_diff_ranges_of_character_items() {
        let diff = vec![op_add_range(0, vec![json!("x"), json!("\n"), json!("y"), json!("\n")])];

        assert_eq!(
            string_diff_ranges("ab\n", &diff).unwrap(),
            vec![DiffRange::new(Position::new(0, 0), Position::new(2, 0), RangeKind::Addition)]
        );
    }

    #[test]
    fn test_string_diff_ranges_rejects_invalid_diff() {
        assert!(string_diff_ranges("ab", &[op_remove_range(1, 5)]).is_err());
        assert!(string_diff_ranges("ab\n", &[op_add_range(0, vec![json!("x\ny\n")])]).is_err());
    }
}
