use serde::Serialize;

use crate::diff::{Diff, DiffEntry, DiffOp};

/// Which side of a merge decision a diff entry was taken from.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceSide {
    Local,
    Remote,
    Either,
    Custom,
}

/// Provenance of a diff entry: the index of the decision it came from in its
/// decision list, and the side of that decision. Only used for labelling.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiffSource {
    pub decision: usize,
    pub side: SourceSide,
}

impl DiffSource {
    #[must_use]
    pub fn new(decision: usize, side: SourceSide) -> Self { Self { decision, side } }
}

/// Returns a copy of `diff` where every entry, including the ones nested in
/// patches, carries `source`.
#[must_use]
pub fn label_source(diff: &[DiffEntry], source: DiffSource) -> Diff {
    diff.iter()
        .map(|entry| {
            let op = match &entry.op {
                DiffOp::Patch { diff: Some(inner) } => DiffOp::Patch {
                    diff: Some(label_source(inner, source)),
                },
                op => op.clone(),
            };

            DiffEntry {
                key: entry.key.clone(),
                op,
                source: Some(source),
            }
        })
        .collect()
}
