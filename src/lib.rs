//! Structural diff, patch and three-way merge of notebook-like documents.
//!
//! Documents are `serde_json` values: trees of objects, sequences and
//! strings. A [`Diff`] describes the changes between two versions of such a
//! tree, [`patch`] applies it, and a list of [`MergeDecision`]s describes how
//! the changes of two versions made from a common base are combined.
//!
//! ```
//! use reconcile_notebook::{Action, MergeDecision, apply_decisions, op_replace};
//! use serde_json::json;
//!
//! let base = json!({"x": {"y": 0}});
//! let decisions = vec![
//!     MergeDecision::new(
//!         vec!["x".into()],
//!         Some(vec![op_replace("y", json!(1))]),
//!         Some(vec![op_replace("y", json!(2))]),
//!         Action::Remote,
//!     )
//!     .with_conflict(true),
//! ];
//!
//! assert_eq!(apply_decisions(&base, &decisions).unwrap(), json!({"x": {"y": 2}}));
//! ```

mod chunk;
mod diff;
mod errors;
mod merge;
mod patch;
mod utils;

pub use chunk::{
    Chunk, Chunker, ChunkerConfig, DiffRange, Granularity, LineIndex, Position, RangeKind, chunk,
    chunk_with_config, string_diff_ranges,
};
pub use diff::{
    Diff, DiffEntry, DiffOp, DiffSource, Key, MissingPayloadError, SourceSide, ValueList,
    combine_patches, label_source, op_add, op_add_range, op_patch, op_remove, op_remove_range,
    op_replace, path_to_string, validate_object_diff, validate_sequence_diff,
};
pub use errors::{Error, Result, ShapeError, ValidationError};
pub use merge::{
    Action, DecisionPath, MergeDecision, PoppedPath, apply_decisions, build_diffs,
    compress_common_path, expand_path, filter_decisions, pop_path, resolve_action,
    resolve_common_paths, split_decision_on_chunks, unresolved_conflicts,
};
pub use patch::{patch, patch_object, patch_sequence, patch_string, value_at_path};
pub use utils::side::Side;

#[cfg(feature = "wasm")]
pub mod wasm;
