use serde::{Deserialize, Serialize};

use crate::{
    diff::{Diff, DiffEntry, Key, path_to_string},
    errors::{Result, ValidationError},
    merge::common_path::expand_path,
};

/// Location of a decision relative to the document root.
pub type DecisionPath = Vec<Key>;

/// How a merge decision is resolved into a concrete diff.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Keep the base version
    #[default]
    Base,
    Local,
    Remote,
    /// Both sides made the same change, take either
    Either,
    Custom,
    /// Apply both sides, local first. Used for simultaneous insertions at
    /// the same position.
    LocalThenRemote,
    RemoteThenLocal,
    /// Replace the changed member with an empty value of the same shape
    Clear,
    /// Empty the whole collection at the decision's path. Overrides every
    /// other decision sharing the same path.
    ClearParent,
}

/// The three-way merge state of one sub-tree of the document: what each side
/// changed relative to the base, which action resolves the changes, and
/// whether they conflict.
///
/// The diffs are relative to the value at `common_path`. A decision stays a
/// conflict after it has been applied; `conflict` is only ever cleared by
/// whoever resolves it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MergeDecision {
    #[serde(default)]
    pub common_path: DecisionPath,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_diff: Option<Diff>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_diff: Option<Diff>,

    #[serde(default)]
    pub action: Action,

    #[serde(default)]
    pub conflict: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_diff: Option<Diff>,
}

impl MergeDecision {
    #[must_use]
    pub fn new(
        common_path: DecisionPath,
        local_diff: Option<Diff>,
        remote_diff: Option<Diff>,
        action: Action,
    ) -> Self {
        Self {
            common_path,
            local_diff,
            remote_diff,
            action,
            conflict: false,
            custom_diff: None,
        }
    }

    #[must_use]
    pub fn with_conflict(self, conflict: bool) -> Self { Self { conflict, ..self } }

    #[must_use]
    pub fn with_custom_diff(self, custom_diff: Diff) -> Self {
        Self {
            custom_diff: Some(custom_diff),
            ..self
        }
    }

    #[must_use]
    pub fn local(&self) -> &[DiffEntry] { self.local_diff.as_deref().unwrap_or_default() }

    #[must_use]
    pub fn remote(&self) -> &[DiffEntry] { self.remote_diff.as_deref().unwrap_or_default() }

    #[must_use]
    pub fn custom(&self) -> &[DiffEntry] { self.custom_diff.as_deref().unwrap_or_default() }

    /// Moves the last `prefix.len()` segments of `common_path` back into the
    /// diffs as nested patches. This is the inverse of
    /// [`compress_common_path`](crate::compress_common_path).
    ///
    /// # Errors
    ///
    /// Fails with `ValidationError::PathNotFound` if `common_path` doesn't
    /// end with `prefix`.
    pub fn push_path(&self, prefix: &[Key]) -> Result<Self> {
        if !self.common_path.ends_with(prefix) {
            return Err(ValidationError::PathNotFound {
                path: path_to_string(prefix),
            }
            .into());
        }

        let wrap = |diff: &Option<Diff>| diff.clone().map(|diff| expand_path(diff, prefix));

        Ok(Self {
            common_path: self.common_path[..self.common_path.len() - prefix.len()].to_vec(),
            local_diff: wrap(&self.local_diff),
            remote_diff: wrap(&self.remote_diff),
            action: self.action,
            conflict: self.conflict,
            custom_diff: wrap(&self.custom_diff),
        })
    }
}

/// Selects the decisions located at or below `path`, comparing against each
/// decision's `common_path` with its first `skip_levels` segments removed.
#[must_use]
pub fn filter_decisions<'a>(
    path: &[Key],
    decisions: &'a [MergeDecision],
    skip_levels: usize,
) -> Vec<&'a MergeDecision> {
    decisions
        .iter()
        .filter(|decision| {
            decision
                .common_path
                .get(skip_levels..)
                .is_some_and(|rest| rest.starts_with(path))
        })
        .collect()
}

/// Indices of the decisions that are still marked as conflicts.
#[must_use]
pub fn unresolved_conflicts(decisions: &[MergeDecision]) -> Vec<usize> {
    decisions
        .iter()
        .enumerate()
        .filter_map(|(index, decision)| decision.conflict.then_some(index))
        .collect()
}
