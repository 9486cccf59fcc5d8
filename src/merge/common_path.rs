use tracing::{debug, trace};

use crate::{
    diff::{Diff, DiffOp, Key, op_patch},
    merge::MergeDecision,
};

/// Wraps `diff` into one single-entry `patch` per segment of `prefix`, so
/// that the result applies to the value `prefix` points into. An empty diff
/// stays empty.
#[must_use]
pub fn expand_path(diff: Diff, prefix: &[Key]) -> Diff {
    if diff.is_empty() {
        return diff;
    }

    prefix
        .iter()
        .rev()
        .fold(diff, |inner, key| vec![op_patch(key.clone(), inner)])
}

/// One step of path compression: the shared key and what remains of each
/// diff list below it.
#[derive(Debug, Clone, PartialEq)]
pub struct PoppedPath {
    pub key: Key,
    pub diffs: Vec<Option<Diff>>,
}

/// Strips a shared `patch` wrapper from a set of diff lists.
///
/// Succeeds when every non-empty list starts with a `patch` of the same key
/// whose nested diff is itself non-empty, and (unless `pop_inner` is set)
/// consists of that single entry. Empty and absent lists are passed through
/// untouched. With `pop_inner`, only the first entry's nested diff is kept
/// from longer lists.
#[must_use]
pub fn pop_path(diffs: &[Option<Diff>], pop_inner: bool) -> Option<PoppedPath> {
    let mut non_empty = diffs.iter().flatten().filter(|diff| !diff.is_empty());
    let key = non_empty.next()?.first()?.key.clone();

    for diff in diffs.iter().flatten().filter(|diff| !diff.is_empty()) {
        if !pop_inner && diff.len() != 1 {
            return None;
        }

        match diff.first() {
            Some(entry) if entry.key == key => match &entry.op {
                DiffOp::Patch { diff: Some(inner) } if !inner.is_empty() => {}
                _ => return None,
            },
            _ => return None,
        }
    }

    let diffs = diffs
        .iter()
        .map(|diff| match diff.as_deref() {
            Some([first, ..]) => match &first.op {
                DiffOp::Patch { diff } => diff.clone(),
                _ => None,
            },
            _ => diff.clone(),
        })
        .collect();

    Some(PoppedPath { key, diffs })
}

/// Moves the nested `patch` chain shared by all of a decision's diffs into
/// its `common_path`, for as long as the diffs agree.
///
/// The extracted prefix is `compressed.common_path[decision.common_path.len()..]`
/// and [`MergeDecision::push_path`] with it restores the original decision.
#[must_use]
pub fn compress_common_path(decision: MergeDecision) -> MergeDecision {
    let has_custom_diff = decision.custom_diff.is_some();
    let mut common_path = decision.common_path;
    let mut diffs = vec![decision.local_diff, decision.remote_diff];
    if has_custom_diff {
        diffs.push(decision.custom_diff);
    }

    while let Some(popped) = pop_path(&diffs, false) {
        trace!(key = %popped.key, "moving shared key into the common path");
        common_path.push(popped.key);
        diffs = popped.diffs;
    }

    let mut diffs = diffs.into_iter();
    MergeDecision {
        common_path,
        local_diff: diffs.next().flatten(),
        remote_diff: diffs.next().flatten(),
        custom_diff: diffs.next().flatten(),
        action: decision.action,
        conflict: decision.conflict,
    }
}

/// Compresses the common path of every decision in place. Meant to be run
/// once, right after loading decisions.
pub fn resolve_common_paths(decisions: &mut [MergeDecision]) {
    debug!(count = decisions.len(), "resolving common paths of decisions");

    for decision in decisions.iter_mut() {
        *decision = compress_common_path(std::mem::take(decision));
    }
}
