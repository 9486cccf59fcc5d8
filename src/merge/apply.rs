use std::{collections::BTreeMap, ops::Bound};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{
    diff::{
        Diff, DiffEntry, DiffOp, Key, combine_patches, op_add_range, op_remove, op_remove_range,
        op_replace, path_to_string,
    },
    errors::{Error, Result, ShapeError, ValidationError},
    merge::{Action, MergeDecision, unresolved_conflicts},
    patch::{kind_of, patch, value_at_path, value_at_path_mut},
};

/// Turns a decision into the concrete diff its action selects.
///
/// `current` is the value located at the decision's `common_path`; it is only
/// inspected by the `clear` and `clear_parent` actions, which need to know
/// the shape of what they empty.
///
/// # Errors
///
/// `clear` fails when the decision's diffs don't agree on a single target
/// key, or when that key doesn't fit `current`. Both clearing actions fail on
/// atomic values.
pub fn resolve_action(current: &Value, decision: &MergeDecision) -> Result<Diff> {
    let concat = |first: &[DiffEntry], second: &[DiffEntry]| [first, second].concat();

    match decision.action {
        Action::Base => Ok(Diff::new()),
        Action::Local | Action::Either => Ok(decision.local().to_vec()),
        Action::Remote => Ok(decision.remote().to_vec()),
        Action::Custom => Ok(decision.custom().to_vec()),
        Action::LocalThenRemote => Ok(concat(decision.local(), decision.remote())),
        Action::RemoteThenLocal => Ok(concat(decision.remote(), decision.local())),
        Action::Clear => clear_key(current, &clear_target(decision)?),
        Action::ClearParent => clear_all(current),
    }
}

/// Applies every decision to a copy of `base` and returns the merged value.
///
/// Decisions are visited in the given order. Runs of consecutive decisions
/// sharing a `common_path` are resolved against the same snapshot of the
/// value at that path, then applied together as a single patch. If one of
/// them is a `clear_parent`, it replaces the whole run.
///
/// Conflicts are left untouched; use
/// [`unresolved_conflicts`](crate::unresolved_conflicts) to query them.
///
/// # Errors
///
/// Fails on the first decision whose path doesn't exist or whose diff doesn't
/// fit the value it is applied to. Nothing is returned in that case.
pub fn apply_decisions(base: &Value, decisions: &[MergeDecision]) -> Result<Value> {
    debug!(count = decisions.len(), "applying merge decisions");

    let mut merged = base.clone();

    for group in decisions.chunk_by(|a, b| a.common_path == b.common_path) {
        let path = &group[0].common_path;
        let diff = resolve_group(value_at_path(&merged, path)?, group.iter())?;

        if diff.is_empty() {
            continue;
        }

        trace!(path = %path_to_string(path), entries = diff.len(), "patching decision group");
        let target = value_at_path_mut(&mut merged, path)?;
        *target = patch(target, Some(&diff))?;
    }

    let conflicts = unresolved_conflicts(decisions).len();
    if conflicts > 0 {
        warn!(conflicts, "merged with unresolved conflicts");
    }

    Ok(merged)
}

/// Resolves decisions located at the same path into one diff.
pub(crate) fn resolve_group<'a>(
    current: &Value,
    decisions: impl IntoIterator<Item = &'a MergeDecision>,
) -> Result<Diff> {
    let decisions: Vec<&MergeDecision> = decisions.into_iter().collect();

    if let Some(clearing) = decisions
        .iter()
        .find(|decision| decision.action == Action::ClearParent)
    {
        if decisions.len() > 1 {
            warn!(
                path = %path_to_string(&clearing.common_path),
                discarded = decisions.len() - 1,
                "clear_parent discards the other decisions at its path"
            );
        }

        return resolve_action(current, clearing);
    }

    let mut diffs = Vec::with_capacity(decisions.len());
    for decision in &decisions {
        diffs.push(resolve_action(current, decision)?);
    }

    check_compatible(&decisions, &diffs)?;

    Ok(combine_patches(diffs.concat()))
}

/// Fails if an entry resolved from one decision removes or replaces a value
/// that another decision patches or replaces.
fn check_compatible(decisions: &[&MergeDecision], diffs: &[Diff]) -> Result<()> {
    let mut targets: BTreeMap<&Key, Vec<(usize, &'static str)>> = BTreeMap::new();
    for (owner, diff) in diffs.iter().enumerate() {
        for entry in diff {
            if matches!(entry.op, DiffOp::Patch { .. } | DiffOp::Replace { .. }) {
                targets
                    .entry(&entry.key)
                    .or_default()
                    .push((owner, entry.op.name()));
            }
        }
    }

    for (owner, diff) in diffs.iter().enumerate() {
        for entry in diff {
            let bounds = match (&entry.op, &entry.key) {
                (DiffOp::Remove | DiffOp::Replace { .. }, key) => {
                    (Bound::Included(key.clone()), Bound::Included(key.clone()))
                }
                (DiffOp::RemoveRange { length }, Key::Index(start)) => (
                    Bound::Included(Key::Index(*start)),
                    Bound::Excluded(Key::Index(start.saturating_add(*length))),
                ),
                _ => continue,
            };

            let clash = targets.range::<Key, _>(bounds).find_map(|(key, entries)| {
                entries
                    .iter()
                    .find(|(other, _)| *other != owner)
                    .map(|(_, op)| (*key, *op))
            });

            if let Some((key, op)) = clash {
                return Err(ShapeError::IncompatibleDecisions {
                    path: path_to_string(&decisions[owner].common_path),
                    reason: format!(
                        "`{}` at {} discards the `{op}` at {key} of another decision",
                        entry.op.name(),
                        entry.key
                    ),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// The one key shared by every entry of the local and remote diffs.
fn clear_target(decision: &MergeDecision) -> Result<Key> {
    let mut keys = decision
        .local()
        .iter()
        .chain(decision.remote())
        .map(|entry| &entry.key);

    let first = keys.next().ok_or(ValidationError::EmptyClearTarget)?;

    if let Some(second) = keys.find(|key| *key != first) {
        return Err(ValidationError::AmbiguousClearKey {
            first: first.to_string(),
            second: second.to_string(),
        }
        .into());
    }

    Ok(first.clone())
}

fn clear_key(current: &Value, key: &Key) -> Result<Diff> {
    match (current, key) {
        (Value::Object(object), Key::Name(name)) => Ok(object
            .get(name)
            .map(|value| vec![op_replace(name.as_str(), empty_like(value))])
            .unwrap_or_default()),
        (Value::Array(items), Key::Index(index)) => {
            let item = items.get(*index).ok_or(ValidationError::IndexOutOfBounds {
                index: *index,
                length: items.len(),
            })?;

            Ok(vec![
                op_add_range(*index, vec![empty_like(item)]),
                op_remove_range(*index, 1),
            ])
        }
        (Value::String(text), Key::Index(index)) => {
            let length = text.chars().count();
            if *index >= length {
                return Err(ValidationError::IndexOutOfBounds {
                    index: *index,
                    length,
                }
                .into());
            }

            Ok(vec![op_remove_range(*index, 1)])
        }
        (Value::Object(_), Key::Index(_)) => Err(wrong_key(key, "an object", "a string")),
        (Value::Array(_) | Value::String(_), Key::Name(_)) => {
            Err(wrong_key(key, "a sequence", "an integer"))
        }
        (Value::Null | Value::Bool(_) | Value::Number(_), _) => {
            Err(ShapeError::UnpatchableValue {
                kind: kind_of(current),
            }
            .into())
        }
    }
}

fn clear_all(current: &Value) -> Result<Diff> {
    match current {
        Value::Object(object) => Ok(object.keys().map(|key| op_remove(key.as_str())).collect()),
        Value::Array(items) if items.is_empty() => Ok(Diff::new()),
        Value::Array(items) => Ok(vec![op_remove_range(0, items.len())]),
        Value::String(text) if text.is_empty() => Ok(Diff::new()),
        Value::String(text) => Ok(vec![op_remove_range(0, text.chars().count())]),
        Value::Null | Value::Bool(_) | Value::Number(_) => Err(ShapeError::UnpatchableValue {
            kind: kind_of(current),
        }
        .into()),
    }
}

fn wrong_key(key: &Key, target: &'static str, expected: &'static str) -> Error {
    ValidationError::WrongKeyKind {
        op: "clear",
        target,
        expected,
        key: key.to_string(),
    }
    .into()
}

/// An empty value of the same shape, or `null` for atomics.
fn empty_like(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(Vec::new()),
        Value::Object(_) => Value::Object(serde_json::Map::new()),
        Value::String(_) => Value::String(String::new()),
        Value::Null | Value::Bool(_) | Value::Number(_) => Value::Null,
    }
}
