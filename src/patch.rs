mod sweep_builder;

use std::collections::HashSet;

use serde_json::{Map, Value};
use sweep_builder::SweepBuilder;

use crate::{
    diff::{
        DiffEntry, DiffOp, Key, ValueList, path_to_string, validate_object_diff,
        validate_sequence_diff,
    },
    errors::{Error, Result, ShapeError, ValidationError},
};

/// Applies `diff` to `base` and returns the patched value. `base` is never
/// modified; parts of it that the diff doesn't touch are deep-copied.
///
/// A `None` diff means "no change" and returns a copy of `base`. Objects,
/// sequences and strings can be patched; attempting to patch a number, a
/// boolean or `null` fails with a `ShapeError`. The whole diff is validated
/// against its target before anything is built, so an invalid entry aborts
/// the entire call.
///
/// ```
/// use reconcile_notebook::{op_add_range, op_patch, patch};
/// use serde_json::json;
///
/// let base = json!({"a": 1, "b": [1, 2, 3]});
/// let diff = vec![op_patch("b", vec![op_add_range(1, vec![json!(9)])])];
///
/// assert_eq!(patch(&base, Some(&diff)).unwrap(), json!({"a": 1, "b": [1, 9, 2, 3]}));
/// ```
pub fn patch(base: &Value, diff: Option<&[DiffEntry]>) -> Result<Value> {
    let Some(diff) = diff else {
        return Ok(base.clone());
    };

    match base {
        Value::Object(object) => patch_object(object, diff).map(Value::Object),
        Value::Array(items) => patch_sequence(items, diff).map(Value::Array),
        Value::String(text) => patch_string(text, diff).map(Value::String),
        Value::Null | Value::Bool(_) | Value::Number(_) => Err(ShapeError::UnpatchableValue {
            kind: kind_of(base),
        }
        .into()),
    }
}

/// Applies a diff of `add_range` / `remove_range` entries to a string. Keys
/// and lengths count characters, not bytes.
pub fn patch_string(base: &str, diff: &[DiffEntry]) -> Result<String> {
    validate_sequence_diff(diff, base.chars().count())?;

    let mut builder: SweepBuilder<_, String> = SweepBuilder::new(base.chars());

    for entry in diff {
        builder.retain_until(entry.key.as_index().unwrap_or_default());

        match &entry.op {
            DiffOp::AddRange {
                value_list: ValueList::Text(text),
            } => builder.insert(text.chars()),
            DiffOp::AddRange {
                value_list: ValueList::Items(items),
            } => builder.insert(characters(items)?.chars()),
            DiffOp::RemoveRange { length } => builder.skip(*length),
            DiffOp::Patch { .. } => {
                return Err(ShapeError::InvalidOperation {
                    op: "patch",
                    target: "a string",
                }
                .into());
            }
            DiffOp::Add { .. } | DiffOp::Remove | DiffOp::Replace { .. } => {
                return Err(ShapeError::InvalidOperation {
                    op: entry.op.name(),
                    target: "a string",
                }
                .into());
            }
        }
    }

    Ok(builder.finish())
}

/// Applies a diff to a list. Besides being inserted and removed in ranges,
/// items may be patched recursively.
pub fn patch_sequence(base: &[Value], diff: &[DiffEntry]) -> Result<Vec<Value>> {
    validate_sequence_diff(diff, base.len())?;

    let mut builder: SweepBuilder<_, Vec<Value>> = SweepBuilder::new(base.iter().cloned());

    for entry in diff {
        let index = entry.key.as_index().unwrap_or_default();
        builder.retain_until(index);

        match &entry.op {
            DiffOp::AddRange {
                value_list: ValueList::Items(items),
            } => builder.insert(items.iter().cloned()),
            DiffOp::AddRange {
                value_list: ValueList::Text(_),
            } => {
                return Err(ShapeError::InvalidOperation {
                    op: "add_range of text",
                    target: "a sequence",
                }
                .into());
            }
            DiffOp::RemoveRange { length } => builder.skip(*length),
            DiffOp::Patch { diff } => {
                let item = builder
                    .take_next()
                    .ok_or(ValidationError::IndexOutOfBounds {
                        index,
                        length: base.len(),
                    })?;
                builder.insert([patch(&item, diff.as_deref())?]);
            }
            DiffOp::Add { .. } | DiffOp::Remove | DiffOp::Replace { .. } => {
                return Err(ShapeError::InvalidOperation {
                    op: entry.op.name(),
                    target: "a sequence",
                }
                .into());
            }
        }
    }

    Ok(builder.finish())
}

/// Applies a diff to an object. The result contains the union of the
/// existing and the added members, visited in sorted key order.
pub fn patch_object(base: &Map<String, Value>, diff: &[DiffEntry]) -> Result<Map<String, Value>> {
    validate_object_diff(diff, base)?;

    let changed: HashSet<&str> = diff.iter().filter_map(|entry| entry.key.as_name()).collect();
    let mut patched = Map::new();

    for (key, value) in base {
        if !changed.contains(key.as_str()) {
            patched.insert(key.clone(), value.clone());
        }
    }

    for entry in diff {
        let Key::Name(key) = &entry.key else {
            continue;
        };

        match &entry.op {
            DiffOp::Add { value } | DiffOp::Replace { value } => {
                patched.insert(key.clone(), value.clone());
            }
            DiffOp::Remove => {}
            DiffOp::Patch { diff } => {
                let value = base
                    .get(key)
                    .ok_or_else(|| ValidationError::MissingKey { key: key.clone() })?;
                patched.insert(key.clone(), patch(value, diff.as_deref())?);
            }
            DiffOp::AddRange { .. } | DiffOp::RemoveRange { .. } => {
                return Err(ShapeError::InvalidOperation {
                    op: entry.op.name(),
                    target: "an object",
                }
                .into());
            }
        }
    }

    Ok(patched)
}

/// Resolves a decision path inside `value`.
pub fn value_at_path<'a>(value: &'a Value, path: &[Key]) -> Result<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| match (current, key) {
            (Value::Object(object), Key::Name(name)) => object.get(name),
            (Value::Array(items), Key::Index(index)) => items.get(*index),
            _ => None,
        })
        .ok_or_else(|| {
            ValidationError::PathNotFound {
                path: path_to_string(path),
            }
            .into()
        })
}

pub(crate) fn value_at_path_mut<'a>(value: &'a mut Value, path: &[Key]) -> Result<&'a mut Value> {
    path.iter()
        .try_fold(value, |current, key| match (current, key) {
            (Value::Object(object), Key::Name(name)) => object.get_mut(name),
            (Value::Array(items), Key::Index(index)) => items.get_mut(*index),
            _ => None,
        })
        .ok_or_else(|| {
            ValidationError::PathNotFound {
                path: path_to_string(path),
            }
            .into()
        })
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Joins items inserted into a string. Each item must be a single character,
/// so that the item count matches the number of inserted characters.
fn characters(items: &[Value]) -> Result<String> {
    items
        .iter()
        .map(|item| {
            let mut chars = item.as_str().map(str::chars).into_iter().flatten();
            match (chars.next(), chars.next()) {
                (Some(character), None) => Ok(character),
                _ => Err(Error::from(ShapeError::InvalidOperation {
                    op: "add_range of items that aren't single characters",
                    target: "a string",
                })),
            }
        })
        .collect()
}
