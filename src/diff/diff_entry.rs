use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::diff::{DiffSource, Key};

/// An ordered list of changes, sorted by key.
pub type Diff = Vec<DiffEntry>;

/// The values inserted by an `add_range`. Strings may be extended either by a
/// literal piece of text or by a list of single-character strings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ValueList {
    Text(String),
    Items(Vec<Value>),
}

impl ValueList {
    /// Number of inserted items, counting characters for text.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ValueList::Text(text) => text.chars().count(),
            ValueList::Items(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl From<&str> for ValueList {
    fn from(value: &str) -> Self { ValueList::Text(value.to_owned()) }
}

impl From<String> for ValueList {
    fn from(value: String) -> Self { ValueList::Text(value) }
}

impl From<Vec<Value>> for ValueList {
    fn from(value: Vec<Value>) -> Self { ValueList::Items(value) }
}

/// A single structural change, without its key. Object members are changed
/// through `Add`, `Remove`, `Replace` and `Patch`; sequences and strings
/// through `AddRange`, `RemoveRange` and (sequences only) `Patch`.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffOp {
    Add { value: Value },
    Remove,
    Replace { value: Value },

    /// Recursively change the value under the key. `None` means that there
    /// are no changes below this point.
    Patch { diff: Option<Diff> },

    /// Insert the values before the item at the key.
    AddRange { value_list: ValueList },

    /// Remove `length` items starting at the key.
    RemoveRange { length: usize },
}

impl DiffOp {
    /// The name of the operation on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DiffOp::Add { .. } => "add",
            DiffOp::Remove => "remove",
            DiffOp::Replace { .. } => "replace",
            DiffOp::Patch { .. } => "patch",
            DiffOp::AddRange { .. } => "add_range",
            DiffOp::RemoveRange { .. } => "remove_range",
        }
    }

    /// Insertions don't consume the item at their key, so they may share it
    /// with the entry that follows them.
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        matches!(self, DiffOp::Add { .. } | DiffOp::AddRange { .. })
    }
}

/// One entry of a diff: an operation addressed at a key of the target.
///
/// The optional `source` is a provenance label. It is not serialised and
/// doesn't take part in equality.
#[derive(Serialize, Deserialize, Clone)]
#[serde(try_from = "WireDiffEntry", into = "WireDiffEntry")]
pub struct DiffEntry {
    pub key: Key,
    pub op: DiffOp,
    pub source: Option<DiffSource>,
}

impl DiffEntry {
    #[must_use]
    pub fn new(key: impl Into<Key>, op: DiffOp) -> Self {
        Self {
            key: key.into(),
            op,
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(self, source: DiffSource) -> Self {
        Self {
            source: Some(source),
            ..self
        }
    }

    /// Sort key which keeps entries ordered by key and puts insertions in
    /// front of the other operations sharing their key.
    pub(crate) fn sort_key(&self) -> (&Key, bool) { (&self.key, !self.op.is_insertion()) }

    /// Returns true if applying this entry discards whatever is at `key`.
    pub(crate) fn overwrites(&self, key: &Key) -> bool {
        match (&self.op, &self.key, key) {
            (DiffOp::Remove | DiffOp::Replace { .. }, own, other) => own == other,
            (DiffOp::RemoveRange { length }, Key::Index(start), Key::Index(index)) => {
                index.checked_sub(*start).is_some_and(|offset| offset < *length)
            }
            _ => false,
        }
    }
}

impl PartialEq for DiffEntry {
    fn eq(&self, other: &Self) -> bool { self.key == other.key && self.op == other.op }
}

impl Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.op {
            DiffOp::Add { .. } | DiffOp::Remove | DiffOp::Replace { .. } => {
                write!(f, "<{} at {}>", self.op.name(), self.key)
            }
            DiffOp::Patch { diff } => write!(
                f,
                "<patch {} with {} entries>",
                self.key,
                diff.as_ref().map_or(0, Vec::len)
            ),
            DiffOp::AddRange { value_list } => {
                write!(f, "<add_range {} items at {}>", value_list.len(), self.key)
            }
            DiffOp::RemoveRange { length } => {
                write!(f, "<remove_range {length} items at {}>", self.key)
            }
        }
    }
}

impl Debug for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{self}") }
}

#[must_use]
pub fn op_add(key: impl Into<Key>, value: Value) -> DiffEntry {
    DiffEntry::new(key, DiffOp::Add { value })
}

#[must_use]
pub fn op_remove(key: impl Into<Key>) -> DiffEntry { DiffEntry::new(key, DiffOp::Remove) }

#[must_use]
pub fn op_replace(key: impl Into<Key>, value: Value) -> DiffEntry {
    DiffEntry::new(key, DiffOp::Replace { value })
}

#[must_use]
pub fn op_patch(key: impl Into<Key>, diff: Diff) -> DiffEntry {
    DiffEntry::new(key, DiffOp::Patch { diff: Some(diff) })
}

#[must_use]
pub fn op_add_range(key: usize, value_list: impl Into<ValueList>) -> DiffEntry {
    DiffEntry::new(
        key,
        DiffOp::AddRange {
            value_list: value_list.into(),
        },
    )
}

#[must_use]
pub fn op_remove_range(key: usize, length: usize) -> DiffEntry {
    DiffEntry::new(key, DiffOp::RemoveRange { length })
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum WireOp {
    Add,
    Remove,
    Replace,
    Patch,
    #[serde(alias = "addrange")]
    AddRange,
    #[serde(alias = "removerange")]
    RemoveRange,
}

/// The flat JSON shape of a diff entry: `{key, op, value?, value_list?,
/// length?, diff?}`.
#[derive(Serialize, Deserialize)]
struct WireDiffEntry {
    key: Key,
    op: WireOp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,

    #[serde(default, alias = "valuelist", skip_serializing_if = "Option::is_none")]
    value_list: Option<ValueList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    diff: Option<Diff>,
}

#[derive(Error, Debug)]
#[error("`{op}` entry at key {key} is missing its `{field}` field")]
pub struct MissingPayloadError {
    op: &'static str,
    key: Key,
    field: &'static str,
}

impl TryFrom<WireDiffEntry> for DiffEntry {
    type Error = MissingPayloadError;

    fn try_from(wire: WireDiffEntry) -> Result<Self, Self::Error> {
        let missing = |op, field| MissingPayloadError {
            op,
            key: wire.key.clone(),
            field,
        };

        let op = match wire.op {
            WireOp::Add => DiffOp::Add {
                value: wire.value.unwrap_or(Value::Null),
            },
            WireOp::Remove => DiffOp::Remove,
            WireOp::Replace => DiffOp::Replace {
                value: wire.value.unwrap_or(Value::Null),
            },
            WireOp::Patch => DiffOp::Patch { diff: wire.diff },
            WireOp::AddRange => DiffOp::AddRange {
                value_list: wire
                    .value_list
                    .ok_or_else(|| missing("add_range", "value_list"))?,
            },
            WireOp::RemoveRange => DiffOp::RemoveRange {
                length: wire.length.ok_or_else(|| missing("remove_range", "length"))?,
            },
        };

        Ok(DiffEntry {
            key: wire.key,
            op,
            source: None,
        })
    }
}

impl From<DiffEntry> for WireDiffEntry {
    fn from(entry: DiffEntry) -> Self {
        let mut wire = WireDiffEntry {
            key: entry.key,
            op: WireOp::Remove,
            value: None,
            value_list: None,
            length: None,
            diff: None,
        };

        match entry.op {
            DiffOp::Add { value } => {
                wire.op = WireOp::Add;
                wire.value = Some(value);
            }
            DiffOp::Remove => {}
            DiffOp::Replace { value } => {
                wire.op = WireOp::Replace;
                wire.value = Some(value);
            }
            DiffOp::Patch { diff } => {
                wire.op = WireOp::Patch;
                wire.diff = diff;
            }
            DiffOp::AddRange { value_list } => {
                wire.op = WireOp::AddRange;
                wire.value_list = Some(value_list);
            }
            DiffOp::RemoveRange { length } => {
                wire.op = WireOp::RemoveRange;
                wire.length = Some(length);
            }
        }

        wire
    }
}
