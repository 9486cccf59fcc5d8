use std::{borrow::Cow, fmt::Display};

use serde::{Deserialize, Serialize};

/// Address of a diff entry or path segment: an index into a sequence or
/// string, or a member name of an object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(_) => None,
        }
    }

    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Index(_) => None,
            Key::Name(name) => Some(name),
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self { Key::Index(value) }
}

impl From<String> for Key {
    fn from(value: String) -> Self { Key::Name(value) }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self { Key::Name(value.to_owned()) }
}

impl<'a> From<Cow<'a, str>> for Key {
    fn from(value: Cow<'a, str>) -> Self { Key::Name(value.into_owned()) }
}

/// Formats a path the way decisions are grouped by it, e.g. `/cells/3/source`.
#[must_use]
pub fn path_to_string(path: &[Key]) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }

    path.iter().map(|key| format!("/{key}")).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_untagged_wire_format() {
        let path: Vec<Key> = serde_json::from_str(r#"["cells", 3, "source"]"#).unwrap();
        assert_eq!(
            path,
            vec![Key::from("cells"), Key::Index(3), Key::from("source")]
        );
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["cells",3,"source"]"#);
    }

    #[test]
    fn test_path_to_string() {
        assert_eq!(path_to_string(&[]), "/");
        assert_eq!(
            path_to_string(&["cells".into(), 0.into(), "outputs".into()]),
            "/cells/0/outputs"
        );
    }
}
