use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::{
    diff::{DiffEntry, DiffOp, Key},
    errors::{Result, ShapeError, ValidationError},
};

/// Checks that a diff can be applied to a sequence or string of `length`
/// items.
///
/// Every key must be an index. Insertions may point one past the last item,
/// removals and patches must stay within the target. Entries have to be sorted
/// by key and must not reach back into items consumed by a previous removal or
/// patch; only insertions may share their key with a following entry.
pub fn validate_sequence_diff(diff: &[DiffEntry], length: usize) -> Result<()> {
    let mut consumed_until = 0;

    for entry in diff {
        let index = sequence_index(entry)?;

        if index < consumed_until {
            return Err(ValidationError::UnsortedDiff {
                key: entry.key.to_string(),
            }
            .into());
        }

        match &entry.op {
            DiffOp::AddRange { .. } => {
                if index > length {
                    return Err(ValidationError::IndexOutOfBounds { index, length }.into());
                }
            }
            DiffOp::RemoveRange {
                length: removed_count,
            } => {
                if index > length || *removed_count > length - index {
                    return Err(ValidationError::RangeExceedsTarget {
                        position: index,
                        requested: *removed_count,
                        available: length.saturating_sub(index),
                    }
                    .into());
                }

                consumed_until = index + removed_count;
            }
            DiffOp::Patch { .. } => {
                if index >= length {
                    return Err(ValidationError::IndexOutOfBounds { index, length }.into());
                }

                consumed_until = index + 1;
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

    Ok(())
}

/// Checks that a diff can be applied to `object`: keys must be member names,
/// `add` needs a key that is not yet present while every other operation needs
/// an existing one, and each key may be changed at most once.
pub fn validate_object_diff(diff: &[DiffEntry], object: &Map<String, Value>) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(diff.len());

    for entry in diff {
        let Key::Name(name) = &entry.key else {
            return Err(ValidationError::WrongKeyKind {
                op: entry.op.name(),
                target: "an object",
                expected: "a string",
                key: entry.key.to_string(),
            }
            .into());
        };

        if !seen.insert(name) {
            return Err(ValidationError::UnsortedDiff { key: name.clone() }.into());
        }

        match &entry.op {
            DiffOp::Add { .. } => {
                if object.contains_key(name) {
                    return Err(ValidationError::KeyAlreadyExists { key: name.clone() }.into());
                }
            }
            DiffOp::Remove | DiffOp::Replace { .. } | DiffOp::Patch { .. } => {
                if !object.contains_key(name) {
                    return Err(ValidationError::MissingKey { key: name.clone() }.into());
                }
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

    Ok(())
}

fn sequence_index(entry: &DiffEntry) -> Result<usize> {
    entry.key.as_index().ok_or_else(|| {
        ValidationError::WrongKeyKind {
            op: entry.op.name(),
            target: "a sequence",
            expected: "an integer",
            key: entry.key.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::{
        diff::{op_add, op_add_range, op_patch, op_remove, op_remove_range, op_replace},
        errors::Error,
    };

    #[test_case(vec![op_add_range(3, "x")]; "append at the end")]
    #[test_case(vec![op_add_range(1, "x"), op_remove_range(1, 2)]; "insert before a removal")]
    #[test_case(vec![op_add_range(1, "x"), op_add_range(1, "y"), op_patch(1, vec![])]; "stacked insertions")]
    #[test_case(vec![op_remove_range(0, 1), op_patch(1, vec![]), op_add_range(2, "x")]; "adjacent entries")]
    #[test_case(vec![op_remove_range(0, 3)]; "remove everything")]
    fn test_valid_sequence_diff(diff: Vec<DiffEntry>) {
        assert_eq!(validate_sequence_diff(&diff, 3), Ok(()));
    }

    #[test]
    fn test_range_exceeds_target() {
        assert_eq!(
            validate_sequence_diff(&[op_remove_range(2, 5)], 3),
            Err(Error::Validation(ValidationError::RangeExceedsTarget {
                position: 2,
                requested: 5,
                available: 1,
            }))
        );
    }

    #[test]
    fn test_huge_removal_is_rejected() {
        assert_eq!(
            validate_sequence_diff(&[op_remove_range(1, usize::MAX)], 1),
            Err(Error::Validation(ValidationError::RangeExceedsTarget {
                position: 1,
                requested: usize::MAX,
                available: 0,
            }))
        );
    }

    #[test]
    fn test_index_out_of_bounds() {
        assert_eq!(
            validate_sequence_diff(&[op_patch(3, vec![])], 3),
            Err(Error::Validation(ValidationError::IndexOutOfBounds {
                index: 3,
                length: 3
            }))
        );
        assert_eq!(
            validate_sequence_diff(&[op_add_range(4, "x")], 3),
            Err(Error::Validation(ValidationError::IndexOutOfBounds {
                index: 4,
                length: 3
            }))
        );
    }

    #[test_case(vec![op_remove_range(1, 1), op_add_range(0, "x")]; "descending keys")]
    #[test_case(vec![op_remove_range(0, 2), op_patch(1, vec![])]; "patch of a removed item")]
    #[test_case(vec![op_patch(1, vec![]), op_add_range(1, "x")]; "insertion after consumption")]
    fn test_unsorted_sequence_diff(diff: Vec<DiffEntry>) {
        assert!(matches!(
            validate_sequence_diff(&diff, 3),
            Err(Error::Validation(ValidationError::UnsortedDiff { .. }))
        ));
    }

    #[test]
    fn test_sequence_rejects_object_operations() {
        assert_eq!(
            validate_sequence_diff(&[op_replace(0, json!(1))], 3),
            Err(Error::Shape(ShapeError::InvalidOperation {
                op: "replace",
                target: "a sequence"
            }))
        );
        assert!(matches!(
            validate_sequence_diff(&[op_patch("a", vec![])], 3),
            Err(Error::Validation(ValidationError::WrongKeyKind { .. }))
        ));
    }

    #[test]
    fn test_object_diff() {
        let object = json!({"a": 1, "b": [1, 2]});
        let object = object.as_object().unwrap();

        assert_eq!(
            validate_object_diff(
                &[op_add("c", json!(2)), op_remove("a"), op_patch("b", vec![])],
                object
            ),
            Ok(())
        );
        assert_eq!(
            validate_object_diff(&[op_add("a", json!(2))], object),
            Err(Error::Validation(ValidationError::KeyAlreadyExists {
                key: "a".to_owned()
            }))
        );
        assert_eq!(
            validate_object_diff(&[op_replace("z", json!(2))], object),
            Err(Error::Validation(ValidationError::MissingKey {
                key: "z".to_owned()
            }))
        );
        assert!(matches!(
            validate_object_diff(&[op_remove("a"), op_replace("a", json!(0))], object),
            Err(Error::Validation(ValidationError::UnsortedDiff { .. }))
        ));
        assert!(matches!(
            validate_object_diff(&[op_remove_range(0, 1)], object),
            Err(Error::Validation(ValidationError::WrongKeyKind { .. }))
        ));
    }
}
