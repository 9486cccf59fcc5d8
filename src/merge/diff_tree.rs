use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    diff::{Diff, Key, combine_patches},
    errors::Result,
    merge::{MergeDecision, apply::resolve_group, common_path::expand_path},
    patch::value_at_path,
    utils::side::Side,
};

/// A path of the decision tree and the diff accumulated for it.
struct Branch<'a> {
    path: &'a [Key],
    diff: Diff,
}

/// Collapses the path-scoped diffs of a decision list into one diff anchored
/// at the document root.
///
/// With [`Side::Local`] or [`Side::Remote`], the result contains that side's
/// changes of every decision. With [`Side::Merged`], it contains what each
/// decision's action resolves to, so that patching `base` with it gives the
/// same value as [`apply_decisions`](crate::apply_decisions).
///
/// # Errors
///
/// Only [`Side::Merged`] can fail, for the reasons
/// [`resolve_action`](crate::resolve_action) can.
pub fn build_diffs(base: &Value, decisions: &[MergeDecision], side: Side) -> Result<Diff> {
    debug!(count = decisions.len(), %side, "building diff tree");

    let mut groups: Vec<(&[Key], Vec<&MergeDecision>)> = Vec::new();
    let mut lookup: HashMap<&[Key], usize> = HashMap::new();

    for decision in decisions {
        let path = decision.common_path.as_slice();
        match lookup.get(path) {
            Some(&index) => groups[index].1.push(decision),
            None => {
                lookup.insert(path, groups.len());
                groups.push((path, vec![decision]));
            }
        }
    }

    if groups.is_empty() {
        return Ok(Diff::new());
    }

    let root: &[Key] = &[];
    if !lookup.contains_key(&root) {
        groups.push((root, Vec::new()));
    }

    // Descending order visits every path before its ancestors and ends at the root
    groups.sort_by(|(a, _), (b, _)| b.cmp(a));

    let mut branches = Vec::with_capacity(groups.len());
    for (path, group) in groups {
        let diff = match side {
            Side::Local => group
                .iter()
                .flat_map(|decision| decision.local().iter().cloned())
                .collect(),
            Side::Remote => group
                .iter()
                .flat_map(|decision| decision.remote().iter().cloned())
                .collect(),
            Side::Merged => resolve_group(value_at_path(base, path)?, group)?,
        };

        branches.push(Branch { path, diff });
    }

    Ok(combine_patches(merge_tree(branches)))
}

/// Folds branches, ordered from the deepest path to the root, into one trunk.
///
/// As long as the next path is a prefix of the current one, the trunk is
/// wrapped down to the next path and extended with its diff. When the next
/// path starts a different branch, the remaining paths are merged into a
/// trunk of their own and both trunks are joined at their shared prefix.
fn merge_tree(branches: Vec<Branch<'_>>) -> Diff {
    let last_path = branches.last().map(|branch| branch.path).unwrap_or_default();
    let mut trunk = Diff::new();
    let mut root: Option<&[Key]> = None;
    let mut branches = branches.into_iter().peekable();

    while let Some(Branch { path, diff }) = branches.next() {
        trunk.extend(diff);

        let next_path = branches
            .peek()
            .map(|branch| branch.path)
            .or(root)
            .unwrap_or_default();

        if path.starts_with(next_path) {
            trace!(depth = path.len(), next = next_path.len(), "promoting branch onto its trunk");
            trunk = expand_path(trunk, &path[next_path.len()..]);
            root = Some(next_path);
        } else {
            let new_trunk = merge_tree(branches.collect());
            let shared = shared_prefix_length(path, last_path);

            trunk = expand_path(trunk, &path[shared..]);
            trunk.extend(expand_path(new_trunk, &last_path[shared..]));
            break;
        }
    }

    trunk
}

fn shared_prefix_length(a: &[Key], b: &[Key]) -> usize {
    a.iter().zip(b).take_while(|(a, b)| a == b).count()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        diff::{op_add, op_add_range, op_patch, op_remove_range, op_replace},
        merge::{Action, apply_decisions},
        patch::patch,
    };

    fn notebook() -> Value {
        json!({
            "cells": [
                {"source": "a\nb\n", "metadata": {}},
                {"source": "c\n", "metadata": {"tags": []}}
            ],
            "metadata": {"kernel": "python"}
        })
    }

    fn decisions() -> Vec<MergeDecision> {
        vec![
            MergeDecision::new(
                vec!["cells".into(), 0.into(), "source".into()],
                Some(vec![op_add_range(0, "x\n")]),
                Some(vec![op_remove_range(2, 2)]),
                Action::LocalThenRemote,
            ),
            MergeDecision::new(
                vec!["cells".into(), 1.into()],
                Some(vec![op_patch("metadata", vec![op_add("collapsed", json!(true))])]),
                None,
                Action::Local,
            ),
            MergeDecision::new(
                vec!["metadata".into()],
                None,
                Some(vec![op_replace("kernel", json!("rust"))]),
                Action::Remote,
            ),
            MergeDecision::new(
                vec!["cells".into()],
                Some(vec![op_add_range(2, vec![json!({"source": ""})])]),
                Some(vec![op_add_range(2, vec![json!({"source": "r"})])]),
                Action::Remote,
            )
            .with_conflict(true),
        ]
    }

    #[test]
    fn test_merged_matches_apply_decisions() {
        let base = notebook();
        let diff = build_diffs(&base, &decisions(), Side::Merged).unwrap();

        assert_eq!(
            patch(&base, Some(&diff)).unwrap(),
            apply_decisions(&base, &decisions()).unwrap()
        );
    }

    #[test]
    fn test_local_side() {
        let diff = build_diffs(&notebook(), &decisions(), Side::Local).unwrap();

        assert_eq!(
            diff,
            vec![op_patch(
                "cells",
                vec![
                    op_patch(0, vec![op_patch("source", vec![op_add_range(0, "x\n")])]),
                    op_patch(
                        1,
                        vec![op_patch("metadata", vec![op_add("collapsed", json!(true))])]
                    ),
                    op_add_range(2, vec![json!({"source": ""})]),
                ]
            )]
        );
    }

    #[test]
    fn test_remote_side() {
        let diff = build_diffs(&notebook(), &decisions(), Side::Remote).unwrap();

        assert_eq!(
            patch(&notebook(), Some(&diff)).unwrap(),
            json!({
                "cells": [
                    {"source": "a\n", "metadata": {}},
                    {"source": "c\n", "metadata": {"tags": []}},
                    {"source": "r"}
                ],
                "metadata": {"kernel": "rust"}
            })
        );
    }

    #[test]
    fn test_no_decisions() {
        assert_eq!(build_diffs(&notebook(), &[], Side::Merged).unwrap(), vec![]);
    }

    #[test]
    fn test_root_decision() {
        let decisions = vec![MergeDecision::new(
            vec![],
            Some(vec![op_add("nbformat", json!(4))]),
            None,
            Action::Local,
        )];

        assert_eq!(
            build_diffs(&notebook(), &decisions, Side::Merged).unwrap(),
            vec![op_add("nbformat", json!(4))]
        );
    }

    #[test]
    fn test_merge_diverging_branches() {
        let paths: [&[Key]; 4] = [
            &["b".into(), 0.into()],
            &["a".into(), "x".into()],
            &["a".into()],
            &[],
        ];
        let branches = paths
            .iter()
            .map(|path| Branch {
                path,
                diff: vec![op_replace("v", json!(path.len()))],
            })
            .collect();

        assert_eq!(
            merge_tree(branches),
            vec![
                op_patch("b", vec![op_patch(0, vec![op_replace("v", json!(2))])]),
                op_patch(
                    "a",
                    vec![
                        op_patch("x", vec![op_replace("v", json!(2))]),
                        op_replace("v", json!(1)),
                    ]
                ),
                op_replace("v", json!(0)),
            ]
        );
    }
}
