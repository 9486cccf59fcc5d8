#![cfg(feature = "wasm")]

use reconcile_notebook::wasm::*;
use serde_json::{Value, json};
use wasm_bindgen_test::*;

fn parse(json: &str) -> Value { serde_json::from_str(json).unwrap() }

#[wasm_bindgen_test(unsupported = test)]
fn test_apply_decisions() {
    let merged = apply_decisions(
        r#"{"x": {"y": 0}}"#,
        r#"[{
            "common_path": ["x"],
            "local_diff": [{"key": "y", "op": "replace", "value": 1}],
            "remote_diff": [{"key": "y", "op": "replace", "value": 2}],
            "action": "remote",
            "conflict": true
        }]"#,
    )
    .unwrap();

    assert_eq!(parse(&merged), json!({"x": {"y": 2}}));
}

#[wasm_bindgen_test(unsupported = test)]
fn test_build_diffs() {
    let diff = build_diffs(
        r#"{"cells": ["a", "b"]}"#,
        r#"[{"common_path": ["cells"], "local_diff": [{"key": 1, "op": "remove_range", "length": 1}]}]"#,
        "local",
    )
    .unwrap();

    assert_eq!(
        parse(&diff),
        json!([{
            "key": "cells",
            "op": "patch",
            "diff": [{"key": 1, "op": "remove_range", "length": 1}]
        }])
    );
}

#[wasm_bindgen_test(unsupported = test)]
fn test_resolve_common_paths() {
    let decisions = resolve_common_paths(
        r#"[{"common_path": [], "remote_diff": [{"key": "a", "op": "patch", "diff": [{"key": "b", "op": "remove"}]}]}]"#,
    )
    .unwrap();

    assert_eq!(
        parse(&decisions),
        json!([{
            "common_path": ["a"],
            "remote_diff": [{"key": "b", "op": "remove"}],
            "action": "base",
            "conflict": false
        }])
    );
}

#[wasm_bindgen_test(unsupported = test)]
fn test_patch() {
    let patched = patch(
        r#"{"a": 1, "b": [1, 2, 3]}"#,
        r#"[{"key": "b", "op": "patch", "diff": [{"key": 1, "op": "add_range", "value_list": [9]}]}]"#,
    )
    .unwrap();
    assert_eq!(parse(&patched), json!({"a": 1, "b": [1, 9, 2, 3]}));

    assert_eq!(parse(&patch(r#"[1]"#, "null").unwrap()), json!([1]));
}

#[wasm_bindgen_test(unsupported = test)]
fn test_chunk_string_diff() {
    let chunks = chunk_string_diff(
        "a\nb\nc\n",
        r#"[{"key": 2, "op": "add_range", "value_list": "x\n"}, {"key": 2, "op": "remove_range", "length": 2}]"#,
        false,
    )
    .unwrap();

    assert_eq!(
        parse(&chunks),
        json!([{"edit_from": 1, "edit_to": 2, "orig_from": 1, "orig_to": 2, "sources": []}])
    );
}
