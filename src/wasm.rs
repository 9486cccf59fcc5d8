//! Expose the merge core to WebAssembly. Documents, diffs and decisions cross
//! the boundary as JSON strings in their wire format.
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::{
    ChunkerConfig, Diff, Granularity, MergeDecision, Side, chunk_with_config, string_diff_ranges,
};

/// WASM wrapper around `crate::apply_decisions`, returning the merged
/// document.
///
/// # Errors
///
/// If the input isn't valid JSON or the decisions don't fit the document.
#[wasm_bindgen(js_name = applyDecisions)]
pub fn apply_decisions(base: &str, decisions: &str) -> Result<String, JsError> {
    set_panic_hook();

    let base: Value = serde_json::from_str(base)?;
    let decisions: Vec<MergeDecision> = serde_json::from_str(decisions)?;

    Ok(serde_json::to_string(&crate::apply_decisions(&base, &decisions)?)?)
}

/// WASM wrapper around `crate::build_diffs`. `side` is one of `local`,
/// `remote` or `merged`.
///
/// # Errors
///
/// If the input isn't valid JSON or the decisions don't fit the document.
#[wasm_bindgen(js_name = buildDiffs)]
pub fn build_diffs(base: &str, decisions: &str, side: &str) -> Result<String, JsError> {
    set_panic_hook();

    let base: Value = serde_json::from_str(base)?;
    let decisions: Vec<MergeDecision> = serde_json::from_str(decisions)?;
    let side: Side = serde_json::from_value(Value::String(side.to_owned()))?;

    Ok(serde_json::to_string(&crate::build_diffs(&base, &decisions, side)?)?)
}

/// WASM wrapper around `crate::resolve_common_paths`, returning the
/// compressed decisions.
///
/// # Errors
///
/// If the input isn't a valid list of decisions.
#[wasm_bindgen(js_name = resolveCommonPaths)]
pub fn resolve_common_paths(decisions: &str) -> Result<String, JsError> {
    set_panic_hook();

    let mut decisions: Vec<MergeDecision> = serde_json::from_str(decisions)?;
    crate::resolve_common_paths(&mut decisions);

    Ok(serde_json::to_string(&decisions)?)
}

/// WASM wrapper around `crate::patch`. An empty or `null` diff returns the
/// document unchanged.
///
/// # Errors
///
/// If the input isn't valid JSON or the diff doesn't fit the document.
#[wasm_bindgen]
pub fn patch(base: &str, diff: &str) -> Result<String, JsError> {
    set_panic_hook();

    let base: Value = serde_json::from_str(base)?;
    let diff: Option<Diff> = serde_json::from_str(diff)?;

    Ok(serde_json::to_string(&crate::patch(&base, diff.as_deref())?)?)
}

/// Chunks a diff of a string, returning the list of chunks.
///
/// # Errors
///
/// If the diff isn't valid JSON or doesn't fit `base`.
#[wasm_bindgen(js_name = chunkStringDiff)]
pub fn chunk_string_diff(base: &str, diff: &str, line_granular: bool) -> Result<String, JsError> {
    set_panic_hook();

    let diff: Diff = serde_json::from_str(diff)?;
    let config = ChunkerConfig {
        granularity: if line_granular {
            Granularity::Line
        } else {
            Granularity::Character
        },
    };

    let ranges = string_diff_ranges(base, &diff)?;
    Ok(serde_json::to_string(&chunk_with_config(&ranges, config))?)
}

fn set_panic_hook() {
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
