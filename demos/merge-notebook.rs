use std::{env, fs, process};

use reconcile_notebook::{
    MergeDecision, apply_decisions, resolve_common_paths, unresolved_conflicts,
};
use serde_json::Value;

/// Applies a list of merge decisions to a notebook and prints the result.
/// Decisions that are still conflicts are reported on stderr.
///
/// Run it with:
/// `cargo run --example merge-notebook base.ipynb decisions.json [output.ipynb]`
fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: merge-notebook <base> <decisions> [output]");
        process::exit(1);
    }

    let base_file = &args[1];
    let decisions_file = &args[2];
    let output_file = args.get(3);

    let base: Value = read_json(base_file);
    let mut decisions: Vec<MergeDecision> = read_json(decisions_file);

    resolve_common_paths(&mut decisions);

    let merged = apply_decisions(&base, &decisions).unwrap_or_else(|e| {
        eprintln!("Error applying {decisions_file}: {e}");
        process::exit(1);
    });

    for index in unresolved_conflicts(&decisions) {
        let path = &decisions[index].common_path;
        eprintln!("Unresolved conflict in decision {index} at {path:?}");
    }

    let merged_content = serde_json::to_string_pretty(&merged).unwrap_or_else(|e| {
        eprintln!("Error serializing the merged notebook: {e}");
        process::exit(1);
    });

    if let Some(output_path) = output_file {
        if let Err(e) = fs::write(output_path, merged_content) {
            eprintln!("Error writing to {output_path}: {e}");
            process::exit(1);
        }
    } else {
        println!("{merged_content}");
    }
}

fn read_json<T: serde::de::DeserializeOwned>(file: &str) -> T {
    let content = fs::read_to_string(file).unwrap_or_else(|e| {
        eprintln!("Error reading {file}: {e}");
        process::exit(1);
    });

    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing {file}: {e}");
        process::exit(1);
    })
}
