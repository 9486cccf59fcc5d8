mod apply;
mod common_path;
mod decision;
mod diff_tree;
mod split;

pub use apply::{apply_decisions, resolve_action};
pub use common_path::{
    PoppedPath, compress_common_path, expand_path, pop_path, resolve_common_paths,
};
pub use decision::{Action, DecisionPath, MergeDecision, filter_decisions, unresolved_conflicts};
pub use diff_tree::build_diffs;
pub use split::split_decision_on_chunks;
