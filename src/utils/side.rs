use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Selects which changes a diff built from merge decisions contains.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Only the local changes of every decision
    Local,
    /// Only the remote changes of every decision
    Remote,
    /// The changes selected by each decision's action
    Merged,
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Local => write!(f, "local"),
            Side::Remote => write!(f, "remote"),
            Side::Merged => write!(f, "merged"),
        }
    }
}
