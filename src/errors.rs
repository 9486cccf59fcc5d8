use thiserror::Error;

/// A diff entry does not fit the value it is applied to: an index or range
/// is out of bounds, or an object key is missing or already present.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An index-keyed operation points past the end of its target
    #[error("Invalid diff: index {index} is out of bounds for a target of length {length}")]
    IndexOutOfBounds {
        /// The key of the offending entry
        index: usize,
        /// The length of the sequence or string being patched
        length: usize,
    },

    /// A range removal reaches beyond the end of its target
    #[error(
        "Invalid diff: attempting to remove {requested} items starting at position {position}, \
         but the target only has {available} items remaining"
    )]
    RangeExceedsTarget {
        /// The position where the removal starts
        position: usize,
        /// The number of items requested
        requested: usize,
        /// The number of items available from the position
        available: usize,
    },

    #[error("Invalid diff: key `{key}` does not exist in the target object")]
    MissingKey { key: String },

    #[error("Invalid diff: key `{key}` already exists in the target object")]
    KeyAlreadyExists { key: String },

    /// Entries must be sorted by key, and only an insertion may share its key
    /// with the entry that follows it.
    #[error("Invalid diff: entry with key {key} is out of order")]
    UnsortedDiff { key: String },

    #[error("Invalid diff: `{op}` on {target} requires {expected} key, got `{key}`")]
    WrongKeyKind {
        op: &'static str,
        target: &'static str,
        expected: &'static str,
        key: String,
    },

    #[error("Path {path} does not exist in the document")]
    PathNotFound { path: String },

    #[error(
        "Cannot clear: the diffs of a decision disagree on the target key ({first} != \
         {second})"
    )]
    AmbiguousClearKey { first: String, second: String },

    #[error("Cannot clear: the decision has no diff to take the target key from")]
    EmptyClearTarget,
}

/// A diff cannot be applied to a value of this shape at all, or two pieces of
/// a merge cannot legally be combined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Only objects, sequences and strings can be patched
    #[error("Cannot patch a value of type {kind}")]
    UnpatchableValue { kind: &'static str },

    #[error("Operation `{op}` is not valid on {target}")]
    InvalidOperation {
        op: &'static str,
        target: &'static str,
    },

    #[error("Decisions at {path} cannot be combined: {reason}")]
    IncompatibleDecisions { path: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, Error>;
