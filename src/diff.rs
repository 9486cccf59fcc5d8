mod combine;
mod diff_entry;
mod key;
mod source;
mod validate;

pub use combine::combine_patches;
pub use diff_entry::{
    Diff, DiffEntry, DiffOp, MissingPayloadError, ValueList, op_add, op_add_range, op_patch,
    op_remove, op_remove_range, op_replace,
};
pub use key::{Key, path_to_string};
pub use source::{DiffSource, SourceSide, label_source};
pub use validate::{validate_object_diff, validate_sequence_diff};
