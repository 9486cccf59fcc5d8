mod chunker;
mod position;

pub use chunker::{Chunk, Chunker, ChunkerConfig, Granularity, chunk, chunk_with_config};
pub use position::{DiffRange, LineIndex, Position, RangeKind, string_diff_ranges};
