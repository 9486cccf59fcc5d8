use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    chunk::{DiffRange, RangeKind},
    diff::DiffSource,
};

/// A group of changes correlated across the edited and the original text.
/// Both spans are half-open line ranges.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub edit_from: usize,
    pub edit_to: usize,
    pub orig_from: usize,
    pub orig_to: usize,

    /// Provenance of every range absorbed into the chunk, in order of arrival
    pub sources: Vec<DiffSource>,
}

impl Chunk {
    #[must_use]
    pub fn new(edit_from: usize, edit_to: usize, orig_from: usize, orig_to: usize) -> Self {
        Self {
            edit_from,
            edit_to,
            orig_from,
            orig_to,
            sources: Vec::new(),
        }
    }

    /// Whether `line` of the edited text is inside or right after the chunk.
    #[must_use]
    pub fn in_edit(&self, line: usize) -> bool { self.edit_from <= line && line <= self.edit_to }

    /// Whether `line` of the original text is inside or right after the chunk.
    #[must_use]
    pub fn in_orig(&self, line: usize) -> bool { self.orig_from <= line && line <= self.orig_to }

    fn add_source(&mut self, source: Option<DiffSource>) {
        if let Some(source) = source {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
    }

    /// Grows the chunk to cover `other` as well.
    fn absorb(&mut self, other: &Chunk) {
        self.edit_from = self.edit_from.min(other.edit_from);
        self.edit_to = self.edit_to.max(other.edit_to);
        self.orig_from = self.orig_from.min(other.orig_from);
        self.orig_to = self.orig_to.max(other.orig_to);

        for source in &other.sources {
            self.add_source(Some(*source));
        }
    }

    fn precedes(&self, other: &Chunk) -> bool {
        self.edit_to <= other.edit_from && self.orig_to <= other.orig_from
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Any two ranges touching the same line end up in the same chunk
    #[default]
    Character,
    /// An addition and a deletion that only meet where the chunk ends in the
    /// edited text stay in separate chunks, unless both start on that line or
    /// they would overlap in the original text
    Line,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ChunkerConfig {
    pub granularity: Granularity,
}

/// Groups positioned diff ranges into chunks in a single sweep.
///
/// Ranges have to be added in the order they appear in the text. The chunker
/// keeps a running offset, the number of lines the edited text is ahead of the
/// original one, to translate between the two.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
    chunks: Vec<Chunk>,
    edit_offset: isize,
    last_kind: Option<RangeKind>,
}

impl Chunker {
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Adds a range and advances the offset by the lines it adds or removes.
    pub fn add(&mut self, range: &DiffRange) {
        self.place(range, self.edit_offset);

        let net = signed(range.net_lines());
        self.edit_offset += match range.kind {
            RangeKind::Addition => net,
            RangeKind::Deletion => -net,
        };
    }

    /// Adds a range of a diff that hasn't been applied, assuming `offset`
    /// instead of the running one. The running offset is left as it is.
    pub fn add_ghost(&mut self, range: &DiffRange, offset: isize) { self.place(range, offset); }

    #[must_use]
    pub fn edit_offset(&self) -> isize { self.edit_offset }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    #[must_use]
    pub fn finish(self) -> Vec<Chunk> { self.chunks }

    fn place(&mut self, range: &DiffRange, offset: isize) {
        let (from, to) = range.line_span();
        let counterpart = to - from - range.net_lines();

        let (edit_from, edit_to, orig_from, orig_to) = match range.kind {
            RangeKind::Addition => {
                let orig_from = from.saturating_add_signed(-offset);
                (from, to, orig_from, orig_from + counterpart)
            }
            RangeKind::Deletion => {
                let edit_from = from.saturating_add_signed(offset);
                (edit_from, edit_from + counterpart, from, to)
            }
        };

        let mut placed = Chunk::new(edit_from, edit_to, orig_from, orig_to);
        placed.add_source(range.source);

        let granularity = self.config.granularity;
        let same_kind = self.last_kind == Some(range.kind);
        self.last_kind = Some(range.kind);

        let extends = self.chunks.last().is_some_and(|chunk| {
            let overlaps = match range.kind {
                RangeKind::Addition => chunk.in_orig(orig_from),
                RangeKind::Deletion => chunk.in_edit(edit_from),
            };
            let touches_end = edit_from == chunk.edit_to && edit_from != chunk.edit_from;
            let kept_apart = granularity == Granularity::Line
                && touches_end
                && !same_kind
                && chunk.precedes(&placed);

            overlaps && !kept_apart
        });

        match self.chunks.last_mut() {
            Some(chunk) if extends => {
                trace!(edit_from, edit_to, orig_from, orig_to, "extending chunk");
                chunk.absorb(&placed);
            }
            _ => {
                trace!(edit_from, edit_to, orig_from, orig_to, "starting chunk");
                self.chunks.push(placed);
            }
        }

        self.coalesce_tail();
    }

    /// Folds the last chunk into the one before it for as long as the two
    /// overlap in either text.
    fn coalesce_tail(&mut self) {
        while let [.., previous, last] = self.chunks.as_mut_slice() {
            if previous.precedes(last) {
                return;
            }

            trace!(edit_from = last.edit_from, orig_from = last.orig_from, "joining chunks");
            previous.absorb(last);
            self.chunks.pop();
        }
    }
}

/// Groups ranges, given in text order, into chunks.
#[must_use]
pub fn chunk(ranges: &[DiffRange]) -> Vec<Chunk> {
    chunk_with_config(ranges, ChunkerConfig::default())
}

#[must_use]
pub fn chunk_with_config(ranges: &[DiffRange], config: ChunkerConfig) -> Vec<Chunk> {
    let mut chunker = Chunker::new(config);
    for range in ranges {
        chunker.add(range);
    }
    chunker.finish()
}

fn signed(lines: usize) -> isize { isize::try_from(lines).unwrap_or(isize::MAX) }
