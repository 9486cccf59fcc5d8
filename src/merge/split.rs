use tracing::{debug, warn};

use crate::{
    chunk::{Chunk, DiffRange, RangeKind, chunk, string_diff_ranges},
    diff::{Diff, DiffEntry},
    errors::Result,
    merge::{Action, MergeDecision},
};

/// Base lines covered by the chunks of both sides that touch each other.
#[derive(Debug, Default)]
struct Region {
    orig_to: usize,
    local: Diff,
    remote: Diff,
}

/// Splits a decision on a string into one decision per region of the base
/// text its local and remote changes touch.
///
/// Each side's entries are grouped into chunks by a [`Chunker`](crate::Chunker);
/// chunks of either side whose base lines overlap or meet end up in the same
/// region. The split decisions keep the path and action of the original; a
/// conflict stays a conflict only where both sides changed something.
/// Decisions with a custom resolution, or touching a single region, are
/// returned as they are.
///
/// # Errors
///
/// Fails if the local or remote diff isn't a valid string diff of `base`.
pub fn split_decision_on_chunks(
    base: &str,
    decision: &MergeDecision,
) -> Result<Vec<MergeDecision>> {
    let local = side_chunks(base, decision.local())?;
    let remote = side_chunks(base, decision.remote())?;

    if decision.action == Action::Custom {
        return Ok(vec![decision.clone()]);
    }

    let mut spans = Vec::with_capacity(local.1.len() + remote.1.len());
    for (is_local, chunks) in [(true, &local.1), (false, &remote.1)] {
        for (index, chunk) in chunks.iter().enumerate() {
            spans.push((chunk.orig_from, chunk.orig_to, is_local, index));
        }
    }
    spans.sort_by_key(|(from, to, ..)| (*from, *to));

    let mut regions: Vec<Region> = Vec::new();
    let mut local_regions = vec![0; local.1.len()];
    let mut remote_regions = vec![0; remote.1.len()];

    for (from, to, is_local, index) in spans {
        if regions.last().is_none_or(|region| from > region.orig_to) {
            regions.push(Region::default());
        }

        let region_index = regions.len() - 1;
        if let Some(region) = regions.last_mut() {
            region.orig_to = region.orig_to.max(to);
        }

        if is_local {
            local_regions[index] = region_index;
        } else {
            remote_regions[index] = region_index;
        }
    }

    debug!(regions = regions.len(), "splitting decision on chunks");

    if regions.len() <= 1 {
        return Ok(vec![decision.clone()]);
    }

    for (is_local, entries, (ranges, chunks), chunk_regions) in [
        (true, decision.local(), &local, &local_regions),
        (false, decision.remote(), &remote, &remote_regions),
    ] {
        for (entry, range) in entries.iter().zip(ranges) {
            let Some(index) = containing_chunk(chunks, range) else {
                warn!(%entry, "entry is not covered by its chunks, keeping the decision whole");
                return Ok(vec![decision.clone()]);
            };

            let region = &mut regions[chunk_regions[index]];
            if is_local {
                region.local.push(entry.clone());
            } else {
                region.remote.push(entry.clone());
            }
        }
    }

    Ok(regions
        .into_iter()
        .map(|region| {
            let conflict =
                decision.conflict && !region.local.is_empty() && !region.remote.is_empty();
            let side = |diff: Diff| (!diff.is_empty()).then_some(diff);

            MergeDecision::new(
                decision.common_path.clone(),
                side(region.local),
                side(region.remote),
                decision.action,
            )
            .with_conflict(conflict)
        })
        .collect())
}

/// The ranges of a string diff, one per entry, and the chunks they form.
fn side_chunks(base: &str, diff: &[DiffEntry]) -> Result<(Vec<DiffRange>, Vec<Chunk>)> {
    let ranges = string_diff_ranges(base, diff)?;
    let chunks = chunk(&ranges);
    Ok((ranges, chunks))
}

/// Index of the chunk covering `range`. Chunks are ordered and disjoint in
/// both texts.
fn containing_chunk(chunks: &[Chunk], range: &DiffRange) -> Option<usize> {
    let (from, to) = range.line_span();
    let end = chunks.partition_point(|chunk| match range.kind {
        RangeKind::Addition => chunk.edit_from <= from,
        RangeKind::Deletion => chunk.orig_from <= from,
    });

    chunks[..end].iter().rposition(|chunk| match range.kind {
        RangeKind::Addition => to <= chunk.edit_to,
        RangeKind::Deletion => to <= chunk.orig_to,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        diff::{op_add_range, op_remove_range},
        errors::Error,
    };

    const BASE: &str = "one\ntwo\nthree\nfour\n";

    #[test]
    fn test_split_into_regions() {
        let decision = MergeDecision::new(
            vec!["cells".into(), 0.into(), "source".into()],
            Some(vec![op_add_range(0, "zero\n"), op_remove_range(14, 5)]),
            Some(vec![op_remove_range(4, 4), op_add_range(14, "3.5\n")]),
            Action::LocalThenRemote,
        )
        .with_conflict(true);

        let split = split_decision_on_chunks(BASE, &decision).unwrap();

        assert_eq!(
            split,
            vec![
                MergeDecision::new(
                    decision.common_path.clone(),
                    Some(vec![op_add_range(0, "zero\n")]),
                    None,
                    Action::LocalThenRemote,
                ),
                MergeDecision::new(
                    decision.common_path.clone(),
                    None,
                    Some(vec![op_remove_range(4, 4)]),
                    Action::LocalThenRemote,
                ),
                MergeDecision::new(
                    decision.common_path.clone(),
                    Some(vec![op_remove_range(14, 5)]),
                    Some(vec![op_add_range(14, "3.5\n")]),
                    Action::LocalThenRemote,
                )
                .with_conflict(true),
            ]
        );
    }

    #[test]
    fn test_insertion_after_removed_line_shares_its_region() {
        let decision = MergeDecision::new(
            vec![],
            Some(vec![op_remove_range(0, 4), op_remove_range(14, 5)]),
            Some(vec![op_add_range(4, "x\n")]),
            Action::Local,
        )
        .with_conflict(true);

        assert_eq!(
            split_decision_on_chunks(BASE, &decision).unwrap(),
            vec![
                MergeDecision::new(
                    vec![],
                    Some(vec![op_remove_range(0, 4)]),
                    Some(vec![op_add_range(4, "x\n")]),
                    Action::Local,
                )
                .with_conflict(true),
                MergeDecision::new(vec![], Some(vec![op_remove_range(14, 5)]), None, Action::Local),
            ]
        );
    }

    #[test]
    fn test_single_region_is_kept() {
        let decision = MergeDecision::new(
            vec![],
            Some(vec![op_remove_range(4, 2)]),
            Some(vec![op_remove_range(5, 3)]),
            Action::Remote,
        )
        .with_conflict(true);

        assert_eq!(split_decision_on_chunks(BASE, &decision).unwrap(), vec![decision]);
    }

    #[test]
    fn test_custom_is_kept() {
        let decision = MergeDecision::new(
            vec![],
            Some(vec![op_add_range(0, "a")]),
            Some(vec![op_add_range(19, "b")]),
            Action::Custom,
        )
        .with_custom_diff(vec![]);

        assert_eq!(split_decision_on_chunks(BASE, &decision).unwrap(), vec![decision]);
    }

    #[test]
    fn test_invalid_diff() {
        let decision = MergeDecision::new(
            vec![],
            Some(vec![op_remove_range(18, 5)]),
            None,
            Action::Local,
        );

        assert!(matches!(
            split_decision_on_chunks(BASE, &decision),
            Err(Error::Validation(_))
        ));
    }
}
