use crate::diff::{Diff, DiffEntry, DiffOp, Key};

/// Brings a diff assembled from several sources into canonical form.
///
/// Entries are stably sorted by key with insertions in front of the other
/// operations at their key, patches of the same key are fused into one patch
/// (their nested diffs concatenated in order and combined recursively), and a
/// patch whose target is removed or replaced by another entry of the same
/// diff is dropped. The order of insertions sharing a key is preserved.
#[must_use]
pub fn combine_patches(diff: Diff) -> Diff {
    let mut entries = diff;
    entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut combined: Diff = Vec::with_capacity(entries.len());
    // Sorted by key, so a patch can only be discarded by a range removal
    // starting before it or by an entry sharing its key
    let mut removed_until = 0;
    let mut replaced: Option<Key> = None;

    for entry in entries {
        match entry.op {
            DiffOp::Patch { diff } => {
                let removed = entry.key.as_index().is_some_and(|index| index < removed_until);
                if removed || replaced.as_ref() == Some(&entry.key) {
                    continue;
                }

                if let Some(DiffEntry {
                    key,
                    op: DiffOp::Patch { diff: previous },
                    ..
                }) = combined.last_mut()
                {
                    if *key == entry.key {
                        if let Some(diff) = diff {
                            previous.get_or_insert_with(Vec::new).extend(diff);
                        }
                        continue;
                    }
                }

                combined.push(DiffEntry {
                    op: DiffOp::Patch { diff },
                    ..entry
                });
            }
            op => {
                let entry = DiffEntry { op, ..entry };
                match (&entry.op, &entry.key) {
                    (DiffOp::RemoveRange { length }, Key::Index(start)) => {
                        removed_until = removed_until.max(start.saturating_add(*length));
                    }
                    (DiffOp::Remove | DiffOp::Replace { .. }, key) => replaced = Some(key.clone()),
                    _ => {}
                }

                let same_key = combined
                    .iter()
                    .rposition(|other| other.key != entry.key)
                    .map_or(0, |index| index + 1);
                let tail = combined.split_off(same_key);
                combined.extend(tail.into_iter().filter(|other| {
                    !(matches!(other.op, DiffOp::Patch { .. }) && entry.overwrites(&other.key))
                }));
                combined.push(entry);
            }
        }
    }

    combined
        .into_iter()
        .map(|entry| match entry.op {
            DiffOp::Patch { diff: Some(diff) } => DiffEntry {
                op: DiffOp::Patch {
                    diff: Some(combine_patches(diff)),
                },
                ..entry
            },
            _ => entry,
        })
        .collect()
}
