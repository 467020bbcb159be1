use crate::{dom::{BoundingBox, NodeId},
            matching::groups::MatchGroup};
use std::cmp::Ordering;

/// Tops closer than this (in pixels) are read as one row
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// Order groups in reading order: top to bottom, then left to right within a row
///
/// The key of a group is the layout box of its first element. Two keys whose
/// tops differ by more than `threshold` are ordered by top, otherwise by left.
/// That pairwise rule is not transitive, so rows are formed explicitly: keys
/// are sorted by top, a row starts at the first key more than `threshold`
/// below the current row's first top, and each row is ordered by left. Both
/// sorts are stable. Elements without layout sort as `(0, 0)`.
pub fn sort_by_position<F>(groups: Vec<MatchGroup>, threshold: f64, bounds: F) -> Vec<MatchGroup>
where
    F: Fn(NodeId) -> Option<BoundingBox>,
{
    let mut keyed: Vec<((f64, f64), MatchGroup)> = groups
        .into_iter()
        .map(|group| {
            let key = group
                .first()
                .and_then(&bounds)
                .map(|b| (b.top(), b.left()))
                .unwrap_or((0.0, 0.0));
            (key, group)
        })
        .collect();

    keyed.sort_by(|a, b| compare(a.0.0, b.0.0));

    let mut sorted = Vec::with_capacity(keyed.len());
    let mut row: Vec<((f64, f64), MatchGroup)> = Vec::new();
    let mut row_top = 0.0;

    for entry in keyed {
        if !row.is_empty() && entry.0.0 - row_top > threshold {
            flush_row(&mut row, &mut sorted);
        }
        if row.is_empty() {
            row_top = entry.0.0;
        }
        row.push(entry);
    }
    flush_row(&mut row, &mut sorted);

    sorted
}

fn flush_row(row: &mut Vec<((f64, f64), MatchGroup)>, out: &mut Vec<MatchGroup>) {
    row.sort_by(|a, b| compare(a.0.1, b.0.1));
    out.extend(row.drain(..).map(|(_, group)| group));
}

fn compare(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
