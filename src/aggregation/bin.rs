use std::collections::BTreeMap;

use tracing::debug;

use crate::aggregation::types::BinnedPoint;

/// Bins `items` into `[0, bin_size), [bin_size, 2 * bin_size), ...` up to
/// `range_max` on `bin_value` and averages `avg_value` inside each bin.
///
/// Only bins with at least one item are returned, ascending by start. Items
/// whose binning value is negative, at or beyond `range_max`, or NaN fall in
/// no bin. A non-positive or non-finite `bin_size` yields an empty series.
pub fn bin_mean<T, BF, VF>(
    items: impl IntoIterator<Item = T>,
    bin_value: BF,
    avg_value: VF,
    bin_size: f64,
    range_max: f64,
) -> Vec<BinnedPoint>
where
    BF: Fn(&T) -> f64,
    VF: Fn(&T) -> f64,
{
    if !(bin_size.is_finite() && bin_size > 0.0) || !(range_max > 0.0) {
        return Vec::new();
    }

    // Sparse so a huge range never allocates per bin
    let last_index = ((range_max / bin_size).ceil() as u64).saturating_sub(1);
    let mut sums: BTreeMap<u64, (f64, usize)> = BTreeMap::new();

    for item in items {
        let v = bin_value(&item);
        if let Some(idx) = bin_index(v, bin_size, range_max, last_index) {
            let entry = sums.entry(idx).or_insert((0.0, 0));
            entry.0 += avg_value(&item);
            entry.1 += 1;
        }
    }

    let points: Vec<BinnedPoint> = sums
        .into_iter()
        .map(|(idx, (sum, count))| {
            let bin_start = idx as f64 * bin_size;
            BinnedPoint {
                bin_start,
                bin_end: bin_start + bin_size,
                mean_value: sum / count as f64,
                count,
            }
        })
        .collect();

    debug!(bins = points.len(), bin_size, range_max, "Binned mean computed");

    points
}

/// Index of the half-open bin holding `v`, if any.
fn bin_index(v: f64, bin_size: f64, range_max: f64, last_index: u64) -> Option<u64> {
    if !(v >= 0.0 && v < range_max) {
        return None;
    }

    let mut idx = ((v / bin_size).floor() as u64).min(last_index);

    // Division can round across an edge; settle on the bin whose bounds hold v
    if idx > 0 && v < idx as f64 * bin_size {
        idx -= 1;
    } else if idx < last_index && v >= (idx + 1) as f64 * bin_size {
        idx += 1;
    }

    Some(idx)
}
