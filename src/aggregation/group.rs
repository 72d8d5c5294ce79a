use std::collections::BTreeMap;

use tracing::debug;

use crate::aggregation::types::KeyedMean;

/// Groups `items` by `key_fn` and averages `value_fn` within each group.
///
/// One entry per distinct key present in the input, ascending by key. Keys
/// with no items never appear.
pub fn group_mean_by_key<T, K, KF, VF>(
    items: impl IntoIterator<Item = T>,
    key_fn: KF,
    value_fn: VF,
) -> Vec<KeyedMean<K>>
where
    K: Ord,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> f64,
{
    let mut groups: BTreeMap<K, (f64, usize)> = BTreeMap::new();

    for item in items {
        let entry = groups.entry(key_fn(&item)).or_insert((0.0, 0));
        entry.0 += value_fn(&item);
        entry.1 += 1;
    }

    debug!(groups = groups.len(), "Grouped mean computed");

    groups
        .into_iter()
        .map(|(key, (sum, count))| KeyedMean {
            key,
            mean: sum / count as f64,
            count,
        })
        .collect()
}
