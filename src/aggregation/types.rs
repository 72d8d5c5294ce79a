//! Points produced by the aggregation primitives. Recomputed on every call.

use serde::Serialize;

/// Mean of every value sharing one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedMean<K> {
    pub key: K,
    pub mean: f64,
    pub count: usize,
}

/// Mean over one half-open bin `[bin_start, bin_end)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedPoint {
    pub bin_start: f64,
    pub bin_end: f64,
    pub mean_value: f64,
    pub count: usize,
}

impl BinnedPoint {
    pub fn midpoint(&self) -> f64 {
        (self.bin_start + self.bin_end) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyPoint {
    pub year: i32,
    pub mean_value: f64,
}

impl From<KeyedMean<i32>> for YearlyPoint {
    fn from(group: KeyedMean<i32>) -> Self {
        YearlyPoint {
            year: group.key,
            mean_value: group.mean,
        }
    }
}
