//! Grouping and binning primitives.
//!
//! Both primitives return series sorted ascending by key, so callers never
//! re-sort. Means are plain `sum / count` in `f64`; a NaN averaged value
//! therefore makes its group's mean NaN.

pub mod bin;
pub mod group;
pub mod types;
pub mod utility;

pub use bin::bin_mean;
pub use group::group_mean_by_key;
pub use types::{BinnedPoint, KeyedMean, YearlyPoint};
