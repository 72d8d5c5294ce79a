//! Row exclusion ahead of aggregation.
//!
//! Each chart selects its rows with a plain predicate. Filtering never mutates
//! or reorders the input; it returns borrowed records in source order.

use tracing::warn;

use crate::config::{ChartConfig, NanPolicy};
use crate::record::TransactionRecord;

/// Returns the records satisfying `predicate`, in input order.
pub fn filter_records<'a, I, P>(records: I, predicate: P) -> Vec<&'a TransactionRecord>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
    P: Fn(&TransactionRecord) -> bool,
{
    records.into_iter().filter(|r| predicate(r)).collect()
}

/// `year_min <= year < year_max_exclusive`. NaN years never match.
pub fn in_year_range(record: &TransactionRecord, year_min: i32, year_max_exclusive: i32) -> bool {
    record.year >= year_min as f64 && record.year < year_max_exclusive as f64
}

/// `odometer < ceiling`. NaN readings never match.
pub fn below_odometer_ceiling(record: &TransactionRecord, ceiling: f64) -> bool {
    record.odometer < ceiling
}

/// Exact, case-sensitive match on both make and model.
pub fn matches_make_model(record: &TransactionRecord, make: &str, model: &str) -> bool {
    record.make == make && record.model == model
}

/// Rows for the yearly trend.
pub fn yearly_rows<'a>(
    records: &'a [TransactionRecord],
    config: &ChartConfig,
) -> Vec<&'a TransactionRecord> {
    filter_records(records, |r| {
        in_year_range(r, config.year_min, config.year_max_exclusive)
    })
}

/// Rows for both odometer charts.
pub fn odometer_rows<'a>(
    records: &'a [TransactionRecord],
    config: &ChartConfig,
) -> Vec<&'a TransactionRecord> {
    filter_records(records, |r| {
        below_odometer_ceiling(r, config.odometer_ceiling)
    })
}

/// Applies `policy` to already-filtered rows.
///
/// `fields` picks the numbers a chart depends on. Under
/// [`NanPolicy::Reject`] any row with a non-finite field is dropped; the
/// second value is how many were dropped.
pub fn apply_nan_policy<'a, F>(
    rows: Vec<&'a TransactionRecord>,
    policy: NanPolicy,
    fields: F,
) -> (Vec<&'a TransactionRecord>, usize)
where
    F: Fn(&TransactionRecord) -> [f64; 2],
{
    match policy {
        NanPolicy::Propagate => (rows, 0),
        NanPolicy::Reject => {
            let before = rows.len();
            let kept: Vec<_> = rows
                .into_iter()
                .filter(|r| fields(r).iter().all(|v| v.is_finite()))
                .collect();
            let rejected = before - kept.len();
            if rejected > 0 {
                warn!(rejected, "Rows with non-finite values rejected");
            }
            (kept, rejected)
        }
    }
}
