//! Interactive odometer chart for one make/model combination.
//!
//! The odometer filter runs once when the explorer is created. Every
//! selection change rebuilds the series from those rows and replaces the
//! previous one.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregation::{BinnedPoint, bin_mean};
use crate::config::ChartConfig;
use crate::filter::{apply_nan_policy, filter_records, matches_make_model, odometer_rows};
use crate::record::TransactionRecord;
use crate::series::{
    AxisDomain, ChartKind, ChartPoint, ChartSeries, ODOMETER_AXIS_LABEL, PRICE_AXIS_LABEL,
    XDomain, dollars,
};

const SEPARATOR: char = '|';
const PLACEHOLDER_TEXT: &str = "Select a Make & Model";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MakeModelKey {
    pub make: String,
    pub model: String,
}

impl MakeModelKey {
    pub fn new(make: &str, model: &str) -> Self {
        Self {
            make: make.to_string(),
            model: model.to_string(),
        }
    }

    /// Parses a `make|model` selection value.
    ///
    /// Returns `None` unless the value holds exactly one separator.
    pub fn parse(value: &str) -> Option<Self> {
        let (make, model) = value.split_once(SEPARATOR)?;
        if model.contains(SEPARATOR) {
            return None;
        }
        Some(Self::new(make, model))
    }

    /// `make|model`; also the catalog sort key.
    pub fn value(&self) -> String {
        format!("{}{}{}", self.make, SEPARATOR, self.model)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

/// One entry of the selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// Distinct make/model combinations in `records`, sorted by `make|model`.
pub fn make_model_catalog<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Vec<MakeModelKey> {
    let mut distinct: BTreeMap<String, MakeModelKey> = BTreeMap::new();
    for record in records {
        let key = MakeModelKey::new(&record.make, &record.model);
        distinct.entry(key.value()).or_insert(key);
    }
    distinct.into_values().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MakeModelTrend {
    pub key: MakeModelKey,
    /// Non-empty bins, ascending by start.
    pub bins: Vec<BinnedPoint>,
    pub rejected_rows: usize,
}

/// Bins the rows matching `key` exactly.
pub fn build_make_model_trend(
    rows: &[&TransactionRecord],
    key: &MakeModelKey,
    config: &ChartConfig,
) -> MakeModelTrend {
    let matching = filter_records(rows.iter().copied(), |r| {
        matches_make_model(r, &key.make, &key.model)
    });
    let (matching, rejected_rows) =
        apply_nan_policy(matching, config.nan_policy, |r| [r.odometer, r.selling_price]);

    let bins = bin_mean(
        matching,
        |r| r.odometer,
        |r| r.selling_price,
        config.bin_size,
        config.odometer_ceiling,
    );

    debug!(selection = %key.value(), bins = bins.len(), "Make/model trend built");

    MakeModelTrend {
        key: key.clone(),
        bins,
        rejected_rows,
    }
}

impl MakeModelTrend {
    /// Index of the bin with the highest mean, ignoring NaN means.
    fn peak_bin(&self) -> Option<usize> {
        self.bins
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.mean_value.is_nan())
            .fold(None, |best: Option<(usize, f64)>, (idx, b)| match best {
                Some((_, top)) if top >= b.mean_value => best,
                _ => Some((idx, b.mean_value)),
            })
            .map(|(idx, _)| idx)
    }

    pub fn to_series(&self, config: &ChartConfig) -> ChartSeries {
        let peak = self.peak_bin();

        let points: Vec<ChartPoint> = self
            .bins
            .iter()
            .enumerate()
            .map(|(idx, b)| ChartPoint {
                x: b.midpoint(),
                y: b.mean_value,
                highlighted: Some(idx) == peak,
                label: format!(
                    "Odometer: {}\nAvg Price: {}",
                    b.midpoint().round(),
                    dollars(b.mean_value)
                ),
            })
            .collect();

        ChartSeries {
            kind: ChartKind::MakeModelTrend,
            title: format!(
                "Average Selling Price by Odometer Reading: {}",
                self.key.display_name()
            ),
            x_label: ODOMETER_AXIS_LABEL.to_string(),
            y_label: PRICE_AXIS_LABEL.to_string(),
            domain: AxisDomain::fit(
                XDomain::Linear {
                    min: 0.0,
                    max: config.odometer_ceiling,
                },
                &points,
            ),
            annotation: None,
            points,
            rejected_rows: self.rejected_rows,
        }
    }
}

/// Selection state for the make/model chart.
pub struct MakeModelExplorer<'a> {
    rows: Vec<&'a TransactionRecord>,
    catalog: Vec<MakeModelKey>,
    config: ChartConfig,
    selection: Option<MakeModelKey>,
    current: Option<ChartSeries>,
}

impl<'a> MakeModelExplorer<'a> {
    /// Filters `records` once, builds the catalog and applies the configured
    /// default selection.
    pub fn new(records: &'a [TransactionRecord], config: &ChartConfig) -> Self {
        let rows = odometer_rows(records, config);
        let catalog = make_model_catalog(rows.iter().copied());

        info!(
            rows = rows.len(),
            combinations = catalog.len(),
            "Make/model catalog ready"
        );

        let mut explorer = Self {
            rows,
            catalog,
            config: config.clone(),
            selection: None,
            current: None,
        };
        let default_selection = explorer.config.default_selection.clone();
        explorer.on_selection_change(&default_selection);
        explorer
    }

    pub fn catalog(&self) -> &[MakeModelKey] {
        &self.catalog
    }

    /// Placeholder entry followed by every catalog combination.
    pub fn options(&self) -> Vec<SelectOption> {
        std::iter::once(SelectOption {
            value: String::new(),
            text: PLACEHOLDER_TEXT.to_string(),
        })
        .chain(self.catalog.iter().map(|key| SelectOption {
            value: key.value(),
            text: key.display_name(),
        }))
        .collect()
    }

    pub fn selection(&self) -> Option<&MakeModelKey> {
        self.selection.as_ref()
    }

    pub fn current(&self) -> Option<&ChartSeries> {
        self.current.as_ref()
    }

    /// Rebuilds the series for the `make|model` selection `value`.
    ///
    /// Catalog entries are matched on their own option value first, so a make
    /// or model containing `|` still selects itself. Otherwise the value is
    /// parsed; the placeholder (empty value) and values that do not parse
    /// leave the current series untouched and return `None`.
    pub fn on_selection_change(&mut self, value: &str) -> Option<&ChartSeries> {
        if value.is_empty() {
            return None;
        }

        let known = self.catalog.iter().find(|key| key.value() == value).cloned();
        let Some(key) = known.or_else(|| MakeModelKey::parse(value)) else {
            warn!(value, "Ignoring selection that is not a make|model pair");
            return None;
        };

        let trend = build_make_model_trend(&self.rows, &key, &self.config);
        if trend.bins.is_empty() {
            debug!(selection = value, "Selection has no rows below the odometer ceiling");
        }

        self.current = Some(trend.to_series(&self.config));
        self.selection = Some(key);
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(make: &str, model: &str, odometer: f64, price: f64) -> TransactionRecord {
        TransactionRecord::default()
            .with_make_model(make, model)
            .with_odometer(odometer)
            .with_selling_price(price)
    }

    fn records() -> Vec<TransactionRecord> {
        vec![
            sale("Ford", "F-150", 5_000.0, 30_000.0),
            sale("Ford", "F-150", 7_000.0, 28_000.0),
            sale("Ford", "F-150", 125_000.0, 9_000.0),
            sale("Ford", "Fusion", 40_000.0, 12_000.0),
            sale("Chevrolet", "Malibu", 60_000.0, 8_000.0),
            sale("Ford", "F-150", 400_000.0, 1_000.0),
            sale("", "", 10_000.0, 500.0),
        ]
    }

    #[test]
    fn test_key_parse_and_format() {
        let key = MakeModelKey::parse("Ford|F-150").unwrap();
        assert_eq!(key, MakeModelKey::new("Ford", "F-150"));
        assert_eq!(key.value(), "Ford|F-150");
        assert_eq!(key.display_name(), "Ford F-150");
        assert_eq!(MakeModelKey::parse("Ford"), None);
        assert_eq!(MakeModelKey::parse("|"), Some(MakeModelKey::new("", "")));
        assert_eq!(MakeModelKey::parse("A|B|C"), None);
    }

    #[test]
    fn test_catalog_value_with_separator_selects_itself() {
        let records = vec![
            sale("A|B", "C", 5_000.0, 4_000.0),
            sale("Ford", "F-150", 15_000.0, 9_000.0),
        ];
        let mut explorer = MakeModelExplorer::new(&records, &ChartConfig::default());

        let series = explorer.on_selection_change("A|B|C").unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].y, 4_000.0);
        assert_eq!(explorer.selection(), Some(&MakeModelKey::new("A|B", "C")));

        assert!(explorer.on_selection_change("X|Y|Z").is_none());
        assert_eq!(explorer.selection(), Some(&MakeModelKey::new("A|B", "C")));
    }

    #[test]
    fn test_catalog_is_distinct_and_sorted_on_combined_value() {
        let records = vec![
            sale("Ford", "Fusion", 1.0, 1.0),
            sale("Ford Motor", "Ranger", 1.0, 1.0),
            sale("Ford", "F-150", 1.0, 1.0),
            sale("Ford", "Fusion", 1.0, 1.0),
            sale("BMW", "X5", 1.0, 1.0),
        ];
        let values: Vec<String> = make_model_catalog(&records)
            .iter()
            .map(MakeModelKey::value)
            .collect();

        // ' ' sorts before '|', so "Ford Motor" precedes every "Ford|..."
        assert_eq!(
            values,
            vec!["BMW|X5", "Ford Motor|Ranger", "Ford|F-150", "Ford|Fusion"]
        );
    }

    #[test]
    fn test_explorer_applies_default_selection() {
        let records = records();
        let explorer = MakeModelExplorer::new(&records, &ChartConfig::default());

        assert_eq!(explorer.selection(), Some(&MakeModelKey::new("Ford", "F-150")));
        let series = explorer.current().unwrap();
        assert_eq!(series.kind, ChartKind::MakeModelTrend);

        let xs: Vec<f64> = series.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![5_000.0, 125_000.0]);
        assert_eq!(series.points[0].y, 29_000.0);
        assert_eq!(series.points[0].label, "Odometer: 5000\nAvg Price: $29000");
    }

    #[test]
    fn test_catalog_excludes_rows_above_ceiling_but_keeps_blank_names() {
        let mut records = records();
        records.push(sale("Tesla", "Model S", 500_000.0, 1.0));
        let explorer = MakeModelExplorer::new(&records, &ChartConfig::default());

        let values: Vec<String> = explorer.catalog().iter().map(MakeModelKey::value).collect();
        assert_eq!(
            values,
            vec!["Chevrolet|Malibu", "Ford|F-150", "Ford|Fusion", "|"]
        );
    }

    #[test]
    fn test_options_start_with_placeholder() {
        let records = records();
        let explorer = MakeModelExplorer::new(&records, &ChartConfig::default());
        let options = explorer.options();

        assert_eq!(options.len(), explorer.catalog().len() + 1);
        assert_eq!(options[0].value, "");
        assert_eq!(options[0].text, "Select a Make & Model");
        assert_eq!(
            options[1],
            SelectOption {
                value: "Chevrolet|Malibu".to_string(),
                text: "Chevrolet Malibu".to_string(),
            }
        );
    }

    #[test]
    fn test_selection_replaces_previous_series() {
        let records = records();
        let mut explorer = MakeModelExplorer::new(&records, &ChartConfig::default());

        let series = explorer.on_selection_change("Chevrolet|Malibu").unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].x, 65_000.0);
        assert_eq!(explorer.current().unwrap().points.len(), 1);
        assert_eq!(
            explorer.selection(),
            Some(&MakeModelKey::new("Chevrolet", "Malibu"))
        );
    }

    #[test]
    fn test_reselecting_is_idempotent() {
        let records = records();
        let mut explorer = MakeModelExplorer::new(&records, &ChartConfig::default());

        let first = explorer.on_selection_change("Ford|F-150").cloned().unwrap();
        let second = explorer.on_selection_change("Ford|F-150").cloned().unwrap();
        assert_eq!(first, second);
        for (a, b) in first.points.iter().zip(&second.points) {
            assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }

    #[test]
    fn test_placeholder_and_malformed_values_keep_current_series() {
        let records = records();
        let mut explorer = MakeModelExplorer::new(&records, &ChartConfig::default());
        let before = explorer.current().cloned();

        assert!(explorer.on_selection_change("").is_none());
        assert!(explorer.on_selection_change("Ford").is_none());
        assert_eq!(explorer.current().cloned(), before);
    }

    #[test]
    fn test_unknown_combination_gives_empty_series() {
        let records = records();
        let mut explorer = MakeModelExplorer::new(&records, &ChartConfig::default());

        let series = explorer.on_selection_change("Lada|Niva").unwrap();
        assert!(series.is_empty());
        assert_eq!(series.domain.y_max, 0.0);
        assert!(series.highlighted().is_none());
    }

    #[test]
    fn test_peak_bin_is_highlighted() {
        let records = records();
        let explorer = MakeModelExplorer::new(&records, &ChartConfig::default());
        let highlighted = explorer.current().unwrap().highlighted().unwrap();

        assert_eq!(highlighted.x, 5_000.0);
        assert_eq!(highlighted.y, 29_000.0);
    }
}
