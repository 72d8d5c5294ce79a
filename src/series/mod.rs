//! Per-chart series builders.
//!
//! Each builder runs filter, aggregate and annotate over the full record set
//! and returns plain value objects. Nothing is cached between refreshes: the
//! axis domain is rebuilt alongside every series.

pub mod make_model;
pub mod odometer;
pub mod yearly;

use serde::Serialize;

use crate::aggregation::utility::{max_or_zero, nice_max};
use crate::config::ChartConfig;
use crate::dataset::{Dataset, ParseDiagnostics};

pub use make_model::{MakeModelExplorer, MakeModelKey, MakeModelTrend, SelectOption};
pub use odometer::{OdometerTrend, build_odometer_trend};
pub use yearly::{YearlyTrend, build_yearly_trend, year_over_year_change};

pub const PRICE_AXIS_LABEL: &str = "Average Selling Price ($)";
pub const YEAR_AXIS_LABEL: &str = "Year";
pub const ODOMETER_AXIS_LABEL: &str = "Odometer Reading (miles)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    YearlyTrend,
    OdometerTrend,
    MakeModelTrend,
}

/// One plotted point in data coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub highlighted: bool,
    /// Hover text.
    pub label: String,
}

/// Text label anchored at `(x, y)` and drawn at `(x + dx, y + dy)` screen offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub wrap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum XDomain {
    /// Ordered categories, one band each.
    Band { values: Vec<i32> },
    Linear { min: f64, max: f64 },
}

/// Scale hints for one refresh. The y axis always starts at zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisDomain {
    pub x: XDomain,
    pub y_max: f64,
}

impl AxisDomain {
    /// Domain for `points`; `y_max` is the rounded-up largest y, 0 when empty.
    pub fn fit(x: XDomain, points: &[ChartPoint]) -> Self {
        let y_max = nice_max(max_or_zero(points.iter().map(|p| p.y)));
        AxisDomain { x, y_max }
    }
}

/// A finished chart ready for the presenter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
    pub annotation: Option<Annotation>,
    pub domain: AxisDomain,
    /// Rows dropped for non-finite values under the reject policy.
    pub rejected_rows: usize,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn highlighted(&self) -> Option<&ChartPoint> {
        self.points.iter().find(|p| p.highlighted)
    }
}

/// All three charts built from one dataset load.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub diagnostics: ParseDiagnostics,
    pub yearly: ChartSeries,
    pub odometer: ChartSeries,
    pub make_model_options: Vec<SelectOption>,
    pub make_model: Option<ChartSeries>,
}

/// Builds every chart, applying the explorer's default selection.
pub fn build_dashboard(dataset: &Dataset, config: &ChartConfig) -> Dashboard {
    let records = dataset.records();
    let explorer = MakeModelExplorer::new(records, config);

    Dashboard {
        diagnostics: dataset.diagnostics(),
        yearly: build_yearly_trend(records, config).to_series(),
        odometer: build_odometer_trend(records, config).to_series(config),
        make_model_options: explorer.options(),
        make_model: explorer.current().cloned(),
    }
}

/// Whole-dollar price text.
fn dollars(value: f64) -> String {
    format!("${value:.0}")
}
