//! Chart configuration.
//!
//! Every constant the three charts depend on lives here so a hosting page can
//! override them from a JSON file. Keys missing from the file keep their
//! defaults:
//! ```json
//! {
//!   "highlighted_year": 2012,
//!   "default_selection": "Honda|Accord",
//!   "nan_policy": "reject"
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How records carrying non-finite numbers are treated before aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanPolicy {
    /// Keep every row. A NaN averaged value contaminates its group mean.
    #[default]
    Propagate,
    /// Drop rows whose chart fields are not finite and count them.
    Reject,
}

/// Fixed text label placed on the odometer chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedAnnotation {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub wrap: Option<f64>,
}

impl Default for FixedAnnotation {
    fn default() -> Self {
        Self {
            label: "Price drop tends to plateau around $2,500".to_string(),
            x: 205_000.0,
            y: 2_500.0,
            dx: 40.0,
            dy: -50.0,
            wrap: Some(200.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Inclusive lower bound of the yearly chart.
    pub year_min: i32,
    /// Exclusive upper bound of the yearly chart.
    pub year_max_exclusive: i32,
    /// Year whose change against the previous year is annotated.
    pub highlighted_year: i32,
    /// Rows at or above this odometer reading are excluded; also the last bin edge.
    pub odometer_ceiling: f64,
    pub bin_size: f64,
    pub highlighted_bin_start: f64,
    pub plateau_annotation: FixedAnnotation,
    /// `make|model` selected when the explorer starts.
    pub default_selection: String,
    pub nan_policy: NanPolicy,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            year_min: 1990,
            year_max_exclusive: 2015,
            highlighted_year: 2011,
            odometer_ceiling: 350_000.0,
            bin_size: 10_000.0,
            highlighted_bin_start: 200_000.0,
            plateau_annotation: FixedAnnotation::default(),
            default_selection: "Ford|F-150".to_string(),
            nan_policy: NanPolicy::Propagate,
        }
    }
}

impl ChartConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read chart config '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid chart config '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// The year the highlighted year is compared against.
    pub fn reference_year(&self) -> i32 {
        self.highlighted_year - 1
    }
}
