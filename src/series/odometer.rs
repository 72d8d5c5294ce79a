//! Average selling price per odometer bin across all sales.

use tracing::debug;

use crate::aggregation::{BinnedPoint, bin_mean};
use crate::config::ChartConfig;
use crate::filter::{apply_nan_policy, odometer_rows};
use crate::record::TransactionRecord;
use crate::series::{
    Annotation, AxisDomain, ChartKind, ChartPoint, ChartSeries, ODOMETER_AXIS_LABEL,
    PRICE_AXIS_LABEL, XDomain, dollars,
};

#[derive(Debug, Clone, PartialEq)]
pub struct OdometerTrend {
    /// Non-empty bins, ascending by start.
    pub bins: Vec<BinnedPoint>,
    pub rejected_rows: usize,
}

pub fn build_odometer_trend(records: &[TransactionRecord], config: &ChartConfig) -> OdometerTrend {
    let rows = odometer_rows(records, config);
    let (rows, rejected_rows) =
        apply_nan_policy(rows, config.nan_policy, |r| [r.odometer, r.selling_price]);

    let bins = bin_mean(
        rows,
        |r| r.odometer,
        |r| r.selling_price,
        config.bin_size,
        config.odometer_ceiling,
    );

    debug!(bins = bins.len(), "Odometer trend built");

    OdometerTrend {
        bins,
        rejected_rows,
    }
}

impl OdometerTrend {
    pub fn to_series(&self, config: &ChartConfig) -> ChartSeries {
        let points: Vec<ChartPoint> = self
            .bins
            .iter()
            .map(|b| ChartPoint {
                x: b.midpoint(),
                y: b.mean_value,
                highlighted: b.bin_start == config.highlighted_bin_start,
                label: format!(
                    "Odometer: {} - {} miles\nAvg Price: {}",
                    b.bin_start,
                    b.bin_end,
                    dollars(b.mean_value)
                ),
            })
            .collect();

        let plateau = &config.plateau_annotation;

        ChartSeries {
            kind: ChartKind::OdometerTrend,
            title: "Average Selling Price by Odometer Reading".to_string(),
            x_label: ODOMETER_AXIS_LABEL.to_string(),
            y_label: PRICE_AXIS_LABEL.to_string(),
            domain: AxisDomain::fit(
                XDomain::Linear {
                    min: 0.0,
                    max: config.odometer_ceiling,
                },
                &points,
            ),
            annotation: Some(Annotation {
                label: plateau.label.clone(),
                x: plateau.x,
                y: plateau.y,
                dx: plateau.dx,
                dy: plateau.dy,
                wrap: plateau.wrap,
            }),
            points,
            rejected_rows: self.rejected_rows,
        }
    }
}
