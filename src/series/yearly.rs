//! Average selling price per model year.

use tracing::debug;

use crate::aggregation::utility::percent_change;
use crate::aggregation::{YearlyPoint, group_mean_by_key};
use crate::config::ChartConfig;
use crate::filter::{apply_nan_policy, yearly_rows};
use crate::record::TransactionRecord;
use crate::series::{
    Annotation, AxisDomain, ChartKind, ChartPoint, ChartSeries, PRICE_AXIS_LABEL, XDomain,
    YEAR_AXIS_LABEL, dollars,
};

const ANNOTATION_DX: f64 = -20.0;
const ANNOTATION_DY: f64 = -30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct YearlyTrend {
    /// Ascending by year.
    pub points: Vec<YearlyPoint>,
    pub highlighted_year: i32,
    pub reference_year: i32,
    /// Change from the reference year to the highlighted year, in percent.
    pub percent_change: f64,
    pub rejected_rows: usize,
}

/// Groups the in-range rows by model year and averages their selling price.
///
/// Rows are keyed on [`TransactionRecord::model_year`], so a fractional year
/// such as `2010.5` is left out rather than merged into `2010`.
pub fn build_yearly_trend(records: &[TransactionRecord], config: &ChartConfig) -> YearlyTrend {
    let rows = yearly_rows(records, config);
    let (rows, rejected_rows) =
        apply_nan_policy(rows, config.nan_policy, |r| [r.year, r.selling_price]);

    let keyed = rows
        .into_iter()
        .filter_map(|r| r.model_year().map(|year| (year, r.selling_price)));
    let points: Vec<YearlyPoint> =
        group_mean_by_key(keyed, |(year, _)| *year, |(_, price)| *price)
            .into_iter()
            .map(YearlyPoint::from)
            .collect();

    let reference_year = config.reference_year();
    let change = year_over_year_change(&points, reference_year, config.highlighted_year);

    debug!(
        years = points.len(),
        highlighted_year = config.highlighted_year,
        percent_change = change,
        "Yearly trend built"
    );

    YearlyTrend {
        points,
        highlighted_year: config.highlighted_year,
        reference_year,
        percent_change: change,
        rejected_rows,
    }
}

/// Percent change of the mean price from `from_year` to `to_year`.
///
/// Returns 0 when either year is missing from `points`.
pub fn year_over_year_change(points: &[YearlyPoint], from_year: i32, to_year: i32) -> f64 {
    let find = |year: i32| points.iter().find(|p| p.year == year);

    match (find(from_year), find(to_year)) {
        (Some(from), Some(to)) => percent_change(from.mean_value, to.mean_value),
        _ => 0.0,
    }
}

impl YearlyTrend {
    pub fn point(&self, year: i32) -> Option<&YearlyPoint> {
        self.points.iter().find(|p| p.year == year)
    }

    /// Label on the highlighted year's point; `None` if that year has no sales.
    pub fn annotation(&self) -> Option<Annotation> {
        let anchor = self.point(self.highlighted_year)?;

        let label = if self.percent_change < 0.0 {
            format!("{:.1}% decrease from previous year.", -self.percent_change)
        } else {
            format!("+{:.1}% increase from previous year.", self.percent_change)
        };

        Some(Annotation {
            label,
            x: anchor.year as f64,
            y: anchor.mean_value,
            dx: ANNOTATION_DX,
            dy: ANNOTATION_DY,
            wrap: None,
        })
    }

    pub fn to_series(&self) -> ChartSeries {
        let points: Vec<ChartPoint> = self
            .points
            .iter()
            .map(|p| ChartPoint {
                x: p.year as f64,
                y: p.mean_value,
                highlighted: p.year == self.highlighted_year,
                label: format!("{}: {}", p.year, dollars(p.mean_value)),
            })
            .collect();

        let years = self.points.iter().map(|p| p.year).collect();

        ChartSeries {
            kind: ChartKind::YearlyTrend,
            title: "Average Selling Price by Model Year".to_string(),
            x_label: YEAR_AXIS_LABEL.to_string(),
            y_label: PRICE_AXIS_LABEL.to_string(),
            domain: AxisDomain::fit(XDomain::Band { values: years }, &points),
            annotation: self.annotation(),
            points,
            rejected_rows: self.rejected_rows,
        }
    }
}
