//! Aggregation core for the used-car price charts.
//!
//! Loads vehicle sale records, filters them per chart, aggregates them into
//! yearly and odometer-binned price means, and hands presenter-ready series
//! to the hosting page.

pub mod aggregation;
pub mod config;
pub mod dataset;
pub mod fetch;
pub mod filter;
pub mod output;
pub mod record;
pub mod series;

pub use config::{ChartConfig, NanPolicy};
pub use dataset::{Dataset, LoadError, ParseDiagnostics};
pub use record::{SaleDate, TransactionRecord};
pub use series::{ChartSeries, Dashboard, MakeModelExplorer, build_dashboard};
