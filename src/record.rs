//! Record model for one vehicle sale.
//!
//! Numeric cells are coerced rather than validated: a cell that does not parse
//! becomes NaN and stays in the dataset. Filtering is always an explicit,
//! downstream step.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

/// One dataset row exactly as read, before any coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub year: String,
    pub make: String,
    pub model: String,
    pub body: String,
    pub transmission: String,
    pub state: String,
    pub condition: String,
    pub odometer: String,
    pub selling_price: String,
    pub sale_date: String,
}

/// Parsed sale date, or the sentinel for text that is not a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SaleDate {
    Valid(DateTime<FixedOffset>),
    #[default]
    Invalid,
}

impl SaleDate {
    pub fn parse(raw: &str) -> Self {
        parse_sale_date(raw).map_or(SaleDate::Invalid, SaleDate::Valid)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SaleDate::Valid(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Model year. Kept as `f64` so an unparsable year can be carried as NaN.
    pub year: f64,
    pub make: String,
    pub model: String,
    pub body: String,
    pub transmission: String,
    pub state: String,
    pub condition: f64,
    /// Miles.
    pub odometer: f64,
    pub selling_price: f64,
    pub sale_date: SaleDate,
}

impl TransactionRecord {
    pub fn from_raw(raw: &RawRow) -> Self {
        TransactionRecord {
            year: coerce_number(&raw.year),
            make: raw.make.clone(),
            model: raw.model.clone(),
            body: raw.body.clone(),
            transmission: raw.transmission.clone(),
            state: raw.state.clone(),
            condition: coerce_number(&raw.condition),
            odometer: coerce_number(&raw.odometer),
            selling_price: coerce_number(&raw.selling_price),
            sale_date: SaleDate::parse(&raw.sale_date),
        }
    }

    /// The model year when it is a finite whole number.
    pub fn model_year(&self) -> Option<i32> {
        if self.year.is_finite() && self.year.fract() == 0.0 {
            Some(self.year as i32)
        } else {
            None
        }
    }

    /// `true` when any numeric cell failed to coerce.
    pub fn has_malformed_numbers(&self) -> bool {
        [self.year, self.condition, self.odometer, self.selling_price]
            .iter()
            .any(|v| v.is_nan())
    }

    /// Builder pattern: set the model year
    pub fn with_year(mut self, year: f64) -> Self {
        self.year = year;
        self
    }

    /// Builder pattern: set make and model
    pub fn with_make_model(mut self, make: &str, model: &str) -> Self {
        self.make = make.to_string();
        self.model = model.to_string();
        self
    }

    /// Builder pattern: set the odometer reading
    pub fn with_odometer(mut self, odometer: f64) -> Self {
        self.odometer = odometer;
        self
    }

    /// Builder pattern: set the selling price
    pub fn with_selling_price(mut self, price: f64) -> Self {
        self.selling_price = price;
        self
    }
}

/// Coerces a text cell to a number.
///
/// Surrounding whitespace is ignored and a blank cell reads as `0`. Any other
/// text that is not a number yields NaN. The only spelled-out infinity is
/// `Infinity`; `inf`, `infinity` and `NaN` read as NaN.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let parsed = trimmed.parse::<f64>().unwrap_or(f64::NAN);
    if parsed.is_finite() {
        return parsed;
    }

    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) && unsigned != "Infinity" {
        return f64::NAN;
    }
    parsed
}

/// Parses the date forms found in sale exports.
///
/// Accepts `Tue Dec 16 2014 12:30:00 GMT-0800 (PST)`, RFC 3339 and plain
/// `YYYY-MM-DD` (taken as UTC midnight).
pub fn parse_sale_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Drop the trailing "(PST)" style zone name
    let without_zone_name = match trimmed.rfind(" (") {
        Some(idx) if trimmed.ends_with(')') => &trimmed[..idx],
        _ => trimmed,
    };

    if let Ok(dt) = DateTime::parse_from_str(without_zone_name, "%a %b %d %Y %H:%M:%S GMT%z") {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}
