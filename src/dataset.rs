//! Dataset loader.
//!
//! Reads the sale export (plain or gzip-compressed CSV, local or remote) into
//! an immutable [`Dataset`]. Row-level parse problems never fail a load; they
//! are counted in [`ParseDiagnostics`]. Anything that prevents reading the
//! table as a whole is a [`LoadError`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::record::{RawRow, TransactionRecord};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const COLUMN_COUNT: usize = 10;

/// Columns every source must provide.
pub const REQUIRED_COLUMNS: [&str; COLUMN_COUNT] = [
    "year",
    "make",
    "model",
    "body",
    "transmission",
    "state",
    "condition",
    "odometer",
    "sellingprice",
    "saledate",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to download dataset '{url}': {message}")]
    Fetch { url: String, message: String },
    #[error("failed to decompress dataset")]
    Decompress(#[source] std::io::Error),
    #[error("malformed CSV table")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Counts of rows whose cells fell back to a sentinel during coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostics {
    pub rows: usize,
    pub malformed_numeric_rows: usize,
    pub invalid_date_rows: usize,
}

impl ParseDiagnostics {
    fn record(&mut self, record: &TransactionRecord) {
        self.rows += 1;
        if record.has_malformed_numbers() {
            self.malformed_numeric_rows += 1;
        }
        if !record.sale_date.is_valid() {
            self.invalid_date_rows += 1;
        }
    }
}

/// Loaded records. Read-only for the rest of the session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<TransactionRecord>,
    diagnostics: ParseDiagnostics,
}

impl Dataset {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        let mut diagnostics = ParseDiagnostics::default();
        for record in &records {
            diagnostics.record(record);
        }
        Self {
            records,
            diagnostics,
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn diagnostics(&self) -> ParseDiagnostics {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Header positions of the required columns.
struct ColumnIndex {
    positions: [usize; COLUMN_COUNT],
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let mut positions = [0usize; COLUMN_COUNT];
        let mut missing = Vec::new();

        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            match normalized.iter().position(|h| h == name) {
                Some(pos) => positions[slot] = pos,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        Ok(Self { positions })
    }

    fn raw_row(&self, record: &StringRecord) -> RawRow {
        // Ragged rows read missing cells as empty
        let cell = |slot: usize| record.get(self.positions[slot]).unwrap_or("").to_string();

        RawRow {
            year: cell(0),
            make: cell(1),
            model: cell(2),
            body: cell(3),
            transmission: cell(4),
            state: cell(5),
            condition: cell(6),
            odometer: cell(7),
            selling_price: cell(8),
            sale_date: cell(9),
        }
    }
}

/// Parses an uncompressed CSV table.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let columns = ColumnIndex::resolve(rdr.headers()?)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(TransactionRecord::from_raw(&columns.raw_row(&row)));
    }

    let dataset = Dataset::new(records);
    let diagnostics = dataset.diagnostics();

    info!(
        rows = diagnostics.rows,
        malformed_numeric_rows = diagnostics.malformed_numeric_rows,
        invalid_date_rows = diagnostics.invalid_date_rows,
        "Dataset loaded"
    );
    if diagnostics.malformed_numeric_rows > 0 {
        warn!(
            malformed_numeric_rows = diagnostics.malformed_numeric_rows,
            "Some rows carry non-numeric values and were kept as NaN"
        );
    }

    Ok(dataset)
}

/// Parses a table held in memory, inflating it first if it is gzip-compressed.
pub fn load_from_bytes(bytes: &[u8]) -> Result<Dataset, LoadError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut inflated)
            .map_err(LoadError::Decompress)?;
        return load_from_reader(inflated.as_slice());
    }

    load_from_reader(bytes)
}

#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_bytes(&bytes)
}

#[tracing::instrument(skip(client))]
pub async fn load_from_url<C: HttpClient>(client: &C, url: &str) -> Result<Dataset, LoadError> {
    let bytes = fetch_bytes(client, url)
        .await
        .map_err(|e| LoadError::Fetch {
            url: url.to_string(),
            message: format!("{e:#}"),
        })?;
    load_from_bytes(&bytes)
}

/// `true` for `http://` and `https://` sources.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads from a URL when `source` is one, otherwise from the filesystem.
///
/// `timeout` bounds a remote download; local reads ignore it.
pub async fn load_source(source: &str, timeout: Option<Duration>) -> Result<Dataset, LoadError> {
    if !is_remote(source) {
        return load_from_path(source);
    }

    let client = match timeout {
        Some(timeout) => BasicClient::with_timeout(timeout).map_err(|e| LoadError::Fetch {
            url: source.to_string(),
            message: e.to_string(),
        })?,
        None => BasicClient::new(),
    };
    load_from_url(&client, source).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const HEADER: &str =
        "year,make,model,trim,body,transmission,vin,state,condition,odometer,color,interior,seller,mmr,sellingprice,saledate";

    fn table(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out.push('\n');
        out
    }

    #[test]
    fn test_load_reads_required_columns_and_ignores_extra() {
        let csv = table(&[
            "2015,Kia,Sorento,LX,SUV,automatic,5xyktca69fg566472,ca,5,16639,white,black,kia motors america inc,20500,21500,Tue Dec 16 2014 12:30:00 GMT-0800 (PST)",
        ]);
        let dataset = load_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 1);
        let record = &dataset.records()[0];
        assert_eq!(record.model_year(), Some(2015));
        assert_eq!(record.make, "Kia");
        assert_eq!(record.state, "ca");
        assert_eq!(record.odometer, 16639.0);
        assert_eq!(record.selling_price, 21500.0);
        assert!(record.sale_date.is_valid());
        assert_eq!(dataset.diagnostics().malformed_numeric_rows, 0);
    }

    #[test]
    fn test_load_keeps_malformed_rows_and_counts_them() {
        let csv = table(&[
            "2014,BMW,3 Series,328i,Sedan,automatic,vin1,ca,45,1331,gray,black,seller,31900,30000,Thu Jan 15 2015 04:30:00 GMT-0800 (PST)",
            "2014,BMW,3 Series,328i,Sedan,automatic,vin2,ca,45,lots,gray,black,seller,31900,30000,not a date",
        ]);
        let dataset = load_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(dataset.records()[1].odometer.is_nan());
        assert_eq!(
            dataset.diagnostics(),
            ParseDiagnostics {
                rows: 2,
                malformed_numeric_rows: 1,
                invalid_date_rows: 1,
            }
        );
    }

    #[test]
    fn test_load_tolerates_ragged_rows() {
        let csv = table(&["2012,Ford,Fusion"]);
        let dataset = load_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 1);
        let record = &dataset.records()[0];
        assert_eq!(record.model, "Fusion");
        assert_eq!(record.odometer, 0.0);
        assert!(!record.sale_date.is_valid());
    }

    #[test]
    fn test_load_missing_columns_is_fatal() {
        let csv = "year,make,model\n2012,Ford,Fusion\n";
        match load_from_reader(csv.as_bytes()) {
            Err(LoadError::MissingColumns(missing)) => {
                assert!(missing.contains(&"odometer".to_string()));
                assert!(missing.contains(&"sellingprice".to_string()));
                assert!(!missing.contains(&"make".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let csv = "Year,Make,Model,Body,Transmission,State,Condition,Odometer,SellingPrice,SaleDate\n\
                   2010,Honda,Accord,Sedan,automatic,fl,30,90000,8000,2015-02-01\n";
        let dataset = load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records()[0].selling_price, 8000.0);
    }

    #[test]
    fn test_load_from_bytes_inflates_gzip() {
        let csv = table(&[
            "2011,Nissan,Altima,2.5 S,Sedan,automatic,vin3,tx,30,80000,black,gray,seller,9000,9500,2015-02-03",
        ]);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(csv.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let dataset = load_from_bytes(&compressed).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].model, "Altima");
    }

    #[test]
    fn test_load_from_bytes_corrupt_gzip() {
        let bytes = [0x1f, 0x8b, 0x00, 0x01, 0x02];
        assert!(matches!(
            load_from_bytes(&bytes),
            Err(LoadError::Decompress(_))
        ));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let result = load_from_path("/definitely/not/here/car_prices.csv");
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_is_remote_needs_a_scheme() {
        assert!(is_remote("http://example.com/car_prices.csv"));
        assert!(is_remote("https://example.com/car_prices.csv.gz"));
        assert!(!is_remote("httpd_export.csv"));
        assert!(!is_remote("http_dump/car_prices.csv"));
        assert!(!is_remote("data/car_prices.csv"));
    }

    #[tokio::test]
    async fn test_load_source_treats_http_prefixed_file_as_local() {
        let result = load_source("httpd_export_missing.csv", None).await;
        match result {
            Err(LoadError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("httpd_export_missing.csv"));
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_source_with_timeout_reports_fetch_error() {
        let result = load_source(
            "http://[not-a-host/car_prices.csv",
            Some(Duration::from_secs(1)),
        )
        .await;
        assert!(matches!(result, Err(LoadError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_load_from_url_invalid_url_is_fetch_error() {
        let result = load_from_url(&BasicClient::new(), "http//broken").await;
        assert!(matches!(result, Err(LoadError::Fetch { .. })));
    }
}
