//! Spreadsheet loader.
//!
//! Both raw sheets are wide: one row per date (and station), one column per
//! hour or per destination. The loaders melt them into the long,
//! one-record-per-cell layout that is published.

mod cells;
mod station_hourly;
mod station_pair;

pub use station_hourly::{load_station_hourly, read_station_hourly};
pub use station_pair::{load_station_pair_hourly, read_station_pair_hourly};

pub(crate) const BUSINESS_DATE: &str = "BUSINESS DATE";
pub(crate) const STATION: &str = "STATION";
pub(crate) const TOTAL: &str = "TOTAL";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{sheet} sheet has no {column:?} column")]
    MissingColumn {
        sheet: &'static str,
        column: &'static str,
    },
    #[error("{sheet} sheet line {line}: invalid business date {value:?}")]
    InvalidDate {
        sheet: &'static str,
        line: u64,
        value: String,
    },
    #[error("{sheet} sheet line {line}: invalid ridership {value:?} in column {column:?}")]
    InvalidRidership {
        sheet: &'static str,
        line: u64,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Options for reading a delimited-text export of a raw sheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetFormat {
    pub delimiter: u8,
}

impl Default for SheetFormat {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

fn column_index(
    headers: &csv::StringRecord,
    sheet: &'static str,
    column: &'static str,
) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or(IngestError::MissingColumn { sheet, column })
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}
