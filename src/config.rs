//! Input and output locations for a conversion run.

use std::path::{Path, PathBuf};

use crate::ingest::SheetFormat;

pub const STATION_HOURLY: &str = "station-hourly";
pub const STATION_PAIR_HOURLY: &str = "stationpair-hourly";
pub const STATION_PAIR_REVENUE: &str = "stationpair-revenue";

/// Resolved paths for one run.
///
/// Defaults follow the repository layout: raw exports and reference data
/// under `raw/`, published datasets under `data/`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub station_hourly_sheet: PathBuf,
    pub station_pair_sheet: PathBuf,
    pub station_codes: PathBuf,
    pub station_names: PathBuf,
    pub fare_slabs: PathBuf,
    pub station_lines: PathBuf,
    pub output_dir: PathBuf,
    pub sheet_format: SheetFormat,
}

impl RunConfig {
    pub fn new(raw_dir: impl AsRef<Path>, output_dir: impl Into<PathBuf>) -> Self {
        let raw_dir = raw_dir.as_ref();
        Self {
            station_hourly_sheet: raw_dir.join("station-hourly.csv"),
            station_pair_sheet: raw_dir.join("stationpair-hourly.csv"),
            station_codes: raw_dir.join("station-codes.csv"),
            station_names: raw_dir.join("station-names.csv"),
            fare_slabs: raw_dir.join("fare-slabs.csv"),
            station_lines: raw_dir.join("station-lines.csv"),
            output_dir: output_dir.into(),
            sheet_format: SheetFormat::default(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.sheet_format = SheetFormat { delimiter };
        self
    }

    /// True when both fare reference files exist, so revenue can be built.
    pub fn has_fare_reference(&self) -> bool {
        self.fare_slabs.exists() && self.station_lines.exists()
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join("summary.json")
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new("raw", "data")
    }
}
