//! Dataset writer.
//!
//! Each dataset is published twice: as `<name>.parquet` and as
//! `<name>.csv.zip` holding `<name>.csv` (semicolon separated). A JSON run
//! summary lists what was written.

mod columnar;
mod csv_zip;
mod summary;

pub use columnar::{Column, ColumnValues, ParquetRows, write_parquet};
pub use csv_zip::write_csv_zip;
pub use summary::{DatasetSummary, RunSummary, update_summary, write_summary};

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::records::Tabular;

fn staged(dir: &Path, file: &str) -> PathBuf {
    dir.join(format!(".{file}.partial"))
}

fn discard(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                warn!(path = %path.display(), error = %e, "Could not remove file");
            }
            _ => {}
        }
    }
}

/// Writes both artifacts for `rows` into `dir` and returns their summary.
///
/// Both files are staged under temporary names and only moved into place
/// once both are complete, so a failure leaves the dataset untouched.
#[tracing::instrument(skip(dir, rows), fields(dir = %dir.display(), rows = rows.len()))]
pub fn write_dataset<T: ParquetRows>(dir: &Path, name: &str, rows: &[T]) -> Result<DatasetSummary> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let csv_file = format!("{name}.csv.zip");
    let parquet_file = format!("{name}.parquet");
    let staged_csv = staged(dir, &csv_file);
    let staged_parquet = staged(dir, &parquet_file);

    let written = write_csv_zip(&staged_csv, &format!("{name}.csv"), rows)
        .and_then(|()| write_parquet(&staged_parquet, rows));
    if let Err(e) = written {
        discard(&[&staged_csv, &staged_parquet]);
        return Err(e);
    }

    for (from, to) in [(&staged_csv, &csv_file), (&staged_parquet, &parquet_file)] {
        fs::rename(from, dir.join(to))
            .with_context(|| format!("moving {} into place", from.display()))?;
    }

    let total_ridership: u64 = rows.iter().map(Tabular::ridership).sum();
    info!(csv_file, parquet_file, total_ridership, "Dataset written");

    Ok(DatasetSummary {
        name: name.to_string(),
        csv_file,
        parquet_file,
        records: rows.len(),
        total_ridership,
        total_revenue: None,
    })
}

/// Removes a previously published dataset from `dir`, if present.
pub fn remove_dataset(dir: &Path, name: &str) {
    let csv = dir.join(format!("{name}.csv.zip"));
    let parquet = dir.join(format!("{name}.parquet"));
    if csv.exists() || parquet.exists() {
        info!(dir = %dir.display(), name, "Removing stale dataset");
    }
    discard(&[&csv, &parquet]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::StationHourlyRecord;
    use chrono::NaiveDate;

    fn hourly(ridership: u64) -> Vec<StationHourlyRecord> {
        vec![StationHourlyRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            hour: 7,
            station: "Indiranagar".into(),
            ridership,
        }]
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_dataset_publishes_both_files() {
        let dir = tempfile::tempdir().unwrap();

        let summary = write_dataset(dir.path(), "station-hourly", &hourly(12)).unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(summary.total_ridership, 12);
        assert_eq!(
            file_names(dir.path()),
            vec!["station-hourly.csv.zip", "station-hourly.parquet"]
        );
    }

    #[test]
    fn test_failed_parquet_leaves_previous_dataset_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "station-hourly", &hourly(12)).unwrap();
        let before = fs::read(dir.path().join("station-hourly.csv.zip")).unwrap();

        write_dataset(dir.path(), "station-hourly", &hourly(u64::MAX)).unwrap_err();

        assert_eq!(
            file_names(dir.path()),
            vec!["station-hourly.csv.zip", "station-hourly.parquet"]
        );
        let after = fs::read(dir.path().join("station-hourly.csv.zip")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_remove_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "stationpair-revenue", &hourly(1)).unwrap();
        write_dataset(dir.path(), "station-hourly", &hourly(1)).unwrap();

        remove_dataset(dir.path(), "stationpair-revenue");
        remove_dataset(dir.path(), "never-written");

        assert_eq!(
            file_names(dir.path()),
            vec!["station-hourly.csv.zip", "station-hourly.parquet"]
        );
    }
}
