//! `summary.json`: the index of published datasets.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::warn;

use crate::money::Money;

/// Counts for one published dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub csv_file: String,
    pub parquet_file: String,
    pub records: usize,
    pub total_ridership: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_revenue: Option<Money>,
}

/// Top-level index of a conversion run, written as `summary.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub datasets: Vec<DatasetSummary>,
}

impl RunSummary {
    pub fn new(datasets: Vec<DatasetSummary>) -> Self {
        Self {
            generated_at: Utc::now(),
            datasets,
        }
    }
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    Ok(())
}

pub fn read_summary(path: &Path) -> Result<Option<RunSummary>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let summary =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(summary))
}

/// Merges `written` into the summary at `path` and drops the `removed`
/// datasets, keeping entries for every other dataset.
///
/// An unreadable summary is replaced.
pub fn update_summary(
    path: &Path,
    written: Vec<DatasetSummary>,
    removed: &[&str],
) -> Result<RunSummary> {
    let mut datasets = match read_summary(path) {
        Ok(existing) => existing.map(|s| s.datasets).unwrap_or_default(),
        Err(e) => {
            warn!(error = format!("{e:#}"), "Existing summary unreadable, replacing it");
            Vec::new()
        }
    };
    datasets.retain(|d| {
        !removed.contains(&d.name.as_str()) && !written.iter().any(|w| w.name == d.name)
    });
    datasets.extend(written);
    datasets.sort_by(|a, b| a.name.cmp(&b.name));

    let summary = RunSummary::new(datasets);
    write_summary(path, &summary)?;
    Ok(summary)
}
