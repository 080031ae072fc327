//! Builds the published datasets from the raw sheets.

use anyhow::{Result, bail};
use tracing::{error, info, warn};

use crate::config::{RunConfig, STATION_HOURLY, STATION_PAIR_HOURLY, STATION_PAIR_REVENUE};
use crate::error::EnrichError;
use crate::fares::{FareEngine, FareTable};
use crate::ingest::{load_station_hourly, load_station_pair_hourly};
use crate::money::Money;
use crate::output::{
    DatasetSummary, RunSummary, remove_dataset, update_summary, write_dataset,
    write_summary,
};
use crate::records::StationPairRecord;
use crate::stations::{StationMapping, load_station_lines};

/// Loads the station-hourly sheet and writes its dataset.
pub fn build_station_hourly(config: &RunConfig) -> Result<DatasetSummary> {
    let old_names = StationMapping::load_or_empty(&config.station_names, StationMapping::ALT_NAME_COLUMN);
    let records = load_station_hourly(&config.station_hourly_sheet, config.sheet_format, &old_names)?;
    write_dataset(&config.output_dir, STATION_HOURLY, &records)
}

/// Loads the station-pair sheet, writes its dataset, and returns the
/// records for enrichment.
pub fn build_station_pair(config: &RunConfig) -> Result<(Vec<StationPairRecord>, DatasetSummary)> {
    let codes = StationMapping::load_or_empty(&config.station_codes, StationMapping::CODE_COLUMN);
    let records = load_station_pair_hourly(&config.station_pair_sheet, config.sheet_format, &codes)?;
    let summary = write_dataset(&config.output_dir, STATION_PAIR_HOURLY, &records)?;
    Ok((records, summary))
}

/// Prices `records` and writes the revenue dataset.
///
/// Nothing is written unless every record is priced. On failure any revenue
/// dataset left in the output directory by an earlier run is removed.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn build_revenue(config: &RunConfig, records: &[StationPairRecord]) -> Result<DatasetSummary> {
    let result = publish_revenue(config, records);
    if result.is_err() {
        remove_dataset(&config.output_dir, STATION_PAIR_REVENUE);
    }
    result
}

fn publish_revenue(config: &RunConfig, records: &[StationPairRecord]) -> Result<DatasetSummary> {
    let fares = FareTable::load(&config.fare_slabs)?;
    let network = load_station_lines(&config.station_lines)?;
    let engine = FareEngine::new(network, fares);

    let enriched = match engine.enrich_all(records) {
        Ok(enriched) => enriched,
        Err(EnrichError::Lookup { total, failures }) => {
            for failure in &failures {
                error!(
                    index = failure.index,
                    date = %failure.date,
                    hour = failure.hour,
                    origin = %failure.origin,
                    destination = %failure.destination,
                    error = %failure.error,
                    "Record could not be priced"
                );
            }
            return Err(EnrichError::Lookup { total, failures }.into());
        }
    };

    let mut total_revenue = Money::ZERO;
    for row in &enriched {
        total_revenue = match total_revenue.checked_add(row.revenue) {
            Some(sum) => sum,
            None => bail!("total revenue overflows"),
        };
    }

    let mut summary = write_dataset(&config.output_dir, STATION_PAIR_REVENUE, &enriched)?;
    info!(total_revenue = %total_revenue, "Revenue dataset written");
    summary.total_revenue = Some(total_revenue);
    Ok(summary)
}

/// Prices the station-pair sheet on its own and merges the revenue dataset
/// into `summary.json`. A failed run drops the revenue entry from it.
pub fn enrich_station_pairs(config: &RunConfig) -> Result<DatasetSummary> {
    let codes = StationMapping::load_or_empty(&config.station_codes, StationMapping::CODE_COLUMN);
    let records = load_station_pair_hourly(&config.station_pair_sheet, config.sheet_format, &codes)?;

    match build_revenue(config, &records) {
        Ok(summary) => {
            update_summary(&config.summary_path(), vec![summary.clone()], &[])?;
            Ok(summary)
        }
        Err(e) => {
            if config.summary_path().exists() {
                update_summary(&config.summary_path(), Vec::new(), &[STATION_PAIR_REVENUE])?;
            }
            Err(e)
        }
    }
}

/// Builds every dataset.
///
/// The two sheets are converted independently: a failure in one is logged
/// and the other still runs. Revenue is built from the pair records when the
/// fare reference data is present. The summary lists the datasets that were
/// written; the call fails if any dataset failed.
#[tracing::instrument(skip_all, fields(output_dir = %config.output_dir.display()))]
pub fn convert(config: &RunConfig) -> Result<RunSummary> {
    let mut datasets = Vec::new();
    let mut failed = Vec::new();

    match build_station_hourly(config) {
        Ok(summary) => datasets.push(summary),
        Err(e) => {
            error!(error = format!("{e:#}"), "Station-hourly dataset failed");
            failed.push(STATION_HOURLY);
        }
    }

    match build_station_pair(config) {
        Ok((records, summary)) => {
            datasets.push(summary);
            if config.has_fare_reference() {
                match build_revenue(config, &records) {
                    Ok(summary) => datasets.push(summary),
                    Err(e) => {
                        error!(error = format!("{e:#}"), "Revenue dataset failed");
                        failed.push(STATION_PAIR_REVENUE);
                    }
                }
            } else {
                warn!(
                    fare_slabs = %config.fare_slabs.display(),
                    station_lines = %config.station_lines.display(),
                    "Fare reference data not found, skipping revenue dataset"
                );
                remove_dataset(&config.output_dir, STATION_PAIR_REVENUE);
            }
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "Station-pair dataset failed");
            failed.push(STATION_PAIR_HOURLY);
            remove_dataset(&config.output_dir, STATION_PAIR_REVENUE);
        }
    }

    let summary = RunSummary::new(datasets);
    if !summary.datasets.is_empty() {
        write_summary(&config.summary_path(), &summary)?;
    }

    if !failed.is_empty() {
        bail!("{} dataset(s) failed: {}", failed.len(), failed.join(", "));
    }

    info!(datasets = summary.datasets.len(), "Processing complete");
    Ok(summary)
}
