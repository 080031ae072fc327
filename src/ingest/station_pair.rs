//! Station-pair hourly sheet loader.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::{BUSINESS_DATE, IngestError, STATION, SheetFormat, cells, column_index, line_of};
use crate::records::StationPairRecord;
use crate::stations::StationMapping;

const SHEET: &str = "station-pair-hourly";

/// Melts the origin/destination matrix into one record per non-zero cell.
///
/// Rows without an origin or a parseable business date are summary rows and
/// are skipped, as are empty and zero cells. Station codes are passed
/// through `codes`. The result is sorted by date, hour, origin and
/// destination.
pub fn read_station_pair_hourly<R: Read>(
    reader: R,
    format: SheetFormat,
    codes: &StationMapping,
) -> Result<Vec<StationPairRecord>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = column_index(&headers, SHEET, BUSINESS_DATE)?;
    let origin_idx = column_index(&headers, SHEET, STATION)?;

    let destinations: Vec<(usize, &str, &str)> = headers
        .iter()
        .enumerate()
        .filter(|&(i, h)| i != date_idx && i != origin_idx && !h.is_empty())
        .map(|(i, code)| (i, code, codes.resolve(code)))
        .collect();

    let mut records = Vec::new();
    let mut skipped_rows = 0usize;
    for result in rdr.records() {
        let row = result?;
        let origin_code = row.get(origin_idx).unwrap_or_default();
        let raw_date = row.get(date_idx).unwrap_or_default();
        if origin_code.is_empty() || raw_date.is_empty() {
            skipped_rows += 1;
            continue;
        }
        let Some((date, hour)) = cells::pair_date_hour(raw_date) else {
            debug!(line = line_of(&row), value = raw_date, "Skipping row with unparseable business date");
            skipped_rows += 1;
            continue;
        };
        let origin = codes.resolve(origin_code);

        for &(idx, code, destination) in &destinations {
            let raw = row.get(idx).unwrap_or_default();
            let ridership = cells::ridership(raw).map_err(|()| IngestError::InvalidRidership {
                sheet: SHEET,
                line: line_of(&row),
                column: code.to_string(),
                value: raw.to_string(),
            })?;
            let Some(ridership) = ridership.filter(|&n| n > 0) else {
                continue;
            };

            records.push(StationPairRecord {
                date,
                hour,
                origin: origin.to_string(),
                destination: destination.to_string(),
                ridership,
            });
        }
    }
    debug!(skipped_rows, "Station-pair summary rows skipped");

    records.sort_by(|a, b| {
        (a.date, a.hour, &a.origin, &a.destination).cmp(&(b.date, b.hour, &b.origin, &b.destination))
    });
    Ok(records)
}

#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_station_pair_hourly(
    path: impl AsRef<Path>,
    format: SheetFormat,
    codes: &StationMapping,
) -> Result<Vec<StationPairRecord>> {
    let path = path.as_ref();
    info!("Processing station-pair-hourly sheet");
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let records = read_station_pair_hourly(file, format, codes)
        .with_context(|| format!("reading {}", path.display()))?;
    info!(records = records.len(), "Station-pair-hourly sheet processed");
    Ok(records)
}
