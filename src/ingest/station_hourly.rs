//! Station-hourly sheet loader.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::{
    BUSINESS_DATE, IngestError, STATION, SheetFormat, TOTAL, cells, column_index, line_of,
};
use crate::records::StationHourlyRecord;
use crate::stations::StationMapping;

const SHEET: &str = "station-hourly";

/// Melts the station-hourly sheet into one record per station and hour.
///
/// Empty cells count as zero and are kept. Station labels lose their code
/// prefix and are then passed through `old_names`. The result is sorted by
/// date, station and hour.
pub fn read_station_hourly<R: Read>(
    reader: R,
    format: SheetFormat,
    old_names: &StationMapping,
) -> Result<Vec<StationHourlyRecord>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = column_index(&headers, SHEET, BUSINESS_DATE)?;
    let station_idx = column_index(&headers, SHEET, STATION)?;

    let hour_columns: Vec<(usize, u8, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| ![BUSINESS_DATE, STATION, TOTAL].contains(h))
        .filter_map(|(i, h)| cells::hour_from_column(h).map(|hour| (i, hour, h)))
        .collect();
    debug!(hour_columns = hour_columns.len(), "Station-hourly columns resolved");

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let raw_station = row.get(station_idx).unwrap_or_default();
        let raw_date = row.get(date_idx).unwrap_or_default();
        if raw_station.is_empty() || raw_date.is_empty() {
            continue;
        }

        let date = cells::business_date(raw_date).ok_or_else(|| IngestError::InvalidDate {
            sheet: SHEET,
            line: line_of(&row),
            value: raw_date.to_string(),
        })?;
        let station = old_names.resolve(cells::station_label(raw_station)).to_string();

        for &(idx, hour, column) in &hour_columns {
            let raw = row.get(idx).unwrap_or_default();
            let ridership = cells::ridership(raw)
                .map_err(|()| IngestError::InvalidRidership {
                    sheet: SHEET,
                    line: line_of(&row),
                    column: column.to_string(),
                    value: raw.to_string(),
                })?
                .unwrap_or(0);

            records.push(StationHourlyRecord {
                date,
                hour,
                station: station.clone(),
                ridership,
            });
        }
    }

    records.sort_by(|a, b| {
        (a.date, &a.station, a.hour).cmp(&(b.date, &b.station, b.hour))
    });
    Ok(records)
}

#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_station_hourly(
    path: impl AsRef<Path>,
    format: SheetFormat,
    old_names: &StationMapping,
) -> Result<Vec<StationHourlyRecord>> {
    let path = path.as_ref();
    info!("Processing station-hourly sheet");
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let records = read_station_hourly(file, format, old_names)
        .with_context(|| format!("reading {}", path.display()))?;
    info!(records = records.len(), "Station-hourly sheet processed");
    Ok(records)
}
