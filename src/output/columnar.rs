//! Columnar output.
//!
//! Records are transposed into typed columns and written as a single row
//! group. Dates are Parquet `DATE` (days since 1970-01-01) and currency is
//! `DECIMAL(18, 2)` over the exact paise value.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Datelike, NaiveDate};
use parquet::basic::{Compression, LogicalType, Repetition, Type as PhysicalType};
use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::money::Money;
use crate::records::{
    EnrichedStationPairRecord, StationHourlyRecord, StationPairRecord, Tabular,
};

// NaiveDate::num_days_from_ce() of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const DECIMAL_PRECISION: i32 = 18;
const DECIMAL_SCALE: i32 = 2;

#[derive(Debug)]
pub enum ColumnValues {
    Date(Vec<i32>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Utf8(Vec<ByteArray>),
    Decimal(Vec<i64>),
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub values: ColumnValues,
}

/// Record types that can be transposed into Parquet columns.
pub trait ParquetRows: Tabular + Sized {
    /// One column per entry of [`Tabular::COLUMNS`], in the same order.
    fn columns(rows: &[Self]) -> Result<Vec<Column>>;
}

fn date_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn dates<T>(rows: &[T], f: impl Fn(&T) -> NaiveDate) -> ColumnValues {
    ColumnValues::Date(rows.iter().map(|r| date_days(f(r))).collect())
}

fn int32s<T>(rows: &[T], f: impl Fn(&T) -> i32) -> ColumnValues {
    ColumnValues::Int32(rows.iter().map(f).collect())
}

fn int64s<T>(rows: &[T], f: impl Fn(&T) -> i64) -> ColumnValues {
    ColumnValues::Int64(rows.iter().map(f).collect())
}

fn strings<T>(rows: &[T], f: impl Fn(&T) -> &str) -> ColumnValues {
    ColumnValues::Utf8(rows.iter().map(|r| ByteArray::from(f(r))).collect())
}

fn money<T>(rows: &[T], f: impl Fn(&T) -> Money) -> ColumnValues {
    ColumnValues::Decimal(rows.iter().map(|r| f(r).paise()).collect())
}

fn counts<T>(rows: &[T], f: impl Fn(&T) -> u64) -> Result<ColumnValues> {
    rows.iter()
        .map(|r| {
            let value = f(r);
            i64::try_from(value).map_err(|_| anyhow!("ridership {value} exceeds the INT64 range"))
        })
        .collect::<Result<Vec<_>>>()
        .map(ColumnValues::Int64)
}

fn named(names: &'static [&'static str], values: Vec<ColumnValues>) -> Vec<Column> {
    names
        .iter()
        .zip(values)
        .map(|(&name, values)| Column { name, values })
        .collect()
}

impl ParquetRows for StationHourlyRecord {
    fn columns(rows: &[Self]) -> Result<Vec<Column>> {
        Ok(named(
            Self::COLUMNS,
            vec![
                dates(rows, |r| r.date),
                int32s(rows, |r| i32::from(r.hour)),
                strings(rows, |r| r.station.as_str()),
                counts(rows, |r| r.ridership)?,
            ],
        ))
    }
}

impl ParquetRows for StationPairRecord {
    fn columns(rows: &[Self]) -> Result<Vec<Column>> {
        Ok(named(
            Self::COLUMNS,
            vec![
                dates(rows, |r| r.date),
                int32s(rows, |r| i32::from(r.hour)),
                strings(rows, |r| r.origin.as_str()),
                strings(rows, |r| r.destination.as_str()),
                counts(rows, |r| r.ridership)?,
            ],
        ))
    }
}

impl ParquetRows for EnrichedStationPairRecord {
    fn columns(rows: &[Self]) -> Result<Vec<Column>> {
        Ok(named(
            Self::COLUMNS,
            vec![
                dates(rows, |r| r.date),
                int32s(rows, |r| i32::from(r.hour)),
                strings(rows, |r| r.origin.as_str()),
                strings(rows, |r| r.destination.as_str()),
                counts(rows, |r| r.ridership)?,
                int64s(rows, |r| i64::from(r.stations_travelled)),
                int64s(rows, |r| i64::from(r.fare_slab)),
                money(rows, |r| r.fare),
                money(rows, |r| r.revenue),
            ],
        ))
    }
}

fn field_type(column: &Column) -> parquet::errors::Result<Type> {
    let physical = match column.values {
        ColumnValues::Date(_) | ColumnValues::Int32(_) => PhysicalType::INT32,
        ColumnValues::Int64(_) | ColumnValues::Decimal(_) => PhysicalType::INT64,
        ColumnValues::Utf8(_) => PhysicalType::BYTE_ARRAY,
    };
    let builder =
        Type::primitive_type_builder(column.name, physical).with_repetition(Repetition::REQUIRED);

    let builder = match column.values {
        ColumnValues::Date(_) => builder.with_logical_type(Some(LogicalType::Date)),
        ColumnValues::Utf8(_) => builder.with_logical_type(Some(LogicalType::String)),
        ColumnValues::Decimal(_) => builder
            .with_logical_type(Some(LogicalType::Decimal {
                scale: DECIMAL_SCALE,
                precision: DECIMAL_PRECISION,
            }))
            .with_precision(DECIMAL_PRECISION)
            .with_scale(DECIMAL_SCALE),
        ColumnValues::Int32(_) | ColumnValues::Int64(_) => builder,
    };
    builder.build()
}

/// Writes `rows` to a Snappy-compressed Parquet file at `path`.
pub fn write_parquet<T: ParquetRows>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing Parquet file");

    let columns = T::columns(rows)?;
    if columns.len() != T::COLUMNS.len() {
        bail!(
            "expected {} columns, built {}",
            T::COLUMNS.len(),
            columns.len()
        );
    }

    let fields = columns
        .iter()
        .map(|column| field_type(column).map(Arc::new))
        .collect::<parquet::errors::Result<Vec<_>>>()?;
    let schema = Arc::new(
        Type::group_type_builder("schema")
            .with_fields(fields)
            .build()?,
    );
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = SerializedFileWriter::new(file, schema, Arc::new(props))?;
    let mut row_group = writer.next_row_group()?;

    let mut columns = columns.into_iter();
    while let Some(mut col_writer) = row_group.next_column()? {
        let Some(column) = columns.next() else {
            bail!("schema has more columns than data");
        };
        match (col_writer.untyped(), &column.values) {
            (
                ColumnWriter::Int32ColumnWriter(typed),
                ColumnValues::Int32(values) | ColumnValues::Date(values),
            ) => {
                typed.write_batch(values, None, None)?;
            }
            (
                ColumnWriter::Int64ColumnWriter(typed),
                ColumnValues::Int64(values) | ColumnValues::Decimal(values),
            ) => {
                typed.write_batch(values, None, None)?;
            }
            (ColumnWriter::ByteArrayColumnWriter(typed), ColumnValues::Utf8(values)) => {
                typed.write_batch(values, None, None)?;
            }
            _ => bail!("column {:?} does not match its writer", column.name),
        }
        col_writer.close()?;
    }
    row_group.close()?;
    writer
        .close()
        .with_context(|| format!("finishing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use parquet::record::RowAccessor;

    fn jan6() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn test_date_days() {
        assert_eq!(date_days(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(date_days(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(date_days(jan6()), 20_094);
    }

    #[test]
    fn test_pair_file_schema_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stationpair-hourly.parquet");
        let rows = vec![
            StationPairRecord {
                date: jan6(),
                hour: 5,
                origin: "MG Road".into(),
                destination: "Indiranagar".into(),
                ridership: 7,
            },
            StationPairRecord {
                date: jan6(),
                hour: 6,
                origin: "Indiranagar".into(),
                destination: "MG Road".into(),
                ridership: 12,
            },
        ];

        write_parquet(&path, &rows).unwrap();

        let reader = SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
        let metadata = reader.metadata().file_metadata();
        assert_eq!(metadata.num_rows(), 2);
        let names: Vec<_> = metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, StationPairRecord::COLUMNS);

        let mut iter = reader.get_row_iter(None).unwrap();
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.get_int(1).unwrap(), 5);
        assert_eq!(first.get_string(2).unwrap(), "MG Road");
        assert_eq!(first.get_long(4).unwrap(), 7);
    }

    #[test]
    fn test_enriched_file_uses_decimal_currency() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stationpair-revenue.parquet");
        let rows = vec![EnrichedStationPairRecord {
            date: jan6(),
            hour: 9,
            origin: "A".into(),
            destination: "C".into(),
            ridership: 50,
            stations_travelled: 2,
            fare_slab: 1,
            fare: Money::from_rupees(10),
            revenue: Money::from_rupees(500),
        }];

        write_parquet(&path, &rows).unwrap();

        let reader = SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
        let schema = reader.metadata().file_metadata().schema_descr();
        let revenue = schema.column(8);
        assert_eq!(revenue.name(), "Revenue");
        assert_eq!(revenue.physical_type(), PhysicalType::INT64);
        assert_eq!(revenue.type_precision(), DECIMAL_PRECISION);
        assert_eq!(revenue.type_scale(), DECIMAL_SCALE);
        assert_eq!(reader.metadata().file_metadata().num_rows(), 1);
    }

    #[test]
    fn test_ridership_beyond_int64_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station-hourly.parquet");
        let rows = vec![StationHourlyRecord {
            date: jan6(),
            hour: 5,
            station: "Indiranagar".into(),
            ridership: u64::MAX,
        }];

        let err = write_parquet(&path, &rows).unwrap_err();

        assert!(err.to_string().contains("exceeds the INT64 range"));
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_dataset_writes_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.parquet");

        write_parquet::<StationHourlyRecord>(&path, &[]).unwrap();

        let reader = SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(reader.metadata().file_metadata().num_rows(), 0);
    }
}
