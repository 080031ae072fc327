//! Published record types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A record type that is published as a dataset.
///
/// `COLUMNS` must list the serialized field names in declaration order; it is
/// used for the CSV header and for the Parquet schema.
pub trait Tabular: Serialize {
    const COLUMNS: &'static [&'static str];

    fn ridership(&self) -> u64;
}

/// Entries at one station during one hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationHourlyRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Hour")]
    pub hour: u8,
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Ridership")]
    pub ridership: u64,
}

impl Tabular for StationHourlyRecord {
    const COLUMNS: &'static [&'static str] = &["Date", "Hour", "Station", "Ridership"];

    fn ridership(&self) -> u64 {
        self.ridership
    }
}

/// Journeys from `origin` to `destination` that started during one hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationPairRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Hour")]
    pub hour: u8,
    #[serde(rename = "Origin Station")]
    pub origin: String,
    #[serde(rename = "Destination Station")]
    pub destination: String,
    #[serde(rename = "Ridership")]
    pub ridership: u64,
}

impl Tabular for StationPairRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Date",
        "Hour",
        "Origin Station",
        "Destination Station",
        "Ridership",
    ];

    fn ridership(&self) -> u64 {
        self.ridership
    }
}

/// A [`StationPairRecord`] priced against the fare table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedStationPairRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Hour")]
    pub hour: u8,
    #[serde(rename = "Origin Station")]
    pub origin: String,
    #[serde(rename = "Destination Station")]
    pub destination: String,
    #[serde(rename = "Ridership")]
    pub ridership: u64,
    #[serde(rename = "Stations Travelled")]
    pub stations_travelled: u32,
    #[serde(rename = "Fare Slab")]
    pub fare_slab: u32,
    #[serde(rename = "Fare")]
    pub fare: Money,
    #[serde(rename = "Revenue")]
    pub revenue: Money,
}

impl EnrichedStationPairRecord {
    pub fn from_record(
        record: &StationPairRecord,
        stations_travelled: u32,
        fare_slab: u32,
        fare: Money,
        revenue: Money,
    ) -> Self {
        EnrichedStationPairRecord {
            date: record.date,
            hour: record.hour,
            origin: record.origin.clone(),
            destination: record.destination.clone(),
            ridership: record.ridership,
            stations_travelled,
            fare_slab,
            fare,
            revenue,
        }
    }
}

impl Tabular for EnrichedStationPairRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Date",
        "Hour",
        "Origin Station",
        "Destination Station",
        "Ridership",
        "Stations Travelled",
        "Fare Slab",
        "Fare",
        "Revenue",
    ];

    fn ridership(&self) -> u64 {
        self.ridership
    }
}
