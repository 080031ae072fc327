//! Error kinds raised by the reference data and the fare engine.

use chrono::NaiveDate;

use crate::money::Money;

/// Reference data that cannot be used. Raised while loading, before any
/// record is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("fare table is empty")]
    EmptyFareTable,
    #[error(
        "fare table is not sorted: slab {slab_id} has boundary {max_stations} after boundary {previous}"
    )]
    UnsortedFareTable {
        slab_id: u32,
        max_stations: u32,
        previous: u32,
    },
    #[error("fare table repeats boundary {max_stations} (slabs {first} and {second})")]
    DuplicateBoundary {
        max_stations: u32,
        first: u32,
        second: u32,
    },
    #[error("fare table repeats slab id {0}")]
    DuplicateSlabId(u32),
    #[error("fare slab {slab_id} has negative fare {fare}")]
    NegativeFare { slab_id: u32, fare: Money },
    #[error("station network has no lines")]
    EmptyNetwork,
    #[error("line {0:?} has no stations")]
    EmptyLine(String),
    #[error("station {station:?} appears more than once on line {line:?}")]
    DuplicateStation { line: String, station: String },
}

/// A single record that cannot be priced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("unknown station {0:?}")]
    UnknownStation(String),
    #[error("no route between {origin:?} and {destination:?}")]
    Unreachable { origin: String, destination: String },
    #[error("{stations_travelled} stations travelled exceeds the largest fare boundary {max_stations}")]
    BeyondFareTable {
        stations_travelled: u32,
        max_stations: u32,
    },
    #[error("revenue overflows for fare {fare} and ridership {ridership}")]
    RevenueOverflow { fare: Money, ridership: u64 },
}

/// A failed lookup together with the record it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub index: usize,
    pub date: NaiveDate,
    pub hour: u8,
    pub origin: String,
    pub destination: String,
    pub error: LookupError,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("{} of {total} records could not be priced", .failures.len())]
    Lookup {
        total: usize,
        failures: Vec<RecordFailure>,
    },
}
