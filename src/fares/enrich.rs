//! Prices station-pair records against the network and fare table.

use tracing::{debug, warn};

use crate::error::{EnrichError, LookupError, RecordFailure};
use crate::fares::table::FareTable;
use crate::records::{EnrichedStationPairRecord, StationPairRecord};
use crate::stations::StationDistance;

/// Prices a single record.
///
/// Deterministic and side-effect free. The record is never altered or
/// dropped: a zero ridership yields zero revenue, and an origin equal to the
/// destination is priced at distance 0.
pub fn enrich<D: StationDistance + ?Sized>(
    record: &StationPairRecord,
    stations: &D,
    fares: &FareTable,
) -> Result<EnrichedStationPairRecord, LookupError> {
    let stations_travelled = stations.stations_travelled(&record.origin, &record.destination)?;
    let slab = fares.slab_for(stations_travelled)?;
    let revenue = slab
        .fare
        .checked_mul(record.ridership)
        .ok_or(LookupError::RevenueOverflow {
            fare: slab.fare,
            ridership: record.ridership,
        })?;

    Ok(EnrichedStationPairRecord::from_record(
        record,
        stations_travelled,
        slab.slab_id,
        slab.fare,
        revenue,
    ))
}

/// Station topology and fare table, fixed for the lifetime of a run.
pub struct FareEngine<D> {
    stations: D,
    fares: FareTable,
}

impl<D: StationDistance> FareEngine<D> {
    pub fn new(stations: D, fares: FareTable) -> Self {
        if let Some(diameter) = stations.diameter() {
            if diameter > fares.max_stations() {
                warn!(
                    diameter,
                    max_stations = fares.max_stations(),
                    "Fare table does not cover the longest trip in the network"
                );
            }
        }
        Self { stations, fares }
    }

    pub fn enrich(
        &self,
        record: &StationPairRecord,
    ) -> Result<EnrichedStationPairRecord, LookupError> {
        enrich(record, &self.stations, &self.fares)
    }

    /// Prices every record, preserving count and order.
    ///
    /// All failures are collected before returning, and no output is
    /// returned if any record failed.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub fn enrich_all(
        &self,
        records: &[StationPairRecord],
    ) -> Result<Vec<EnrichedStationPairRecord>, EnrichError> {
        let mut enriched = Vec::with_capacity(records.len());
        let mut failures = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match self.enrich(record) {
                Ok(row) => enriched.push(row),
                Err(error) => failures.push(RecordFailure {
                    index,
                    date: record.date,
                    hour: record.hour,
                    origin: record.origin.clone(),
                    destination: record.destination.clone(),
                    error,
                }),
            }
        }

        if !failures.is_empty() {
            return Err(EnrichError::Lookup {
                total: records.len(),
                failures,
            });
        }

        debug!(enriched = enriched.len(), "All records priced");
        Ok(enriched)
    }

    pub fn fares(&self) -> &FareTable {
        &self.fares
    }

    pub fn stations(&self) -> &D {
        &self.stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fares::table::FareSlab;
    use crate::money::Money;
    use crate::stations::StationOrdering;
    use chrono::NaiveDate;

    fn ordering() -> StationOrdering {
        StationOrdering::new("main", ["A", "B", "C", "D", "E"]).unwrap()
    }

    fn fares(max_second: u32) -> FareTable {
        FareTable::new(vec![
            FareSlab::new(1, 2, Money::from_rupees(10)),
            FareSlab::new(2, max_second, Money::from_rupees(20)),
        ])
        .unwrap()
    }

    fn record(origin: &str, destination: &str, ridership: u64) -> StationPairRecord {
        StationPairRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            hour: 9,
            origin: origin.into(),
            destination: destination.into(),
            ridership,
        }
    }

    #[test]
    fn test_two_station_trip() {
        let row = enrich(&record("A", "C", 50), &ordering(), &fares(4)).unwrap();

        assert_eq!(row.stations_travelled, 2);
        assert_eq!(row.fare_slab, 1);
        assert_eq!(row.fare, Money::from_rupees(10));
        assert_eq!(row.revenue, Money::from_rupees(500));
    }

    #[test]
    fn test_four_station_trip() {
        let row = enrich(&record("A", "E", 3), &ordering(), &fares(4)).unwrap();

        assert_eq!(row.stations_travelled, 4);
        assert_eq!(row.fare_slab, 2);
        assert_eq!(row.fare, Money::from_rupees(20));
        assert_eq!(row.revenue, Money::from_rupees(60));
    }

    #[test]
    fn test_trip_beyond_table() {
        let err = enrich(&record("A", "E", 3), &ordering(), &fares(3)).unwrap_err();
        assert_eq!(
            err,
            LookupError::BeyondFareTable {
                stations_travelled: 4,
                max_stations: 3
            }
        );
    }

    #[test]
    fn test_same_station_and_zero_ridership() {
        let row = enrich(&record("C", "C", 0), &ordering(), &fares(4)).unwrap();

        assert_eq!(row.stations_travelled, 0);
        assert_eq!(row.fare_slab, 1);
        assert_eq!(row.revenue, Money::ZERO);
    }

    #[test]
    fn test_revenue_is_exact_product() {
        let table = FareTable::new(vec![FareSlab::new(7, 10, Money::from_paise(1050))]).unwrap();
        for ridership in [0, 1, 3, 999, 123_456] {
            let row = enrich(&record("A", "D", ridership), &ordering(), &table).unwrap();
            assert_eq!(row.revenue.paise(), 1050 * ridership as i64);
            assert_eq!(row.ridership, ridership);
        }
    }

    #[test]
    fn test_revenue_overflow_is_lookup_error() {
        let table = FareTable::new(vec![FareSlab::new(1, 4, Money::from_paise(i64::MAX))]).unwrap();
        let err = enrich(&record("A", "B", 2), &ordering(), &table).unwrap_err();
        assert!(matches!(err, LookupError::RevenueOverflow { ridership: 2, .. }));
    }

    #[test]
    fn test_enrich_all_preserves_count_and_order() {
        let engine = FareEngine::new(ordering(), fares(4));
        let input = vec![
            record("E", "A", 3),
            record("A", "C", 50),
            record("B", "B", 0),
            record("A", "C", 50),
        ];

        let output = engine.enrich_all(&input).unwrap();

        assert_eq!(output.len(), input.len());
        for (row, source) in output.iter().zip(&input) {
            assert_eq!(row.origin, source.origin);
            assert_eq!(row.destination, source.destination);
            assert_eq!(row.ridership, source.ridership);
        }
        assert_eq!(output[0].revenue, Money::from_rupees(60));
        assert_eq!(output[2].revenue, Money::ZERO);
    }

    #[test]
    fn test_enrich_all_collects_every_failure() {
        let engine = FareEngine::new(ordering(), fares(3));
        let input = vec![
            record("A", "B", 1),
            record("A", "E", 3),
            record("A", "Z", 1),
        ];

        let err = engine.enrich_all(&input).unwrap_err();

        let EnrichError::Lookup { total, failures } = err;
        assert_eq!(total, 3);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index, 1);
        assert!(matches!(failures[0].error, LookupError::BeyondFareTable { .. }));
        assert_eq!(failures[1].index, 2);
        assert_eq!(failures[1].error, LookupError::UnknownStation("Z".into()));
    }
}
