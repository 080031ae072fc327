//! Fare slabs: an ordered table mapping stations travelled to a fare.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::error::{ConfigurationError, LookupError};
use crate::money::Money;

/// One tariff bracket: trips of up to `max_stations_travelled` stations cost `fare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareSlab {
    #[serde(rename = "slab")]
    pub slab_id: u32,
    #[serde(rename = "max_stations")]
    pub max_stations_travelled: u32,
    pub fare: Money,
}

impl FareSlab {
    pub fn new(slab_id: u32, max_stations_travelled: u32, fare: Money) -> Self {
        Self {
            slab_id,
            max_stations_travelled,
            fare,
        }
    }
}

/// Fare slabs sorted by strictly increasing boundary.
///
/// | Stations travelled         | Slab                         |
/// |----------------------------|------------------------------|
/// | `0 ..= max[0]`             | `slabs[0]`                   |
/// | `max[i-1] + 1 ..= max[i]`  | `slabs[i]`                   |
/// | `> max[last]`              | [`LookupError`]              |
#[derive(Debug, Clone)]
pub struct FareTable {
    slabs: Vec<FareSlab>,
}

impl FareTable {
    /// Validates `slabs`, which must already be in ascending boundary order.
    pub fn new(slabs: Vec<FareSlab>) -> Result<Self, ConfigurationError> {
        if slabs.is_empty() {
            return Err(ConfigurationError::EmptyFareTable);
        }

        let mut ids = HashSet::with_capacity(slabs.len());
        for slab in &slabs {
            if !ids.insert(slab.slab_id) {
                return Err(ConfigurationError::DuplicateSlabId(slab.slab_id));
            }
            if slab.fare.is_negative() {
                return Err(ConfigurationError::NegativeFare {
                    slab_id: slab.slab_id,
                    fare: slab.fare,
                });
            }
        }

        for pair in slabs.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.max_stations_travelled == prev.max_stations_travelled {
                return Err(ConfigurationError::DuplicateBoundary {
                    max_stations: next.max_stations_travelled,
                    first: prev.slab_id,
                    second: next.slab_id,
                });
            }
            if next.max_stations_travelled < prev.max_stations_travelled {
                return Err(ConfigurationError::UnsortedFareTable {
                    slab_id: next.slab_id,
                    max_stations: next.max_stations_travelled,
                    previous: prev.max_stations_travelled,
                });
            }
        }

        Ok(Self { slabs })
    }

    /// Loads a semicolon-separated `slab;max_stations;fare` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(b';')
            .trim(Trim::All)
            .from_path(path)
            .with_context(|| format!("opening fare table {}", path.display()))?;

        let slabs = reader
            .deserialize()
            .collect::<Result<Vec<FareSlab>, _>>()
            .with_context(|| format!("reading fare table {}", path.display()))?;

        let table = Self::new(slabs)
            .with_context(|| format!("invalid fare table {}", path.display()))?;
        info!(
            path = %path.display(),
            slabs = table.slabs.len(),
            max_stations = table.max_stations(),
            "Loaded fare table"
        );
        Ok(table)
    }

    /// Returns the first slab whose boundary is at least `stations_travelled`.
    pub fn slab_for(&self, stations_travelled: u32) -> Result<&FareSlab, LookupError> {
        let idx = self
            .slabs
            .partition_point(|slab| slab.max_stations_travelled < stations_travelled);
        self.slabs
            .get(idx)
            .ok_or_else(|| LookupError::BeyondFareTable {
                stations_travelled,
                max_stations: self.max_stations(),
            })
    }

    /// The largest boundary in the table.
    pub fn max_stations(&self) -> u32 {
        self.slabs
            .last()
            .map(|slab| slab.max_stations_travelled)
            .unwrap_or_default()
    }

    pub fn slabs(&self) -> &[FareSlab] {
        &self.slabs
    }
}
