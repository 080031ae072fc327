//! Station reference data.
//!
//! [`StationMapping`] rewrites raw station codes and retired names into the
//! published station names. [`StationOrdering`] is the physical sequence of
//! one line; [`StationNetwork`] joins several lines at their shared
//! interchange stations. Both implement [`StationDistance`], which is all the
//! fare engine needs.

mod mapping;
mod network;

pub use mapping::StationMapping;
pub use network::{StationNetwork, StationOrdering, load_station_lines};

use crate::error::LookupError;

/// Counts the stations travelled between two stations, excluding the origin.
pub trait StationDistance: Send + Sync {
    fn stations_travelled(&self, origin: &str, destination: &str) -> Result<u32, LookupError>;

    /// Largest distance between any two connected stations, if known.
    fn diameter(&self) -> Option<u32> {
        None
    }
}
