//! Fare slab lookup and revenue enrichment.
//!
//! Each station-pair record is priced by counting the stations travelled,
//! finding the first fare slab whose boundary covers that distance, and
//! multiplying the slab's fare by the ridership.

pub mod enrich;
pub mod table;

pub use enrich::{FareEngine, enrich};
pub use table::{FareSlab, FareTable};
