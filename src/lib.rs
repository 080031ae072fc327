pub mod config;
pub mod error;
pub mod fares;
pub mod ingest;
pub mod money;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod stations;
