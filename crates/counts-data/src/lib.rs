//! Transformation core for wifi-counts.
//!
//! Selects log lines by event-code marker, parses them into device events,
//! removes devices with anomalous per-file occurrence counts and aggregates
//! the survivors into hourly per-building counts.

pub mod aggregator;
pub mod line_filter;
pub mod outliers;
pub mod parser;
pub mod pipeline;

pub use counts_core as core;
