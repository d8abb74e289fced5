//! Batch runtime for wifi-counts: file discovery, the parallel per-file
//! driver, atomic CSV output and the raw/transformed audit.

pub mod audit;
pub mod discovery;
pub mod driver;
pub mod writer;

pub use counts_core as core;
pub use counts_data as data;
