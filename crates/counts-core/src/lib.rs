//! Shared types for the wifi-counts workspace.
//!
//! Holds the event and aggregate data model, error types, timestamp parsing
//! for both log generations, sample statistics, CSV rendering and the
//! command-line / config-file settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;
pub mod time_utils;
