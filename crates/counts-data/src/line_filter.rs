//! Marker-based line selection.
//!
//! A line is kept when any configured event-code marker occurs in it as a
//! literal substring. Nothing about *which* marker matched is carried forward.

use counts_core::error::{CountsError, Result};

/// Selects log lines containing at least one configured marker.
#[derive(Debug, Clone)]
pub struct LineFilter {
    markers: Vec<String>,
}

impl LineFilter {
    /// Build a filter from an ordered, non-empty marker list.
    pub fn new(markers: Vec<String>) -> Result<Self> {
        if markers.is_empty() {
            return Err(CountsError::Config("at least one marker is required".into()));
        }
        if markers.iter().any(|m| m.is_empty()) {
            return Err(CountsError::Config("markers must not be empty".into()));
        }
        Ok(Self { markers })
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Returns `true` when `line` contains any marker.
    pub fn matches(&self, line: &str) -> bool {
        self.markers.iter().any(|m| line.contains(m.as_str()))
    }

    /// Lazily yield the lines that contain a marker, in input order.
    pub fn select<'a, I, S>(&'a self, lines: I) -> impl Iterator<Item = S> + 'a
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: 'a,
        S: AsRef<str> + 'a,
    {
        lines
            .into_iter()
            .filter(move |line| self.matches(line.as_ref()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
