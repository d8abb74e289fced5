//! Per-file removal of devices with anomalous occurrence counts.
//!
//! Every distinct device contributes one value (its event count) to a sample.
//! Devices whose count has a z-score magnitude above the threshold are
//! flagged and all of their events are dropped. The population is always a
//! single file.
//!
//! Re-running the filter on its own output may flag more devices, because
//! mean and spread move once outliers are gone. It is a one-shot pass.

use std::collections::HashMap;

use counts_core::models::Event;
use counts_core::stats::SampleSummary;
use tracing::debug;

// ── DeviceIndex ───────────────────────────────────────────────────────────────

/// Occurrence counts and event positions per device, built in one pass.
#[derive(Debug, Clone, Default)]
pub struct DeviceIndex {
    /// Device ids in order of first appearance.
    order: Vec<String>,
    counts: HashMap<String, usize>,
    positions: HashMap<String, Vec<usize>>,
}

impl DeviceIndex {
    pub fn build(events: &[Event]) -> Self {
        let mut index = Self::default();
        for (idx, event) in events.iter().enumerate() {
            match index.positions.get_mut(&event.device_id) {
                Some(list) => list.push(idx),
                None => {
                    index.order.push(event.device_id.clone());
                    index.positions.insert(event.device_id.clone(), vec![idx]);
                }
            }
            *index.counts.entry(event.device_id.clone()).or_insert(0) += 1;
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn device_count(&self) -> usize {
        self.order.len()
    }

    pub fn count(&self, device_id: &str) -> usize {
        self.counts.get(device_id).copied().unwrap_or(0)
    }

    pub fn positions(&self, device_id: &str) -> &[usize] {
        self.positions
            .get(device_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `(device_id, count)` pairs in order of first appearance.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(move |id| (id.as_str(), self.count(id)))
    }
}

// ── Flagging ──────────────────────────────────────────────────────────────────

/// A device removed by the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedDevice {
    pub device_id: String,
    pub count: usize,
    pub z_score: f64,
}

/// Flag devices whose count z-score magnitude exceeds `threshold`.
///
/// Returns `None` for an empty index. A degenerate sample (one device, or all
/// counts equal) flags nothing.
pub fn flag_outliers(
    index: &DeviceIndex,
    threshold: f64,
) -> Option<(SampleSummary, Vec<FlaggedDevice>)> {
    let sample: Vec<f64> = index.counts().map(|(_, c)| c as f64).collect();
    let summary = SampleSummary::from_values(&sample)?;

    let flagged = index
        .counts()
        .filter_map(|(id, count)| {
            let z = summary.z_score(count as f64);
            (z.abs() > threshold).then(|| FlaggedDevice {
                device_id: id.to_string(),
                count,
                z_score: z,
            })
        })
        .collect();

    Some((summary, flagged))
}

// ── OutlierReport ─────────────────────────────────────────────────────────────

/// Result of [`filter_outliers`].
#[derive(Debug, Clone)]
pub struct OutlierReport {
    /// Events of non-flagged devices, original order.
    pub kept: Vec<Event>,
    pub flagged: Vec<FlaggedDevice>,
    pub summary: SampleSummary,
}

impl OutlierReport {
    /// Number of events removed across all flagged devices.
    pub fn removed_events(&self) -> usize {
        self.flagged.iter().map(|d| d.count).sum()
    }
}

/// Drop every event of every outlier device.
///
/// Returns `None` when `events` is empty: there is no population to judge.
pub fn filter_outliers(events: Vec<Event>, threshold: f64) -> Option<OutlierReport> {
    let index = DeviceIndex::build(&events);
    let (summary, flagged) = flag_outliers(&index, threshold)?;

    let mut drop = vec![false; events.len()];
    for device in &flagged {
        for &pos in index.positions(&device.device_id) {
            drop[pos] = true;
        }
    }

    let kept: Vec<Event> = events
        .into_iter()
        .zip(drop)
        .filter_map(|(event, dropped)| (!dropped).then_some(event))
        .collect();

    debug!(
        "Outlier filter: {} devices, mean {:.3}, std {:.3}, {} flagged, {} events kept",
        index.device_count(),
        summary.mean,
        summary.std_dev,
        flagged.len(),
        kept.len(),
    );

    Some(OutlierReport {
        kept,
        flagged,
        summary,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
