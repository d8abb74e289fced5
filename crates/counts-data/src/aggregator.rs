//! Hourly per-building aggregation of filtered events.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime, Timelike};
use counts_core::models::{AggregateRecord, Event};
use counts_core::time_utils::hour_bucket;
use regex::Regex;

use crate::parser::MAC_PATTERN;

fn ext_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"EXT-([A-Za-z0-9]{4})").expect("regex is valid"))
}

fn mac_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("(?i){MAC_PATTERN}-([A-Za-z0-9]{{4}})")).expect("regex is valid")
    })
}

/// Building code of a payload.
///
/// `EXT-XXXX` wins; otherwise a MAC address directly followed by `-XXXX`;
/// otherwise `None`.
pub fn extract_location(payload: &str) -> Option<&str> {
    ext_code_regex()
        .captures(payload)
        .or_else(|| mac_suffix_regex().captures(payload))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ── LocationAggregator ────────────────────────────────────────────────────────

/// Stateless helper grouping events by `(location, hour)`.
pub struct LocationAggregator;

impl LocationAggregator {
    /// One record per distinct `(location, hour)` in `events`.
    ///
    /// Records are ordered by location (absent first) then hour. Timestamps
    /// are `reference` at the group's hour.
    pub fn aggregate(events: &[Event], reference: NaiveDate) -> Vec<AggregateRecord> {
        let mut groups: BTreeMap<(Option<&str>, u32), u64> = BTreeMap::new();
        for event in events {
            let key = (extract_location(&event.payload), event.timestamp.hour());
            *groups.entry(key).or_insert(0) += 1;
        }

        groups
            .into_iter()
            .map(|((location, hour), count)| AggregateRecord {
                timestamp: hour_bucket(reference, hour)
                    .unwrap_or_else(|| reference.and_time(NaiveTime::MIN)),
                count,
                location: location.map(str::to_string),
            })
            .collect()
    }

    /// Sum of counts across `records`.
    pub fn total_count(records: &[AggregateRecord]) -> u64 {
        records.iter().map(|r| r.count).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, 15).unwrap()
    }

    fn event(hour: u32, minute: u32, payload: &str) -> Event {
        Event {
            timestamp: reference().and_hms_opt(hour, minute, 0).unwrap(),
            device_id: "aa:bb:cc:dd:ee:01".to_string(),
            payload: payload.to_string(),
        }
    }

    // ── extract_location ──────────────────────────────────────────────────────

    #[test]
    fn test_location_ext_pattern() {
        assert_eq!(extract_location("client x assoc EXT-AB12"), Some("AB12"));
        assert_eq!(extract_location("ap EXT-wood rest"), Some("wood"));
    }

    #[test]
    fn test_location_mac_suffix_pattern() {
        assert_eq!(
            extract_location("client aa:bb:cc:dd:ee:01 ap 00:1A:2b:3c:4d:5e-ATKN"),
            Some("ATKN")
        );
    }

    #[test]
    fn test_location_ext_takes_precedence() {
        let payload = "ap 00:11:22:33:44:55-WOOD client EXT-FRET";
        assert_eq!(extract_location(payload), Some("FRET"));
    }

    #[test]
    fn test_location_absent() {
        assert_eq!(extract_location("client aa:bb:cc:dd:ee:01 assoc"), None);
        assert_eq!(extract_location("EXT-AB"), None);
        assert_eq!(extract_location("aa:bb:cc:dd:ee:01 -ABCD"), None);
    }

    // ── aggregate ─────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_groups_by_location_and_hour() {
        let events = vec![
            event(9, 15, "EXT-AB12"),
            event(9, 47, "EXT-AB12"),
            event(10, 2, "EXT-CD34"),
            event(10, 30, "EXT-AB12"),
        ];
        let records = LocationAggregator::aggregate(&events, reference());

        assert_eq!(
            records,
            vec![
                AggregateRecord {
                    timestamp: reference().and_hms_opt(9, 0, 0).unwrap(),
                    count: 2,
                    location: Some("AB12".into()),
                },
                AggregateRecord {
                    timestamp: reference().and_hms_opt(10, 0, 0).unwrap(),
                    count: 1,
                    location: Some("AB12".into()),
                },
                AggregateRecord {
                    timestamp: reference().and_hms_opt(10, 0, 0).unwrap(),
                    count: 1,
                    location: Some("CD34".into()),
                },
            ]
        );
    }

    #[test]
    fn test_aggregate_keeps_events_without_location() {
        let events = vec![
            event(8, 0, "no code"),
            event(8, 5, "still no code"),
            event(8, 10, "EXT-ZZZZ"),
        ];
        let records = LocationAggregator::aggregate(&events, reference());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].location, None);
        assert_eq!(records[0].count, 2);
        assert_eq!(records[1].location.as_deref(), Some("ZZZZ"));
    }

    #[test]
    fn test_aggregate_partitions_all_events() {
        let payloads = ["EXT-AAAA", "EXT-BBBB", "none", "aa:bb:cc:dd:ee:ff-CCCC"];
        let events: Vec<Event> = (0..96)
            .map(|i| event(i % 24, i % 60, payloads[(i as usize) % payloads.len()]))
            .collect();
        let records = LocationAggregator::aggregate(&events, reference());
        assert_eq!(LocationAggregator::total_count(&records), events.len() as u64);
    }

    #[test]
    fn test_aggregate_uses_reference_day_for_timestamp() {
        // Syslog events can carry a different calendar day than the file's.
        let mut e = event(23, 59, "EXT-AB12");
        e.timestamp = NaiveDate::from_ymd_opt(2022, 3, 14)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let records = LocationAggregator::aggregate(&[e], reference());
        assert_eq!(records[0].timestamp, reference().and_hms_opt(23, 0, 0).unwrap());
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(LocationAggregator::aggregate(&[], reference()).is_empty());
    }
}
