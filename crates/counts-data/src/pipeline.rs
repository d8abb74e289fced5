//! Per-file transformation pipeline.
//!
//! Runs the four stages strictly in sequence: marker filter, record parsing,
//! outlier removal and hourly aggregation. The full event list is
//! materialised before outlier removal, since device counts must be complete
//! before any removal decision.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use counts_core::error::{CountsError, Result};
use counts_core::models::{AggregateRecord, TransformOptions};
use tracing::debug;

use crate::aggregator::LocationAggregator;
use crate::line_filter::LineFilter;
use crate::outliers::{filter_outliers, FlaggedDevice};
use crate::parser::{ParseStats, RecordParser};

// ── Public types ──────────────────────────────────────────────────────────────

/// The complete output of transforming one file.
#[derive(Debug, Clone)]
pub struct FileTransform {
    pub reference_date: NaiveDate,
    pub stats: ParseStats,
    /// Devices removed by the outlier filter.
    pub flagged: Vec<FlaggedDevice>,
    /// Mean and sample standard deviation of per-device counts.
    pub count_mean: f64,
    pub count_std_dev: f64,
    /// Events surviving the outlier filter.
    pub kept_events: usize,
    pub records: Vec<AggregateRecord>,
    /// Wall-clock seconds spent filtering and parsing lines.
    pub parse_time_seconds: f64,
    /// Wall-clock seconds spent on outlier removal and aggregation.
    pub aggregate_time_seconds: f64,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Transform in-memory lines.
///
/// `source` labels the input in logs and errors (usually the file name).
pub fn transform_lines<I, S>(
    source: &str,
    lines: I,
    reference_date: NaiveDate,
    options: &TransformOptions,
) -> Result<FileTransform>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let filter = LineFilter::new(options.markers.clone())?;
    let parser = RecordParser::new(options.format, reference_date);

    // ── Step 1: Filter and parse ──────────────────────────────────────────────
    let parse_start = std::time::Instant::now();
    let mut stats = ParseStats::default();
    let mut lines_read = 0u64;
    let events = {
        let counted = lines.into_iter().inspect(|_| lines_read += 1);
        parser.parse_selected(filter.select(counted), &mut stats)
    };
    stats.lines_read = lines_read;
    let parse_time = parse_start.elapsed().as_secs_f64();

    debug!(
        "{}: {} lines read, {} selected, {} parsed, {} skipped",
        source,
        stats.lines_read,
        stats.lines_selected,
        stats.events_parsed,
        stats.skipped_total(),
    );

    // ── Step 2: Outliers ──────────────────────────────────────────────────────
    let aggregate_start = std::time::Instant::now();
    let report = filter_outliers(events, options.z_threshold)
        .ok_or_else(|| CountsError::EmptyPopulation(source.to_string()))?;

    for device in &report.flagged {
        debug!(
            "{}: dropping device {} ({} events, z = {:.2})",
            source, device.device_id, device.count, device.z_score
        );
    }

    // ── Step 3: Aggregate ─────────────────────────────────────────────────────
    let records = LocationAggregator::aggregate(&report.kept, reference_date);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    Ok(FileTransform {
        reference_date,
        stats,
        count_mean: report.summary.mean,
        count_std_dev: report.summary.std_dev,
        kept_events: report.kept.len(),
        flagged: report.flagged,
        records,
        parse_time_seconds: parse_time,
        aggregate_time_seconds: aggregate_time,
    })
}

/// Read a byte stream once, then transform it.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the file.
pub fn transform_reader<R: Read>(
    source: &str,
    mut reader: R,
    reference_date: NaiveDate,
    options: &TransformOptions,
) -> Result<FileTransform> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let text = String::from_utf8_lossy(&raw);
    transform_lines(source, text.lines(), reference_date, options)
}

/// Open `path` and transform its contents.
pub fn transform_file(
    path: &Path,
    reference_date: NaiveDate,
    options: &TransformOptions,
) -> Result<FileTransform> {
    let file = std::fs::File::open(path).map_err(|source| CountsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    transform_reader(&source, std::io::BufReader::new(file), reference_date, options).map_err(
        |err| match err {
            CountsError::Io(source) => CountsError::FileRead {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        },
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use counts_core::models::TimestampFormat;
    use std::io::Write;
    use tempfile::TempDir;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, 15).unwrap()
    }

    const EXAMPLE: &[&str] = &[
        "03 15 09:15:02 <501100> client aa:bb:cc:dd:ee:01 assoc EXT-AB12",
        "03 15 09:47:11 <501100> client aa:bb:cc:dd:ee:01 assoc EXT-AB12",
        "03 15 10:02:44 <501100> client ff:ee:dd:cc:bb:02 assoc EXT-CD34",
    ];

    // ── transform_lines ───────────────────────────────────────────────────────

    #[test]
    fn test_worked_example() {
        let result =
            transform_lines("example", EXAMPLE, reference(), &TransformOptions::default()).unwrap();

        assert!(result.flagged.is_empty());
        assert!((result.count_mean - 1.5).abs() < 1e-12);
        assert!((result.count_std_dev - 0.707).abs() < 1e-3);
        assert_eq!(
            result.records,
            vec![
                AggregateRecord {
                    timestamp: reference().and_hms_opt(9, 0, 0).unwrap(),
                    count: 2,
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
    fn test_unselected_and_bad_lines_are_counted() {
        let mut lines: Vec<&str> = EXAMPLE.to_vec();
        lines.push("03 15 10:05:00 <501095> client aa:bb:cc:dd:ee:09 assoc EXT-AB12");
        lines.push("03 15 1x:05:00 <501100> client aa:bb:cc:dd:ee:09 assoc EXT-AB12");
        lines.push("03 15 10:06:00 <501100> client with no address EXT-AB12");

        let result =
            transform_lines("mixed", lines, reference(), &TransformOptions::default()).unwrap();

        assert_eq!(result.stats.lines_read, 6);
        assert_eq!(result.stats.lines_selected, 5);
        assert_eq!(result.stats.events_parsed, 3);
        assert_eq!(result.stats.skipped_total(), 2);
        assert_eq!(LocationAggregator::total_count(&result.records), 3);
    }

    #[test]
    fn test_no_matching_lines_is_empty_population() {
        let lines = ["03 15 10:05:00 <501095> client aa:bb:cc:dd:ee:09"];
        let err = transform_lines("quiet.log", lines, reference(), &TransformOptions::default())
            .unwrap_err();
        assert!(matches!(err, CountsError::EmptyPopulation(ref s) if s == "quiet.log"));
    }

    #[test]
    fn test_empty_marker_list_is_config_error() {
        let options = TransformOptions {
            markers: Vec::new(),
            ..TransformOptions::default()
        };
        let err = transform_lines("x", EXAMPLE, reference(), &options).unwrap_err();
        assert!(matches!(err, CountsError::Config(_)));
    }

    #[test]
    fn test_partition_and_conservation_with_outlier() {
        let mut lines = Vec::new();
        for i in 0..20 {
            lines.push(format!(
                "Mar 15 08:{:02}:00 <501100> client 00:00:00:00:00:{:02x} EXT-QUIE",
                i, i
            ));
        }
        for i in 0..50 {
            lines.push(format!(
                "Mar 15 {:02}:{:02}:00 <501100> client de:ad:be:ef:00:01 EXT-SCAN",
                9 + i / 60,
                i % 60
            ));
        }
        let options = TransformOptions {
            format: TimestampFormat::Syslog,
            ..TransformOptions::default()
        };
        let result = transform_lines("scan", &lines, reference(), &options).unwrap();

        let removed: usize = result.flagged.iter().map(|d| d.count).sum();
        assert_eq!(result.stats.events_parsed as usize, result.kept_events + removed);
        assert_eq!(
            LocationAggregator::total_count(&result.records),
            result.kept_events as u64
        );
        assert_eq!(result.flagged.len(), 1);
        assert!(result
            .records
            .iter()
            .all(|r| r.location.as_deref() == Some("QUIE")));
    }

    #[test]
    fn test_multiple_markers_select_more_lines() {
        let lines = [
            "03 15 09:00:00 <501100> client aa:bb:cc:dd:ee:01 EXT-AB12",
            "03 15 09:10:00 <501095> client aa:bb:cc:dd:ee:02 EXT-AB12",
            "03 15 09:20:00 <501093> client aa:bb:cc:dd:ee:03 EXT-AB12",
        ];
        let options = TransformOptions {
            markers: vec!["<501100>".into(), "<501095>".into()],
            ..TransformOptions::default()
        };
        let result = transform_lines("multi", lines, reference(), &options).unwrap();
        assert_eq!(result.stats.lines_selected, 2);
        assert_eq!(result.records[0].count, 2);
    }

    // ── transform_reader / transform_file ─────────────────────────────────────

    #[test]
    fn test_transform_reader_tolerates_invalid_utf8() {
        let mut bytes = EXAMPLE.join("\n").into_bytes();
        bytes.extend_from_slice(b"\n03 15 11:00:00 \xff\xfe garbage <501100>\n");
        let result = transform_reader(
            "bytes",
            bytes.as_slice(),
            reference(),
            &TransformOptions::default(),
        )
        .unwrap();
        assert_eq!(result.stats.lines_read, 4);
        assert_eq!(result.stats.events_parsed, 3);
    }

    #[test]
    fn test_transform_file_reads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wlan-03-15-2022.log");
        let mut file = std::fs::File::create(&path).unwrap();
        for line in EXAMPLE {
            writeln!(file, "{}", line).unwrap();
        }
        drop(file);

        let result = transform_file(&path, reference(), &TransformOptions::default()).unwrap();
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_transform_file_missing_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-03-15-2022.log");
        let err = transform_file(&path, reference(), &TransformOptions::default()).unwrap_err();
        assert!(matches!(err, CountsError::FileRead { .. }));
    }
}
