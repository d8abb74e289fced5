//! CSV emission for aggregated counts.

use std::path::Path;

use counts_core::error::{CountsError, Result};
use counts_core::formatting::render_csv;
use counts_core::models::AggregateRecord;

/// Atomically write `records` as a counts CSV at `path`.
///
/// The table goes to a sibling temp file first and is renamed into place, so
/// a failed write never leaves a partial CSV behind.
pub fn write_counts_csv(path: &Path, records: &[AggregateRecord]) -> Result<()> {
    let write_err = |source| CountsError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp = path.with_extension("csv.tmp");
    std::fs::write(&tmp, render_csv(records)).map_err(write_err)?;
    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn records() -> Vec<AggregateRecord> {
        let day = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        vec![
            AggregateRecord {
                timestamp: day.and_hms_opt(9, 0, 0).unwrap(),
                count: 2,
                location: Some("AB12".into()),
            },
            AggregateRecord {
                timestamp: day.and_hms_opt(10, 0, 0).unwrap(),
                count: 1,
                location: None,
            },
        ]
    }

    #[test]
    fn test_write_counts_csv_creates_parent_and_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("counts_wlan-03-15-2022.csv");

        write_counts_csv(&path, &records()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "timestamp,count,building\n2022-03-15 09:00:00,2,AB12\n2022-03-15 10:00:00,1,\n"
        );
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_write_counts_csv_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counts_x.csv");
        std::fs::write(&path, "stale").unwrap();

        write_counts_csv(&path, &records()[..1]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,count,building\n"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_write_counts_csv_unwritable_target() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("counts_x.csv");

        let err = write_counts_csv(&path, &records()).unwrap_err();
        assert!(matches!(err, CountsError::FileWrite { .. }));
    }
}
