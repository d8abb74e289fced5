//! Input file discovery and output naming.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Prefix of every emitted counts file.
pub const OUTPUT_PREFIX: &str = "counts_";

/// Find the regular files directly inside `input_dir`, sorted by path.
///
/// Subdirectories are not descended into. Hidden files (leading `.`) are
/// skipped. When `extension` is set, only
/// files with that extension (without the dot) are returned.
pub fn find_log_files(input_dir: &Path, extension: Option<&str>) -> Vec<PathBuf> {
    if !input_dir.exists() {
        warn!("Input path does not exist: {}", input_dir.display());
        return Vec::new();
    }

    let wanted = extension.map(|e| e.trim_start_matches('.'));

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(input_dir)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter(|entry| match wanted {
            Some(ext) => entry
                .path()
                .extension()
                .map(|e| e == ext)
                .unwrap_or(false),
            None => true,
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Stem of a file name, falling back to the whole name.
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `counts_<stem>.csv` inside `output_dir`.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}{}.csv", OUTPUT_PREFIX, file_stem_string(input)))
}

/// Inverse of [`output_path_for`]: the raw stem a counts file was built from.
pub fn raw_stem_of_output(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix(OUTPUT_PREFIX)?
        .strip_suffix(".csv")
        .map(str::to_string)
}

/// Whether `file` is a counts file sitting directly in `output_dir`.
///
/// `output_dir` must already be canonical; `None` (no output directory yet)
/// never matches.
pub fn is_output_in(file: &Path, output_dir: Option<&Path>) -> bool {
    let Some(output_dir) = output_dir else {
        return false;
    };
    raw_stem_of_output(file).is_some()
        && file
            .parent()
            .and_then(|p| p.canonicalize().ok())
            .is_some_and(|p| p == output_dir)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
