//! Result file discovery.
//!
//! Walks a results directory with the `ignore` crate's walker and keeps the
//! files the config's include/exclude globs select. Result directories are
//! routinely gitignored, so ignore files are NOT honoured here; only the
//! configured globs decide. Output is sorted so downstream bucketing sees
//! files in a stable order.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;

use crate::config::Config;

/// Find result files under `directory` selected by `config`.
///
/// ## Arguments
/// - `directory`: Results root (a single file is returned as-is if included)
/// - `config`: Include/exclude globs, matched against paths relative to `directory`
///
/// ## Returns
/// Sorted vector of paths to result files.
pub fn find_result_files(directory: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if directory.is_file() {
        let name = directory.file_name().map(Path::new).unwrap_or(directory);
        return Ok(if config.should_include(name) {
            vec![directory.to_path_buf()]
        } else {
            vec![]
        });
    }

    if !directory.is_dir() {
        anyhow::bail!("Results directory does not exist: {}", directory.display());
    }

    let walker = WalkBuilder::new(directory)
        .standard_filters(false) // No .gitignore / hidden-file filtering
        .follow_links(false)     // Don't follow symlinks (avoid cycles)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Permissions, broken symlinks: skip like any unreadable file
                tracing::debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let rel_path = path.strip_prefix(directory).unwrap_or(path);
        if config.should_include(rel_path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
