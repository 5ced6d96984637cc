//! Dataset consistency check
//!
//! Compares the metadata log with the contents of `target_dir/data`. Useful
//! after an interrupted run, since a file can be moved without its record
//! being written.

use crate::metadata::DatasetEntry;
use crate::outcome::Outcome;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Problems found in a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Records checked
    pub checked: usize,
    /// Records whose file is not in the data directory
    pub missing_files: Vec<String>,
    /// `file_name` values that appear on more than one line
    pub duplicate_records: Vec<String>,
    /// Records whose `file_name` does not start with the expected prefix
    pub unresolvable: Vec<String>,
    /// Files in the data directory with no record
    pub orphan_files: Vec<PathBuf>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing_files.is_empty()
            && self.duplicate_records.is_empty()
            && self.unresolvable.is_empty()
            && self.orphan_files.is_empty()
    }

    pub fn outcome(&self) -> Outcome {
        if self.is_clean() {
            Outcome::Success
        } else {
            Outcome::Partial
        }
    }
}

/// Check `entries` against the files in `data_dir`
///
/// `prefix` is the record prefix (e.g. `./dataset/data`) that maps a
/// `file_name` onto a name inside `data_dir`.
pub fn verify_dataset(data_dir: &Path, prefix: &str, entries: &[DatasetEntry]) -> VerifyReport {
    let mut report = VerifyReport {
        checked: entries.len(),
        ..Default::default()
    };

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut referenced = BTreeSet::new();
    let prefix = format!("{}/", prefix.trim_end_matches('/'));

    for entry in entries {
        let count = seen.entry(entry.file_name.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            report.duplicate_records.push(entry.file_name.clone());
        }

        let Some(name) = entry.file_name.strip_prefix(&prefix) else {
            report.unresolvable.push(entry.file_name.clone());
            continue;
        };
        referenced.insert(name.to_string());
        if !data_dir.join(name).is_file() {
            report.missing_files.push(entry.file_name.clone());
        }
    }

    if data_dir.is_dir() {
        let walker = WalkDir::new(data_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            // Moved symlinks stay symlinks, so only directories are skipped
            if entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !referenced.contains(&name) {
                report.orphan_files.push(entry.into_path());
            }
        }
    }

    if report.is_clean() {
        tracing::info!(records = report.checked, "Dataset verified");
    } else {
        tracing::warn!(
            missing = report.missing_files.len(),
            duplicates = report.duplicate_records.len(),
            unresolvable = report.unresolvable.len(),
            orphans = report.orphan_files.len(),
            "Dataset verification found problems"
        );
    }

    report
}
