//! Dataset materialization
//!
//! One pass over the source directory: every matching file is renamed to a
//! fresh identifier, moved into `target_dir/data`, and described by one line
//! appended to `target_dir/metadata.jsonl`.
//!
//! **Ordering:** the source directory is checked (and listed) before any
//! directory is created, so a missing source leaves no trace on disk.
//!
//! **Failure isolation:** a file that cannot be moved stays in the source
//! directory and gets no record; the run continues. Move and append are not
//! a transaction: if the append of a moved file's record fails, the file is
//! reported as orphaned. A serialization failure only orphans that file; a
//! metadata log I/O failure aborts the run.

use crate::checksum::sha256_file;
use crate::config::MaterializeConfig;
use crate::error::{MaterializeError, MoveError, Result};
use crate::metadata::{DatasetEntry, MetadataWriter};
use crate::outcome::Outcome;
use crate::relocate::move_file;
use crate::scanner::{has_wav_header, SourceScanner};
use chrono::{DateTime, Utc};
use dataset_common::identifier::UuidIdentifiers;
use dataset_common::IdentifierSource;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Why a source file was left in place
#[derive(Debug)]
pub enum SkipReason {
    /// Relocation failed (collision, permissions, ...)
    Move(MoveError),
    /// Header check enabled and the file is not RIFF/WAVE
    NotWav,
    /// Header check enabled and the file could not be read
    Unreadable(std::io::Error),
    /// Name matches but the entry is not a regular file (dangling or
    /// directory symlink, socket, ...)
    NotRegularFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Move(e) => write!(f, "{}", e),
            SkipReason::NotWav => write!(f, "missing RIFF/WAVE header"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {}", e),
            SkipReason::NotRegularFile => write!(f, "not a regular file"),
        }
    }
}

/// A source file that was not moved
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of one run
#[derive(Debug)]
pub struct MaterializeReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records appended, in processing order
    pub entries: Vec<DatasetEntry>,
    /// Files left in the source directory
    pub skipped: Vec<SkippedFile>,
    /// Files moved into the dataset whose record could not be written
    pub orphaned: Vec<PathBuf>,
    /// Source files without the configured extension
    pub ignored: usize,
    /// Source directory entries that could not be listed
    pub scan_errors: Vec<String>,
}

impl MaterializeReport {
    fn started() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            entries: Vec::new(),
            skipped: Vec::new(),
            orphaned: Vec::new(),
            ignored: 0,
            scan_errors: Vec::new(),
        }
    }

    /// Files now in the dataset (with or without a record)
    pub fn moved(&self) -> usize {
        self.entries.len() + self.orphaned.len()
    }

    /// Every matching file was moved and recorded
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.orphaned.is_empty() && self.scan_errors.is_empty()
    }

    pub fn outcome(&self) -> Outcome {
        if self.is_complete() {
            Outcome::Success
        } else {
            Outcome::Partial
        }
    }
}

/// Moves audio files into a dataset and records them
pub struct Materializer<S = UuidIdentifiers> {
    config: MaterializeConfig,
    ids: S,
}

impl Materializer<UuidIdentifiers> {
    /// Materializer drawing identifiers from UUIDv4
    pub fn new(config: MaterializeConfig) -> Self {
        Self::with_identifiers(config, UuidIdentifiers)
    }
}

impl<S: IdentifierSource> Materializer<S> {
    /// Materializer with a caller-supplied identifier source
    pub fn with_identifiers(config: MaterializeConfig, ids: S) -> Self {
        Self { config, ids }
    }

    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    /// Run one materialization pass
    ///
    /// Returns `Err` only for run-level failures (invalid configuration,
    /// missing source, target setup, metadata log I/O). Per-file failures
    /// are collected in the report.
    pub fn run(&mut self) -> Result<MaterializeReport> {
        self.config.validate()?;
        let mut report = MaterializeReport::started();

        info!(
            source = %self.config.source_dir.display(),
            target = %self.config.target_dir.display(),
            labels = ?self.config.labels,
            "Starting dataset materialization"
        );

        let scanner = SourceScanner::new(self.config.extension.clone());
        let scan = scanner.scan(&self.config.source_dir)?;
        report.ignored = scan.ignored.len();
        report.scan_errors = scan.errors;
        report
            .skipped
            .extend(scan.unsupported.into_iter().map(|path| SkippedFile {
                path,
                reason: SkipReason::NotRegularFile,
            }));

        let data_dir = self.config.data_dir();
        std::fs::create_dir_all(&data_dir).map_err(|source| MaterializeError::Setup {
            path: data_dir.clone(),
            source,
        })?;

        let mut writer = MetadataWriter::open(&self.config.metadata_path())?;
        let prefix = self.config.record_prefix();

        for src in &scan.files {
            self.process_file(src, &data_dir, &prefix, &mut writer, &mut report)?;
        }
        debug!(
            log = %writer.path().display(),
            records = writer.written(),
            "Closing metadata log"
        );
        drop(writer);

        report.finished_at = Utc::now();
        let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds();

        if report.is_complete() {
            info!(
                moved = report.entries.len(),
                ignored = report.ignored,
                elapsed_ms,
                "Dataset materialization complete"
            );
        } else {
            warn!(
                moved = report.moved(),
                recorded = report.entries.len(),
                skipped = report.skipped.len(),
                orphaned = report.orphaned.len(),
                scan_errors = report.scan_errors.len(),
                elapsed_ms,
                "Dataset materialization finished with failures"
            );
        }

        Ok(report)
    }

    fn process_file(
        &mut self,
        src: &Path,
        data_dir: &Path,
        prefix: &str,
        writer: &mut MetadataWriter,
        report: &mut MaterializeReport,
    ) -> Result<()> {
        let original_name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.config.verify_header {
            let reason = match has_wav_header(src) {
                Ok(true) => None,
                Ok(false) => Some(SkipReason::NotWav),
                Err(e) => Some(SkipReason::Unreadable(e)),
            };
            if let Some(reason) = reason {
                warn!(file = %src.display(), %reason, "Skipping file");
                report.skipped.push(SkippedFile {
                    path: src.to_path_buf(),
                    reason,
                });
                return Ok(());
            }
        }

        let id = self.ids.next_identifier();
        let new_name = format!("{}{}", id, self.config.extension);
        let dest = data_dir.join(&new_name);

        if let Err(e) = move_file(src, &dest) {
            warn!(file = %src.display(), error = %e, "Failed to move file, leaving it in place");
            report.skipped.push(SkippedFile {
                path: src.to_path_buf(),
                reason: SkipReason::Move(e),
            });
            return Ok(());
        }
        debug!(from = %src.display(), to = %dest.display(), "Moved file");

        let mut entry =
            DatasetEntry::new(format!("{}/{}", prefix, new_name), self.config.labels.clone());
        if self.config.checksum {
            match sha256_file(&dest) {
                Ok(hash) => entry.shasum = Some(hash),
                Err(e) => warn!(file = %dest.display(), error = %e, "Checksum failed, recording without it"),
            }
        }
        if self.config.record_source_name {
            entry.original_file_name = Some(original_name.clone());
        }

        match writer.append(&entry) {
            Ok(()) => {}
            Err(MaterializeError::Serialization(e)) => {
                error!(file = %dest.display(), error = %e, "Could not encode record; file moved without metadata");
                report.orphaned.push(dest);
                return Ok(());
            }
            Err(e) => {
                error!(file = %dest.display(), "Metadata log write failed; file moved without metadata");
                return Err(e);
            }
        }

        info!(source = %original_name, file_name = %entry.file_name, "Added to dataset");
        report.entries.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset_common::identifier::{FixedIdentifiers, SequentialIdentifiers};
    use dataset_common::Identifier;
    use std::fs;

    fn setup(files: &[&str]) -> (tempfile::TempDir, MaterializeConfig) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        fs::create_dir(&source).unwrap();
        for name in files {
            fs::write(source.join(name), name.as_bytes()).unwrap();
        }
        let config = MaterializeConfig::new(source, dir.path().join("dataset"));
        (dir, config)
    }

    #[test]
    fn test_sequential_ids_in_sorted_order() {
        let (_dir, config) = setup(&["b.wav", "a.wav"]);
        let mut materializer =
            Materializer::with_identifiers(config.clone(), SequentialIdentifiers::default());

        let report = materializer.run().unwrap();
        assert!(report.is_complete());
        let names: Vec<_> = report.entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["./dataset/data/00000000.wav", "./dataset/data/00000001.wav"]
        );
        // a.wav sorts first so it received the first identifier
        assert_eq!(
            fs::read(config.data_dir().join("00000000.wav")).unwrap(),
            b"a.wav"
        );
    }

    #[test]
    fn test_collision_skips_file_without_record() {
        let (_dir, config) = setup(&["a.wav", "b.wav"]);
        let fixed = FixedIdentifiers::new(Identifier::parse("cafebabe").unwrap());
        let mut materializer = Materializer::with_identifiers(config.clone(), fixed);

        let report = materializer.run().unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Move(MoveError::DestinationExists(_))
        ));
        assert!(config.source_dir.join("b.wav").exists());
        assert_eq!(
            fs::read(config.data_dir().join("cafebabe.wav")).unwrap(),
            b"a.wav"
        );
    }

    #[test]
    fn test_header_check_skips_non_wav() {
        let (_dir, mut config) = setup(&["fake.wav"]);
        config.verify_header = true;
        let mut materializer =
            Materializer::with_identifiers(config.clone(), SequentialIdentifiers::default());

        let report = materializer.run().unwrap();
        assert!(report.entries.is_empty());
        assert!(matches!(report.skipped[0].reason, SkipReason::NotWav));
        assert!(config.source_dir.join("fake.wav").exists());
    }

    #[test]
    fn test_provenance_fields() {
        let (_dir, mut config) = setup(&["spot.wav"]);
        config.checksum = true;
        config.record_source_name = true;
        let mut materializer =
            Materializer::with_identifiers(config, SequentialIdentifiers::default());

        let report = materializer.run().unwrap();
        let entry = &report.entries[0];
        assert_eq!(entry.original_file_name.as_deref(), Some("spot.wav"));
        assert_eq!(entry.shasum.as_ref().map(|s| s.len()), Some(64));
    }

    #[test]
    fn test_unlisted_entries_make_run_partial() {
        let mut report = MaterializeReport::started();
        assert_eq!(report.outcome(), Outcome::Success);

        report.scan_errors.push("IO error for operation on x.wav".to_string());
        assert!(!report.is_complete());
        assert_eq!(report.outcome(), Outcome::Partial);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_moved_or_reported() {
        use std::os::unix::fs::symlink;

        let (dir, config) = setup(&[]);
        let outside = dir.path().join("outside.wav");
        fs::write(&outside, b"linked").unwrap();
        symlink(&outside, config.source_dir.join("link.wav")).unwrap();
        symlink(dir.path().join("gone.wav"), config.source_dir.join("dangling.wav")).unwrap();

        let mut materializer =
            Materializer::with_identifiers(config.clone(), SequentialIdentifiers::default());
        let report = materializer.run().unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(
            fs::read(config.data_dir().join("00000000.wav")).unwrap(),
            b"linked"
        );
        assert!(fs::symlink_metadata(config.source_dir.join("link.wav")).is_err());

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, config.source_dir.join("dangling.wav"));
        assert!(matches!(report.skipped[0].reason, SkipReason::NotRegularFile));
        assert!(!report.is_complete());
        assert_eq!(report.outcome(), Outcome::Partial);
    }

    #[test]
    fn test_invalid_config_rejected_before_side_effects() {
        let (_dir, mut config) = setup(&["a.wav"]);
        config.labels.clear();
        let mut materializer = Materializer::new(config.clone());

        assert!(matches!(materializer.run(), Err(MaterializeError::Config(_))));
        assert!(!config.target_dir.exists());
    }
}
