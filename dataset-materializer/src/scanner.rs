//! Source directory scanner
//!
//! Lists the files directly inside the source directory (no recursion) in
//! file-name order so a run is reproducible regardless of the platform's
//! directory listing order.
//!
//! A symlink counts as a file when it resolves to a regular file; the link
//! itself is what gets moved. A matching name that resolves to anything else
//! is reported as unsupported rather than silently dropped.

use crate::config::extension_matches;
use crate::error::MaterializeError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scan result
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Files carrying the configured extension, sorted by name
    pub files: Vec<PathBuf>,
    /// Regular files left alone because the extension did not match
    pub ignored: Vec<PathBuf>,
    /// Matching names that are not regular files (dangling links, links to
    /// directories, sockets, ...)
    pub unsupported: Vec<PathBuf>,
    /// Entries that could not be read during the listing
    pub errors: Vec<String>,
}

/// Source file scanner
pub struct SourceScanner {
    extension: String,
}

impl SourceScanner {
    /// `extension` is lowercase with its leading dot, e.g. `.wav`
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Check the source directory before anything else happens
    pub fn check_source(&self, root_path: &Path) -> Result<(), MaterializeError> {
        let metadata = std::fs::metadata(root_path).map_err(|e| MaterializeError::Precondition {
            path: root_path.to_path_buf(),
            reason: if e.kind() == std::io::ErrorKind::NotFound {
                "source directory does not exist".to_string()
            } else {
                format!("cannot access source directory: {}", e)
            },
        })?;

        if !metadata.is_dir() {
            return Err(MaterializeError::Precondition {
                path: root_path.to_path_buf(),
                reason: "source path is not a directory".to_string(),
            });
        }

        // Open it once so an unreadable directory fails here, not mid-run
        std::fs::read_dir(root_path).map_err(|e| MaterializeError::Precondition {
            path: root_path.to_path_buf(),
            reason: format!("source directory is not readable: {}", e),
        })?;

        Ok(())
    }

    /// Scan the top level of `root_path`
    pub fn scan(&self, root_path: &Path) -> Result<ScanResult, MaterializeError> {
        self.check_source(root_path)?;

        let mut result = ScanResult::default();

        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        continue;
                    }
                    let is_file = file_type.is_file()
                        || (file_type.is_symlink()
                            && std::fs::metadata(entry.path())
                                .map(|m| m.is_file())
                                .unwrap_or(false));
                    let matched = self.matches(&entry.file_name().to_string_lossy());

                    match (matched, is_file) {
                        (true, true) => result.files.push(entry.into_path()),
                        (true, false) => {
                            tracing::warn!(
                                path = %entry.path().display(),
                                "Matching entry is not a regular file"
                            );
                            result.unsupported.push(entry.into_path());
                        }
                        (false, true) => result.ignored.push(entry.into_path()),
                        (false, false) => {}
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    result.errors.push(e.to_string());
                }
            }
        }

        tracing::debug!(
            matched = result.files.len(),
            ignored = result.ignored.len(),
            unsupported = result.unsupported.len(),
            errors = result.errors.len(),
            "Source scan complete"
        );

        Ok(result)
    }

    /// ASCII case-insensitive suffix match; a bare extension with no stem is ignored
    pub fn matches(&self, file_name: &str) -> bool {
        extension_matches(file_name, &self.extension)
    }
}

/// Check for a `RIFF....WAVE` header
pub fn has_wav_header(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;

    let mut buffer = [0u8; 12];
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(matches!(
        &buffer[..filled],
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E']
    ))
}
