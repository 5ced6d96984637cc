//! Materializer configuration
//!
//! Settings are layered, highest priority first:
//! 1. Command-line arguments (and their environment variables, via clap)
//! 2. TOML configuration file
//! 3. Built-in defaults (code constants)
//!
//! The resolved [`MaterializeConfig`] is passed explicitly into each run; there
//! is no process-wide configuration state.

use crate::error::{MaterializeError, Result};
use dataset_common::config::LoggingConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_DIR: &str = "./crawled-audio/audio";
pub const DEFAULT_TARGET_DIR: &str = "./dataset";
pub const DEFAULT_LABEL: &str = "commercial";
pub const DEFAULT_EXTENSION: &str = ".wav";

/// Subdirectory of the target that holds renamed audio files
pub const DATA_DIR_NAME: &str = "data";
/// Metadata log file name inside the target directory
pub const METADATA_FILE_NAME: &str = "metadata.jsonl";

/// Configuration file contents
///
/// Every field is optional; anything left out falls through to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default)]
    pub target_dir: Option<PathBuf>,
    /// Single-label shorthand for `labels = ["..."]`
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub file_name_prefix: Option<String>,
    #[serde(default)]
    pub checksum: Option<bool>,
    #[serde(default)]
    pub record_source_name: Option<bool>,
    #[serde(default)]
    pub verify_header: Option<bool>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_dir: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
    /// Empty means "not given"
    pub labels: Vec<String>,
    pub extension: Option<String>,
    pub file_name_prefix: Option<String>,
    /// Flags can only switch a feature on
    pub checksum: bool,
    pub record_source_name: bool,
    pub verify_header: bool,
}

/// Resolved configuration for one materialization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeConfig {
    /// Directory scanned for audio files (never created)
    pub source_dir: PathBuf,
    /// Dataset root; `data/` and `metadata.jsonl` live here
    pub target_dir: PathBuf,
    /// Labels written to every record, in order
    pub labels: Vec<String>,
    /// Lowercase suffix including the leading dot
    pub extension: String,
    /// Prefix for `file_name` in records; derived from `target_dir` when unset
    pub file_name_prefix: Option<String>,
    /// Record a SHA-256 of each moved file
    pub checksum: bool,
    /// Record the file name the audio had before renaming
    pub record_source_name: bool,
    /// Require a RIFF/WAVE header before moving a file
    pub verify_header: bool,
}

impl MaterializeConfig {
    /// Configuration with built-in defaults for everything but the paths
    pub fn new(source_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            labels: vec![DEFAULT_LABEL.to_string()],
            extension: DEFAULT_EXTENSION.to_string(),
            file_name_prefix: None,
            checksum: false,
            record_source_name: false,
            verify_header: false,
        }
    }

    /// Merge command-line overrides, the TOML file and defaults, then validate
    pub fn resolve(overrides: ConfigOverrides, file: Option<&TomlConfig>) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();

        let source_dir = overrides
            .source_dir
            .or(file.source_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_DIR));
        let target_dir = overrides
            .target_dir
            .or(file.target_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_DIR));

        let labels = if !overrides.labels.is_empty() {
            overrides.labels
        } else if let Some(labels) = file.labels {
            labels
        } else if let Some(label) = file.label {
            vec![label]
        } else {
            vec![DEFAULT_LABEL.to_string()]
        };

        let extension = normalize_extension(
            overrides
                .extension
                .or(file.extension)
                .as_deref()
                .unwrap_or(DEFAULT_EXTENSION),
        )?;

        let config = Self {
            source_dir,
            target_dir,
            labels,
            extension,
            file_name_prefix: overrides.file_name_prefix.or(file.file_name_prefix),
            checksum: overrides.checksum || file.checksum.unwrap_or(false),
            record_source_name: overrides.record_source_name
                || file.record_source_name.unwrap_or(false),
            verify_header: overrides.verify_header || file.verify_header.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would produce unusable records
    pub fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            return Err(MaterializeError::Config(
                "at least one class label is required".to_string(),
            ));
        }
        if let Some(blank) = self.labels.iter().position(|l| l.trim().is_empty()) {
            return Err(MaterializeError::Config(format!(
                "class label #{} is blank",
                blank + 1
            )));
        }
        let normalized = normalize_extension(&self.extension)?;
        if normalized != self.extension {
            return Err(MaterializeError::Config(format!(
                "extension must be lowercase with a leading dot (got {:?}, expected {:?})",
                self.extension, normalized
            )));
        }
        Ok(())
    }

    /// `target_dir/data`
    pub fn data_dir(&self) -> PathBuf {
        self.target_dir.join(DATA_DIR_NAME)
    }

    /// `target_dir/metadata.jsonl`
    pub fn metadata_path(&self) -> PathBuf {
        self.target_dir.join(METADATA_FILE_NAME)
    }

    /// Prefix used for `file_name` in records, without a trailing slash
    pub fn record_prefix(&self) -> String {
        match &self.file_name_prefix {
            Some(prefix) => prefix.trim_end_matches('/').to_string(),
            None => default_file_name_prefix(&self.target_dir),
        }
    }

    /// Whether a file name carries the configured extension (ASCII case-insensitive)
    ///
    /// A bare `.wav` with no stem does not match.
    pub fn matches_extension(&self, file_name: &str) -> bool {
        extension_matches(file_name, &self.extension)
    }
}

/// Suffix match against a normalized extension
pub fn extension_matches(file_name: &str, extension: &str) -> bool {
    file_name.len() > extension.len() && file_name.to_ascii_lowercase().ends_with(extension)
}

/// `./<last component of target_dir>/data`
///
/// A target of `./dataset` or `/srv/corpora/dataset` both give `./dataset/data`.
pub fn default_file_name_prefix(target_dir: &Path) -> String {
    match target_dir.file_name() {
        Some(name) => format!("./{}/{}", name.to_string_lossy(), DATA_DIR_NAME),
        None => format!("./{}", DATA_DIR_NAME),
    }
}

/// Lowercase, ensure a leading dot, reject separators
pub fn normalize_extension(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let with_dot = if trimmed.starts_with('.') {
        trimmed.to_ascii_lowercase()
    } else {
        format!(".{}", trimmed.to_ascii_lowercase())
    };

    if with_dot.len() < 2 || with_dot.contains(['/', '\\']) || with_dot.contains(char::is_whitespace)
    {
        return Err(MaterializeError::Config(format!(
            "invalid file extension: {:?}",
            raw
        )));
    }
    Ok(with_dot)
}
