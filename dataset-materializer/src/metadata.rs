//! Dataset metadata log
//!
//! `metadata.jsonl` holds one JSON object per line, one line per file in the
//! dataset. Lines are only ever appended; existing lines are never rewritten.

use crate::error::{MaterializeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One record of the metadata log
///
/// Field order matches the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Relative path of the audio file as seen by the dataset loader
    pub file_name: String,
    /// Transcription; empty until a later transcription step fills it
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub class_labels: Vec<String>,
    /// Hex SHA-256 of the moved file, when checksums are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shasum: Option<String>,
    /// File name before renaming, when source names are recorded
    #[serde(
        rename = "original_filename",
        alias = "original_file_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_file_name: Option<String>,
}

impl DatasetEntry {
    /// New record with empty text
    pub fn new(file_name: impl Into<String>, class_labels: Vec<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: String::new(),
            class_labels,
            shasum: None,
            original_file_name: None,
        }
    }

    /// Serialized form without the trailing newline
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Append-only writer for the metadata log
///
/// The file is opened once per run. Each record is encoded completely before
/// anything is written, then written as a single `json + "\n"` buffer and
/// flushed, so an interrupted run loses at most the record in flight and
/// never leaves half a line. The handle closes when the writer is dropped.
pub struct MetadataWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl MetadataWriter {
    /// Open (creating if needed) `path` for appending
    ///
    /// If a previous run left the log without a final newline, one is added so
    /// the next record starts on its own line.
    pub fn open(path: &Path) -> Result<Self> {
        let log_err = |source: std::io::Error| MaterializeError::MetadataLog {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(log_err)?;

        let len = file.metadata().map_err(log_err)?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1)).map_err(log_err)?;
            file.read_exact(&mut last).map_err(log_err)?;
            if last[0] != b'\n' {
                tracing::warn!(
                    path = %path.display(),
                    "Metadata log did not end with a newline; terminating last line"
                );
                file.write_all(b"\n").map_err(log_err)?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one record
    ///
    /// A serialization failure returns [`MaterializeError::Serialization`]
    /// with nothing written; an I/O failure returns
    /// [`MaterializeError::MetadataLog`].
    pub fn append(&mut self, entry: &DatasetEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        self.writer
            .write_all(&line)
            .and_then(|_| self.writer.flush())
            .map_err(|source| MaterializeError::MetadataLog {
                path: self.path.clone(),
                source,
            })?;

        self.written += 1;
        Ok(())
    }

    /// Records appended through this writer
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every record of a metadata log
///
/// A missing log reads as empty. Blank lines are skipped; any other line that
/// fails to parse is an error naming its 1-based line number.
pub fn read_entries(path: &Path) -> Result<Vec<DatasetEntry>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(MaterializeError::MetadataLog {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| MaterializeError::MetadataLog {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|source| {
            MaterializeError::MalformedRecord {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            }
        })?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Aggregate view of a metadata log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSummary {
    pub total: usize,
    /// Records whose `text` is still empty
    pub pending_transcription: usize,
    /// Records per class label
    pub labels: BTreeMap<String, usize>,
    pub with_checksum: usize,
}

impl LogSummary {
    pub fn from_entries(entries: &[DatasetEntry]) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            if entry.text.trim().is_empty() {
                summary.pending_transcription += 1;
            }
            if entry.shasum.is_some() {
                summary.with_checksum += 1;
            }
            for label in &entry.class_labels {
                *summary.labels.entry(label.clone()).or_insert(0) += 1;
            }
        }
        summary
    }
}

impl fmt::Display for LogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "records:               {}", self.total)?;
        writeln!(f, "pending transcription: {}", self.pending_transcription)?;
        writeln!(f, "with checksum:         {}", self.with_checksum)?;
        write!(f, "labels:")?;
        if self.labels.is_empty() {
            write!(f, " (none)")?;
        }
        for (label, count) in &self.labels {
            write!(f, "\n  {}: {}", label, count)?;
        }
        Ok(())
    }
}
