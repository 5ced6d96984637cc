//! Test Helper Utilities
//!
//! Shared fixtures for dataset-materializer integration tests

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{generate_test_wav, AudioConfig};

use dataset_materializer::MaterializeConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch workspace with a `source/` directory and a `dataset/` target
pub struct Workspace {
    pub root: TempDir,
    pub source: PathBuf,
    pub target: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let source = root.path().join("source");
        let target = root.path().join("dataset");
        std::fs::create_dir_all(&source).expect("create source dir");
        Self {
            root,
            source,
            target,
        }
    }

    pub fn config(&self) -> MaterializeConfig {
        MaterializeConfig::new(&self.source, &self.target)
    }

    /// Write a short real WAV file into the source directory
    pub fn add_wav(&self, name: &str) -> PathBuf {
        generate_test_wav(&self.source.join(name), &AudioConfig::default())
            .expect("generate wav")
    }

    pub fn add_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.source.join(name);
        std::fs::write(&path, content).expect("write file");
        path
    }

    pub fn metadata_lines(&self) -> Vec<String> {
        read_lines(&self.target.join("metadata.jsonl"))
    }

    pub fn data_files(&self) -> Vec<String> {
        list_names(&self.target.join("data"))
    }

    pub fn source_files(&self) -> Vec<String> {
        list_names(&self.source)
    }
}

pub fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
