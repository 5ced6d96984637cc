//! dataset-materializer library interface
//!
//! Moves raw audio files into a canonical dataset layout:
//!
//! ```text
//! target_dir/
//!   data/<8-hex-id>.wav
//!   metadata.jsonl
//! ```
//!
//! Exposes public APIs for the `materialize` binary and integration tests.

pub mod checksum;
pub mod config;
pub mod error;
pub mod materializer;
pub mod metadata;
pub mod outcome;
pub mod relocate;
pub mod scanner;
pub mod verify;

pub use crate::config::MaterializeConfig;
pub use crate::error::{MaterializeError, MoveError, Result};
pub use crate::materializer::{MaterializeReport, Materializer, SkipReason, SkippedFile};
pub use crate::metadata::{DatasetEntry, MetadataWriter};
pub use crate::outcome::Outcome;
