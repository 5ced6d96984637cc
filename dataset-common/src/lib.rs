//! # Dataset Common Library
//!
//! Shared code for the dataset tooling crates:
//! - Error types
//! - Configuration file discovery and TOML loading
//! - Short dataset identifiers and their generators

pub mod config;
pub mod error;
pub mod identifier;

pub use error::{Error, Result};
pub use identifier::{Identifier, IdentifierSource};
