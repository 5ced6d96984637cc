//! Short dataset identifiers
//!
//! An [`Identifier`] is exactly 8 lowercase hexadecimal characters. Production
//! code draws them from UUIDv4 values; tests substitute a deterministic
//! [`IdentifierSource`] so file names are predictable.

use crate::{Error, Result};
use std::fmt;
use uuid::Uuid;

/// Number of hex characters in an identifier
pub const IDENTIFIER_LEN: usize = 8;

/// 8-character lowercase hex identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Parse an identifier, rejecting anything that is not 8 lowercase hex chars
    pub fn parse(s: &str) -> Result<Self> {
        if is_valid_identifier(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidInput(format!(
                "identifier must be {} lowercase hex characters: {:?}",
                IDENTIFIER_LEN, s
            )))
        }
    }

    /// Identifier taken from the leading digits of a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        let simple = uuid.simple().to_string();
        Self(simple[..IDENTIFIER_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check the identifier shape without allocating
pub fn is_valid_identifier(s: &str) -> bool {
    s.len() == IDENTIFIER_LEN
        && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Source of fresh identifiers
///
/// No uniqueness is promised; callers must handle a repeated identifier as an
/// ordinary failure.
pub trait IdentifierSource {
    fn next_identifier(&mut self) -> Identifier;
}

/// Random identifiers from UUIDv4
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdentifiers;

impl IdentifierSource for UuidIdentifiers {
    fn next_identifier(&mut self) -> Identifier {
        Identifier::from_uuid(Uuid::new_v4())
    }
}

/// Counter-based identifiers: `00000000`, `00000001`, ...
#[derive(Debug, Default, Clone)]
pub struct SequentialIdentifiers {
    next: u32,
}

impl SequentialIdentifiers {
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }
}

impl IdentifierSource for SequentialIdentifiers {
    fn next_identifier(&mut self) -> Identifier {
        let id = Identifier(format!("{:08x}", self.next));
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Always yields the same identifier (forces destination collisions)
#[derive(Debug, Clone)]
pub struct FixedIdentifiers(Identifier);

impl FixedIdentifiers {
    pub fn new(id: Identifier) -> Self {
        Self(id)
    }
}

impl IdentifierSource for FixedIdentifiers {
    fn next_identifier(&mut self) -> Identifier {
        self.0.clone()
    }
}

impl<S: IdentifierSource + ?Sized> IdentifierSource for Box<S> {
    fn next_identifier(&mut self) -> Identifier {
        (**self).next_identifier()
    }
}
