//! Opaque entity identifiers.
//!
//! New identifiers are random UUIDv4 strings. Identifiers read back from
//! stored documents are kept verbatim, so documents written by older clients
//! (which minted ids from a millisecond timestamp) keep working.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when parsing an entity ID
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("Entity ID cannot be empty")]
    Empty,

    #[error("Entity ID cannot contain whitespace: {0:?}")]
    Whitespace(String),
}

/// Identifier of a workout, exercise or set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a user-supplied identifier.
    pub fn parse(s: &str) -> Result<Self, EntityIdError> {
        if s.is_empty() {
            return Err(EntityIdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EntityIdError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for compact listings.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique_uuids() {
        let a = EntityId::new();
        let b = EntityId::new();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_parse_accepts_legacy_timestamp_ids() {
        let id = EntityId::parse("1712345678901").unwrap();
        assert_eq!(id.as_str(), "1712345678901");
    }

    #[test]
    fn test_parse_rejects_empty_and_whitespace() {
        assert_eq!(EntityId::parse(""), Err(EntityIdError::Empty));
        assert!(matches!(
            EntityId::parse("abc def"),
            Err(EntityIdError::Whitespace(_))
        ));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = EntityId::parse("w1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"w1\"");

        let parsed: EntityId = serde_json::from_str("\"w1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_short() {
        let id = EntityId::parse("0123456789abcdef").unwrap();
        assert_eq!(id.short(), "01234567");

        let tiny = EntityId::parse("abc").unwrap();
        assert_eq!(tiny.short(), "abc");
    }
}
