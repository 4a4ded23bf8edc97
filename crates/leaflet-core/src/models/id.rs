//! Document identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Identity of a stored document.
///
/// Locally assigned identities are UUID v7 strings; identities assigned by the
/// remote are kept verbatim, so any non-blank string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

impl DocId {
    /// Create a new unique identity using UUID v7 (time-sortable)
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Borrow the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("document id cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for DocId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocId> for String {
    fn from(value: DocId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(DocId::generate(), DocId::generate());
    }

    #[test]
    fn parse_trims_and_rejects_blank() {
        let id: DocId = "  remote-42 ".parse().unwrap();
        assert_eq!(id.as_str(), "remote-42");
        assert!("   ".parse::<DocId>().is_err());
    }

    #[test]
    fn deserialize_rejects_empty_string() {
        assert!(serde_json::from_str::<DocId>("\"\"").is_err());
        let id: DocId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
