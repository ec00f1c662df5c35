use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque identifier of one object inside a project descriptor.
///
/// IDs minted by pbxpatch are always [`ObjectId::GENERATED_LEN`] uppercase hex characters.
/// Hand-authored descriptors may carry other alphanumeric IDs; those parse too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid object id {0:?}: expected a non-empty ASCII alphanumeric token")]
pub struct InvalidObjectId(pub String);

impl ObjectId {
    pub const GENERATED_LEN: usize = 24;

    pub fn parse(s: &str) -> Result<Self, InvalidObjectId> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(InvalidObjectId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Build a canonical ID from 12 bytes of entropy.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(hex::encode_upper(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the ID has the generated shape: 24 uppercase hex characters.
    pub fn is_canonical(&self) -> bool {
        self.0.len() == Self::GENERATED_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = InvalidObjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_canonical() {
        let id = ObjectId::from_bytes([0xab; 12]);
        assert_eq!(id.as_str(), "ABABABABABABABABABABABAB");
        assert!(id.is_canonical());
    }

    #[test]
    fn hand_authored_ids_parse_but_are_not_canonical() {
        let id = ObjectId::parse("5FEXTTGT0001").unwrap();
        assert!(!id.is_canonical());
    }

    #[test]
    fn rejects_punctuation_and_empty() {
        assert!(ObjectId::parse("").is_err());
        assert!(ObjectId::parse("3AC7/BF75").is_err());
        assert!(ObjectId::parse("\"quoted\"").is_err());
    }

    #[test]
    fn serde_rejects_invalid_ids() {
        let err = serde_json::from_str::<ObjectId>("\"not an id\"");
        assert!(err.is_err());
        let ok: ObjectId = serde_json::from_str("\"5FEXTDBG0001\"").unwrap();
        assert_eq!(ok.as_str(), "5FEXTDBG0001");
    }
}
