use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("account id must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("account id is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("topic id must not be empty")]
    EmptyTopic,
}

/// Number of raw bytes in an account identifier.
pub const ACCOUNT_ID_BYTES: usize = 32;

/// Application identifier
pub type AppId = u64;

/// Position identifier (non-fungible, never reused)
pub type PositionId = u64;

/// 32-byte account identifier, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(pub [u8; ACCOUNT_ID_BYTES]);

impl AccountId {
    pub const fn new(bytes: [u8; ACCOUNT_ID_BYTES]) -> Self {
        Self(bytes)
    }

    /// Deterministic id derived from a label: `BLAKE3(label)`.
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(value: &str) -> Result<Self, IdError> {
        let value = value.trim_start_matches("0x");
        if value.len() != ACCOUNT_ID_BYTES * 2 {
            return Err(IdError::InvalidLength {
                expected: ACCOUNT_ID_BYTES * 2,
                actual: value.len(),
            });
        }
        let mut bytes = [0u8; ACCOUNT_ID_BYTES];
        hex::decode_to_slice(value, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // short form keeps logs readable
        write!(f, "AccountId({}…)", &self.to_hex()[..12])
    }
}

impl From<[u8; ACCOUNT_ID_BYTES]> for AccountId {
    fn from(value: [u8; ACCOUNT_ID_BYTES]) -> Self {
        AccountId(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for AccountId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountId::from_hex(&value)
    }
}

/// Derive the protocol-owned account that holds an app's pay reserve and
/// mortgage collateral.
/// `market = BLAKE3("BONDFI_MARKET" || app_id.to_le_bytes())`
///
/// No key controls this account; funds only leave it through market operations.
pub fn market_account_id(app_id: AppId) -> AccountId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"BONDFI_MARKET");
    hasher.update(&app_id.to_le_bytes());
    AccountId(*hasher.finalize().as_bytes())
}

/// String key scoping one bonding-curve market instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicId(String);

impl TopicId {
    pub fn new(topic: impl Into<String>) -> Result<Self, IdError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(IdError::EmptyTopic);
        }
        Ok(Self(topic))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TopicId> for String {
    fn from(value: TopicId) -> Self {
        value.0
    }
}

impl TryFrom<String> for TopicId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TopicId::new(value)
    }
}

impl TryFrom<&str> for TopicId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        TopicId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_hex_roundtrip() {
        let id = AccountId::from_label("alice");
        let parsed = AccountId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(parsed, id);
        assert!(AccountId::from_hex(&format!("0x{}", id.to_hex())).is_ok());
    }

    #[test]
    fn test_account_rejects_bad_length() {
        assert!(matches!(
            AccountId::from_hex("abcd"),
            Err(IdError::InvalidLength { actual: 4, .. })
        ));
    }

    #[test]
    fn test_market_account_is_per_app() {
        assert_eq!(market_account_id(1), market_account_id(1));
        assert_ne!(market_account_id(1), market_account_id(2));
        assert_ne!(market_account_id(1), AccountId::from_label("BONDFI_MARKET"));
    }

    #[test]
    fn test_topic_rejects_empty() {
        assert!(TopicId::new("").is_err());
        assert_eq!(TopicId::new("rust").unwrap().as_str(), "rust");
    }
}
