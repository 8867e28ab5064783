//! Caller blacklist storage.
//!
//! The guard only ever asks one question of the store: is this number
//! blacklisted? Operators manage records through `upsert` / `remove`.
//!
//! ## Implementations
//!
//! - [`SqliteBlacklist`]: the persisted `callers` table
//! - [`MemoryBlacklist`]: an in-process map for tests and local runs

pub mod memory;
pub mod sqlite;
pub mod sqlite_queries;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result, MAX_PHONE_NUMBER_LEN};

pub use memory::MemoryBlacklist;
pub use sqlite::SqliteBlacklist;

/// A caller known to the application, keyed by phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub phone_number: String,
    #[serde(default)]
    pub blacklisted: bool,
}

impl Caller {
    /// A caller record that is not blacklisted.
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            blacklisted: false,
        }
    }

    /// A caller record flagged as blacklisted.
    pub fn blacklisted(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            blacklisted: true,
        }
    }
}

#[async_trait]
pub trait BlacklistStore: Send + Sync {
    /// Whether `phone_number` belongs to a blacklisted caller.
    /// Unknown numbers are not blacklisted.
    async fn is_blacklisted(&self, phone_number: &str) -> Result<bool>;

    /// Insert the caller, or replace the flag of an existing record.
    async fn upsert(&self, caller: &Caller) -> Result<()>;

    /// Delete the caller record. Returns whether a record existed.
    async fn remove(&self, phone_number: &str) -> Result<bool>;

    /// All caller records ordered by phone number.
    async fn list(&self) -> Result<Vec<Caller>>;
}

/// Reject phone numbers the `callers` table cannot hold.
pub fn validate_phone_number(phone_number: &str) -> Result<()> {
    if phone_number.is_empty() || phone_number.chars().count() > MAX_PHONE_NUMBER_LEN {
        return Err(GuardError::InvalidPhoneNumber(phone_number.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("+18182223333").is_ok());
        assert!(validate_phone_number("12345678901234567890").is_ok());
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("123456789012345678901").is_err());
    }

    #[test]
    fn test_caller_defaults_to_not_blacklisted() {
        let caller: Caller = serde_json::from_str(r#"{"phone_number":"+15005550006"}"#).unwrap();
        assert_eq!(caller, Caller::new("+15005550006"));
        assert!(Caller::blacklisted("+15005550006").blacklisted);
    }
}
