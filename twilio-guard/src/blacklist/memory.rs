//! In-process blacklist store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{validate_phone_number, BlacklistStore, Caller};
use crate::error::Result;

/// Blacklist held in memory, shared across clones.
#[derive(Clone, Default)]
pub struct MemoryBlacklist {
    callers: Arc<RwLock<BTreeMap<String, bool>>>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with blacklisted numbers.
    pub fn with_blacklisted<I, S>(numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let callers = numbers.into_iter().map(|n| (n.into(), true)).collect();
        Self {
            callers: Arc::new(RwLock::new(callers)),
        }
    }
}

#[async_trait]
impl BlacklistStore for MemoryBlacklist {
    async fn is_blacklisted(&self, phone_number: &str) -> Result<bool> {
        Ok(self
            .callers
            .read()
            .await
            .get(phone_number)
            .copied()
            .unwrap_or(false))
    }

    async fn upsert(&self, caller: &Caller) -> Result<()> {
        validate_phone_number(&caller.phone_number)?;
        self.callers
            .write()
            .await
            .insert(caller.phone_number.clone(), caller.blacklisted);
        Ok(())
    }

    async fn remove(&self, phone_number: &str) -> Result<bool> {
        Ok(self.callers.write().await.remove(phone_number).is_some())
    }

    async fn list(&self) -> Result<Vec<Caller>> {
        Ok(self
            .callers
            .read()
            .await
            .iter()
            .map(|(phone_number, blacklisted)| Caller {
                phone_number: phone_number.clone(),
                blacklisted: *blacklisted,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_number_is_not_blacklisted() {
        let store = MemoryBlacklist::new();
        assert!(!store.is_blacklisted("+15005550006").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_toggles_flag() {
        let store = MemoryBlacklist::new();
        store.upsert(&Caller::blacklisted("+18182223333")).await.unwrap();
        assert!(store.is_blacklisted("+18182223333").await.unwrap());

        store.upsert(&Caller::new("+18182223333")).await.unwrap();
        assert!(!store.is_blacklisted("+18182223333").await.unwrap());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_clone_share_state() {
        let store = MemoryBlacklist::with_blacklisted(["+18182223333"]);
        let shared = store.clone();
        assert!(shared.remove("+18182223333").await.unwrap());
        assert!(!store.remove("+18182223333").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_rejects_long_number() {
        let store = MemoryBlacklist::new();
        let result = store.upsert(&Caller::new("1".repeat(21))).await;
        assert!(result.is_err());
    }
}
