//! SQLite-backed blacklist store.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    FromRow, Row, SqlitePool,
};
use tracing::info;

use super::{sqlite_queries, validate_phone_number, BlacklistStore, Caller};
use crate::error::Result;

#[derive(Clone)]
pub struct SqliteBlacklist {
    pub db_pool: SqlitePool,
}

impl FromRow<'_, SqliteRow> for Caller {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            phone_number: row.try_get("phone_number")?,
            blacklisted: row.try_get("blacklisted")?,
        })
    }
}

impl SqliteBlacklist {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Open a pool for `database_url`.
    ///
    /// In-memory databases are limited to one connection, since every
    /// SQLite connection to `:memory:` sees its own empty database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?;
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let db_pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::new(db_pool))
    }

    /// Create the `callers` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(sqlite_queries::QUERY_CREATE_CALLERS)
            .execute(&self.db_pool)
            .await?;
        info!("callers_table_ready");
        Ok(())
    }
}

#[async_trait]
impl BlacklistStore for SqliteBlacklist {
    async fn is_blacklisted(&self, phone_number: &str) -> Result<bool> {
        let flag: Option<bool> = sqlx::query_scalar(sqlite_queries::QUERY_IS_BLACKLISTED)
            .bind(phone_number)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(flag.unwrap_or(false))
    }

    async fn upsert(&self, caller: &Caller) -> Result<()> {
        validate_phone_number(&caller.phone_number)?;
        sqlx::query(sqlite_queries::QUERY_UPSERT_CALLER)
            .bind(&caller.phone_number)
            .bind(caller.blacklisted)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, phone_number: &str) -> Result<bool> {
        let result = sqlx::query(sqlite_queries::QUERY_DELETE_CALLER)
            .bind(phone_number)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Caller>> {
        Ok(sqlx::query_as::<_, Caller>(sqlite_queries::QUERY_LIST_CALLERS)
            .fetch_all(&self.db_pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteBlacklist {
        let store = SqliteBlacklist::connect("sqlite::memory:").await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = memory_store().await;
        store.migrate().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blacklisted_lookup() {
        let store = memory_store().await;
        store.upsert(&Caller::blacklisted("+18182223333")).await.unwrap();
        store.upsert(&Caller::new("+15005550006")).await.unwrap();

        assert!(store.is_blacklisted("+18182223333").await.unwrap());
        assert!(!store.is_blacklisted("+15005550006").await.unwrap());
        assert!(!store.is_blacklisted("+19999999999").await.unwrap());
    }

    #[tokio::test]
    async fn test_one_record_per_number() {
        let store = memory_store().await;
        store.upsert(&Caller::new("+18182223333")).await.unwrap();
        store.upsert(&Caller::blacklisted("+18182223333")).await.unwrap();

        let callers = store.list().await.unwrap();
        assert_eq!(callers, vec![Caller::blacklisted("+18182223333")]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = memory_store().await;
        store.upsert(&Caller::blacklisted("+18182223333")).await.unwrap();

        assert!(store.remove("+18182223333").await.unwrap());
        assert!(!store.remove("+18182223333").await.unwrap());
        assert!(!store.is_blacklisted("+18182223333").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_number() {
        let store = memory_store().await;
        assert!(store.upsert(&Caller::new("")).await.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }
}
