use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

use crate::kv::{KeyValueStore, StoreError};

pub type DbPool = Pool<Sqlite>;

/// Key-value flags kept in the app's SQLite `settings` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let pool = create_db(path).await?;
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn parse_bool(key: &str, value: String) -> Result<bool, StoreError> {
    match value.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(StoreError::Corrupt { key: key.to_string(), value }),
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

const UPSERT: &str =
    "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value";

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        let row = sqlx::query_as::<_, (String,)>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(value,)| parse_bool(key, value)).transpose()
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(bool_text(value))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_bools(&self, entries: &[(&str, bool)]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(UPSERT)
                .bind(*key)
                .bind(bool_text(*value))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::load_consent;
    use finguide_core::{ConsentRecord, KEY_CONSENT_FLOW_COMPLETED, KEY_CONSENT_GIVEN};

    #[tokio::test]
    async fn round_trips_flags_in_memory() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.get_bool("smsConsentGiven").await.unwrap(), None);
        store.set_bool("smsConsentGiven", true).await.unwrap();
        assert_eq!(store.get_bool("smsConsentGiven").await.unwrap(), Some(true));
        store.set_bool("smsConsentGiven", false).await.unwrap();
        assert_eq!(store.get_bool("smsConsentGiven").await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn flags_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finguide.db");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store
                .set_bools(&[(KEY_CONSENT_GIVEN, false), (KEY_CONSENT_FLOW_COMPLETED, true)])
                .await
                .unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::open(&path).await.unwrap();
        assert_eq!(load_consent(&store).await.unwrap(), ConsentRecord::declined());
    }

    #[tokio::test]
    async fn remove_deletes_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.set_bool("k", true).await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get_bool("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_value_is_reported() {
        let store = SqliteStore::in_memory().await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('k', 'yes')")
            .execute(store.pool())
            .await
            .unwrap();
        assert!(matches!(
            store.get_bool("k").await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
