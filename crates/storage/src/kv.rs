use async_trait::async_trait;
use finguide_core::{
    ConsentRecord, KEY_CONSENT_FLOW_COMPLETED, KEY_CONSENT_GIVEN, KEY_INITIAL_IMPORT_DONE,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Stored value for '{key}' is not a boolean: '{value}'")]
    Corrupt { key: String, value: String },
}

/// Boolean preferences that survive app restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError>;

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError>;

    /// Write several flags together. Implementations backed by a database
    /// should make this atomic.
    async fn set_bools(&self, entries: &[(&str, bool)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set_bool(key, *value).await?;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub async fn load_consent(store: &dyn KeyValueStore) -> Result<ConsentRecord, StoreError> {
    Ok(ConsentRecord {
        given: store.get_bool(KEY_CONSENT_GIVEN).await?.unwrap_or(false),
        flow_completed: store
            .get_bool(KEY_CONSENT_FLOW_COMPLETED)
            .await?
            .unwrap_or(false),
    })
}

/// Forget every SMS flag, as a full local-data wipe does.
pub async fn clear_sms_state(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    for key in [KEY_CONSENT_GIVEN, KEY_CONSENT_FLOW_COMPLETED, KEY_INITIAL_IMPORT_DONE] {
        store.remove(key).await?;
    }
    tracing::info!("Cleared SMS consent and import flags");
    Ok(())
}
