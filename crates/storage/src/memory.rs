use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::kv::{KeyValueStore, StoreError};

/// Non-persistent store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        Ok(self.values.read().await.get(key).copied())
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_bools(&self, entries: &[(&str, bool)]) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        for (key, value) in entries {
            values.insert((*key).to_string(), *value);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
