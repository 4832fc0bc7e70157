pub mod db;
pub mod kv;
pub mod memory;

pub use db::{DbPool, SqliteStore};
pub use kv::{clear_sms_state, load_consent, KeyValueStore, StoreError};
pub use memory::MemoryStore;
