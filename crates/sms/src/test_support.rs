use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use finguide_client::{ClientError, ParseResponse, RemoteParser};
use finguide_core::{sort_messages, RawMessage, SortOrder};
use finguide_storage::{KeyValueStore, MemoryStore, StoreError};
use tokio::sync::Semaphore;

use crate::source::{MessageHandler, MessageSource, SourceError};

pub fn momo(i: usize) -> RawMessage {
    RawMessage::new(
        "M-Money",
        format!("You have received {i} RWF from TEST at 2025-01-01 10:00:00"),
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(i as i64),
    )
}

pub fn personal(i: usize) -> RawMessage {
    RawMessage::new(
        "Mom",
        "call me later",
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(i as i64),
    )
}

pub struct FakeSource {
    pub granted: bool,
    pub inbox: Vec<RawMessage>,
    pub fail_read: bool,
    pub reads: AtomicUsize,
    pub listens: AtomicUsize,
    handler: Mutex<Option<MessageHandler>>,
}

impl FakeSource {
    pub fn with_inbox(inbox: Vec<RawMessage>) -> Self {
        Self {
            granted: true,
            inbox,
            fail_read: false,
            reads: AtomicUsize::new(0),
            listens: AtomicUsize::new(0),
            handler: Mutex::new(None),
        }
    }

    pub fn denied() -> Self {
        Self { granted: false, ..Self::with_inbox(Vec::new()) }
    }

    pub fn unreadable() -> Self {
        Self { fail_read: true, ..Self::with_inbox(Vec::new()) }
    }

    pub fn is_listening(&self) -> bool {
        self.handler.lock().unwrap().is_some()
    }

    /// Deliver a message as the OS would. Returns false when nobody listens.
    pub fn emit(&self, message: RawMessage) -> bool {
        let handler = self.handler.lock().unwrap().clone();
        match handler {
            Some(h) => {
                h(message);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl MessageSource for FakeSource {
    async fn request_permission(&self) -> bool {
        self.granted
    }

    async fn read_inbox(&self, order: SortOrder) -> Result<Vec<RawMessage>, SourceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_read {
            return Err(SourceError::Io(std::io::Error::other("provider crashed")));
        }
        let mut inbox = self.inbox.clone();
        sort_messages(&mut inbox, order);
        Ok(inbox)
    }

    fn listen(&self, handler: MessageHandler) -> Result<(), SourceError> {
        self.listens.fetch_add(1, Ordering::SeqCst);
        *self.handler.lock().unwrap() = Some(handler);
        Ok(())
    }

    fn stop(&self) {
        self.handler.lock().unwrap().take();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Report every message as parsed.
    Echo,
    /// Leave `parsed_count` out of the reply.
    Omit,
}

pub struct RecordingParser {
    pub calls: Mutex<Vec<Vec<String>>>,
    /// Zero-based index of the call that fails, if any.
    pub fail_on: Option<usize>,
    pub fail_all: AtomicBool,
    pub mode: CountMode,
    /// When set, each call waits for a permit before answering.
    pub gate: Option<Semaphore>,
}

impl RecordingParser {
    pub fn echo() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: None,
            fail_all: AtomicBool::new(false),
            mode: CountMode::Echo,
            gate: None,
        }
    }

    pub fn omitting_counts() -> Self {
        Self { mode: CountMode::Omit, ..Self::echo() }
    }

    pub fn failing_on(call: usize) -> Self {
        Self { fail_on: Some(call), ..Self::echo() }
    }

    pub fn gated() -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::echo() }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteParser for RecordingParser {
    async fn parse(&self, messages: Vec<String>) -> Result<ParseResponse, ClientError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.clone());
            calls.len() - 1
        };
        if self.fail_all.load(Ordering::SeqCst) || self.fail_on == Some(index) {
            return Err(ClientError::Status { status: 500, body: "parser down".into() });
        }
        Ok(match self.mode {
            CountMode::Echo => ParseResponse::with_count(messages.len()),
            CountMode::Omit => ParseResponse::default(),
        })
    }
}

/// Store whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_writes: AtomicBool,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        self.inner.get_bool(key).await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(disk_full(key));
        }
        self.inner.set_bool(key, value).await
    }

    async fn set_bools(&self, entries: &[(&str, bool)]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(disk_full(entries.first().map(|e| e.0).unwrap_or_default()));
        }
        self.inner.set_bools(entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}

fn disk_full(key: &str) -> StoreError {
    StoreError::Corrupt { key: key.to_string(), value: "disk full".to_string() }
}
