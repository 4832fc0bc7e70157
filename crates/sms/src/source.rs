use std::sync::Arc;

use async_trait::async_trait;
use finguide_core::{RawMessage, SortOrder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("SMS permission not granted")]
    PermissionDenied,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed message data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Callback invoked once per newly received message.
pub type MessageHandler = Arc<dyn Fn(RawMessage) + Send + Sync>;

/// Abstraction over the device's SMS provider.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Ask for read access. Returns whether access is now granted.
    async fn request_permission(&self) -> bool;

    /// Every message currently in the inbox, in the requested order.
    async fn read_inbox(&self, order: SortOrder) -> Result<Vec<RawMessage>, SourceError>;

    /// Start delivering new messages to `handler`. Calling this again replaces
    /// the previous registration.
    fn listen(&self, handler: MessageHandler) -> Result<(), SourceError>;

    /// Stop delivering new messages.
    fn stop(&self);
}
