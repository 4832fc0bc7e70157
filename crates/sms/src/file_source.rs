use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use finguide_core::{sort_messages, RawMessage, SortOrder};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::source::{MessageHandler, MessageSource, SourceError};

/// Message source for desktop hosts.
///
/// The inbox is a JSON array of messages exported from a phone. New messages
/// arrive as single-message JSON files in the intake directory; write them in
/// place or move them in, but do not leave them half-written.
pub struct FileMessageSource {
    inbox_path: PathBuf,
    intake_dir: PathBuf,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FileMessageSource {
    pub fn new(inbox_path: PathBuf, intake_dir: PathBuf) -> Self {
        Self {
            inbox_path,
            intake_dir,
            watcher: Mutex::new(None),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

fn read_message_file(path: &Path) -> Result<RawMessage, SourceError> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

#[async_trait]
impl MessageSource for FileMessageSource {
    async fn request_permission(&self) -> bool {
        match tokio::fs::metadata(&self.inbox_path).await {
            Ok(meta) => meta.is_file(),
            Err(e) => {
                tracing::info!("Inbox {} not readable: {e}", self.inbox_path.display());
                false
            }
        }
    }

    async fn read_inbox(&self, order: SortOrder) -> Result<Vec<RawMessage>, SourceError> {
        let data = tokio::fs::read(&self.inbox_path).await?;
        let mut messages: Vec<RawMessage> = serde_json::from_slice(&data)?;
        sort_messages(&mut messages, order);
        Ok(messages)
    }

    fn listen(&self, handler: MessageHandler) -> Result<(), SourceError> {
        std::fs::create_dir_all(&self.intake_dir)?;

        let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            let ev = match event {
                Ok(ev) => ev,
                Err(e) => {
                    tracing::warn!("Intake watcher error: {e}");
                    return;
                }
            };
            if !is_arrival(&ev.kind) {
                return;
            }
            for path in ev.paths.iter().filter(|p| is_json(p)) {
                match read_message_file(path) {
                    Ok(message) => handler(message),
                    Err(e) => tracing::warn!("Skipping intake file {}: {e}", path.display()),
                }
            }
        })?;
        watcher.watch(&self.intake_dir, RecursiveMode::NonRecursive)?;

        // Dropping a previous watcher ends its registration.
        *self.watcher.lock().unwrap_or_else(PoisonError::into_inner) = Some(watcher);
        tracing::info!("Listening for new messages in {}", self.intake_dir.display());
        Ok(())
    }

    fn stop(&self) {
        if self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            tracing::info!("Stopped listening for new messages");
        }
    }
}
