use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use finguide_client::RemoteParser;
use finguide_core::{ConsentRecord, MessageFilter, KEY_CONSENT_FLOW_COMPLETED, KEY_CONSENT_GIVEN};
use finguide_storage::{load_consent, KeyValueStore, StoreError};
use thiserror::Error;
use tokio::sync::watch;

use crate::import::{HistoricalImporter, ImportOptions};
use crate::listener::LiveListener;
use crate::source::MessageSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentState {
    Initial,
    RequestingPermission,
    /// The OS refused access. The consent screen will be shown again next launch.
    PermissionDenied,
    Importing,
    Complete { imported: usize },
    Skipped,
    Error { message: String },
}

impl ConsentState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConsentState::PermissionDenied
                | ConsentState::Complete { .. }
                | ConsentState::Skipped
                | ConsentState::Error { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentEvent {
    Accepted,
    Declined,
}

#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("A consent flow is already in progress")]
    Busy,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Clears the in-progress flag when the flow finishes, however it finishes.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The one-time SMS consent sequence: permission, historical import, then
/// live listening.
///
/// Once a flow has completed, `Accepted` does not import again. A user who
/// accepted gets the live listener back and `Complete { imported: 0 }`; a user
/// who declined stays `Skipped` until the stored answer is cleared.
///
/// I/O failures end in [`ConsentState::PermissionDenied`] or
/// [`ConsentState::Error`]; none escape as errors. The only error returned
/// from [`ConsentFlow::handle`] is [`ConsentError::Busy`] for an event that
/// arrives while another is still being processed.
pub struct ConsentFlow {
    source: Arc<dyn MessageSource>,
    store: Arc<dyn KeyValueStore>,
    importer: HistoricalImporter,
    listener: Arc<LiveListener>,
    state: watch::Sender<ConsentState>,
    running: AtomicBool,
}

impl ConsentFlow {
    pub fn new(
        source: Arc<dyn MessageSource>,
        parser: Arc<dyn RemoteParser>,
        store: Arc<dyn KeyValueStore>,
        listener: Arc<LiveListener>,
        options: ImportOptions,
        filter: MessageFilter,
    ) -> Self {
        let importer = HistoricalImporter::new(
            Arc::clone(&source),
            parser,
            Arc::clone(&store),
            filter,
            options,
        );
        let (state, _) = watch::channel(ConsentState::Initial);
        Self {
            source,
            store,
            importer,
            listener,
            state,
            running: AtomicBool::new(false),
        }
    }

    pub fn states(&self) -> watch::Receiver<ConsentState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ConsentState {
        self.state.borrow().clone()
    }

    /// Whether the consent screen still has to be shown.
    pub async fn needs_consent(&self) -> Result<bool, ConsentError> {
        Ok(load_consent(self.store.as_ref()).await?.needs_prompt())
    }

    pub async fn handle(&self, event: ConsentEvent) -> Result<ConsentState, ConsentError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::warn!(?event, "Ignoring consent event while a flow is running");
            return Err(ConsentError::Busy);
        };

        let end = match event {
            ConsentEvent::Accepted => match load_consent(self.store.as_ref()).await {
                Ok(record) if record.flow_completed => self.resume(record),
                Ok(_) => self.accept().await,
                Err(e) => ConsentState::Error { message: e.to_string() },
            },
            ConsentEvent::Declined => self.decline().await,
        };
        self.transition(end.clone());
        Ok(end)
    }

    fn transition(&self, next: ConsentState) {
        tracing::debug!(state = ?next, "Consent state");
        self.state.send_replace(next);
    }

    async fn accept(&self) -> ConsentState {
        self.transition(ConsentState::RequestingPermission);
        if !self.source.request_permission().await {
            tracing::info!("SMS permission denied");
            return ConsentState::PermissionDenied;
        }

        if let Err(e) = self.store.set_bool(KEY_CONSENT_GIVEN, true).await {
            return ConsentState::Error { message: e.to_string() };
        }

        self.transition(ConsentState::Importing);
        let result = self.importer.run().await;
        if let Some(message) = result.aborted {
            return ConsentState::Error { message };
        }

        if let Err(e) = self.listener.start(self.source.as_ref()) {
            // Historical data is in; the app works without live capture.
            tracing::warn!("Could not start live SMS listener: {e}");
        }

        if let Err(e) = self.store.set_bool(KEY_CONSENT_FLOW_COMPLETED, true).await {
            return ConsentState::Error { message: e.to_string() };
        }

        tracing::info!(imported = result.parsed, "SMS consent flow complete");
        ConsentState::Complete { imported: result.parsed }
    }

    fn resume(&self, record: ConsentRecord) -> ConsentState {
        if !record.given {
            tracing::info!("SMS consent was declined earlier, not prompting again");
            return ConsentState::Skipped;
        }
        if let Err(e) = self.listener.start(self.source.as_ref()) {
            tracing::warn!("Could not start live SMS listener: {e}");
        }
        tracing::info!("SMS consent already given, live capture resumed");
        ConsentState::Complete { imported: 0 }
    }

    async fn decline(&self) -> ConsentState {
        let written = self
            .store
            .set_bools(&[(KEY_CONSENT_GIVEN, false), (KEY_CONSENT_FLOW_COMPLETED, true)])
            .await;
        match written {
            Ok(()) => {
                tracing::info!("SMS consent declined");
                ConsentState::Skipped
            }
            Err(e) => ConsentState::Error { message: e.to_string() },
        }
    }
}
