use std::sync::{Arc, Mutex, PoisonError};

use finguide_client::RemoteParser;
use finguide_core::{MessageFilter, RawMessage};
use tokio::sync::broadcast;

use crate::source::{MessageSource, SourceError};

/// A live message the backend did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub message: RawMessage,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveOutcome {
    /// Not a financial message.
    Ignored,
    Forwarded { parsed: usize },
    Failed(ListenerFailure),
}

pub type FailureReporter = Arc<dyn Fn(&ListenerFailure) + Send + Sync>;

/// Forwards financial messages from the live feed to observers and the parser.
pub struct LiveListener {
    parser: Arc<dyn RemoteParser>,
    filter: MessageFilter,
    sender: Mutex<Option<broadcast::Sender<RawMessage>>>,
    reporter: Option<FailureReporter>,
}

impl LiveListener {
    pub fn new(parser: Arc<dyn RemoteParser>, filter: MessageFilter, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            parser,
            filter,
            sender: Mutex::new(Some(sender)),
            reporter: None,
        }
    }

    pub fn with_failure_reporter(mut self, reporter: FailureReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn feed(&self) -> Option<broadcast::Sender<RawMessage>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Send to every subscriber. False once disposed.
    fn publish(&self, message: &RawMessage) -> bool {
        match self.feed() {
            Some(sender) => {
                // No subscribers is fine.
                let _ = sender.send(message.clone());
                true
            }
            None => false,
        }
    }

    /// A new feed of financial messages, or `None` once disposed.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<RawMessage>> {
        self.feed().as_ref().map(broadcast::Sender::subscribe)
    }

    /// Register with `source`. Each delivered message is handled on its own
    /// task so a slow or failing parse never holds up the next one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>, source: &dyn MessageSource) -> Result<(), SourceError> {
        let runtime = tokio::runtime::Handle::current();
        let listener = Arc::clone(self);
        source.listen(Arc::new(move |message: RawMessage| {
            let listener = Arc::clone(&listener);
            runtime.spawn(async move {
                listener.on_message(message).await;
            });
        }))?;
        tracing::info!("Live SMS listener started");
        Ok(())
    }

    /// Publish and forward one message. A disposed listener ignores everything.
    pub async fn on_message(&self, message: RawMessage) -> LiveOutcome {
        if !message.has_body() || !self.filter.matches(&message) {
            return LiveOutcome::Ignored;
        }
        if !self.publish(&message) {
            tracing::debug!(sender = message.address(), "Live SMS after dispose, ignoring");
            return LiveOutcome::Ignored;
        }

        match self.parser.parse(vec![message.body().to_string()]).await {
            Ok(response) => {
                let parsed = response.parsed_or(1);
                tracing::info!(sender = message.address(), parsed, "Live SMS forwarded");
                LiveOutcome::Forwarded { parsed }
            }
            Err(e) => {
                tracing::warn!(sender = message.address(), "Live SMS parse failed: {e}");
                let failure = ListenerFailure { message, error: e.to_string() };
                if let Some(report) = &self.reporter {
                    report(&failure);
                }
                LiveOutcome::Failed(failure)
            }
        }
    }

    /// Close the feed. Every subscriber sees `RecvError::Closed` once it has
    /// drained what was already sent.
    pub fn dispose(&self) {
        let taken = self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        if taken.is_some() {
            tracing::info!("Live SMS listener disposed");
        }
    }
}
