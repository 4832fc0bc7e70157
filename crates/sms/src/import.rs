use std::sync::Arc;

use finguide_client::RemoteParser;
use finguide_core::{ImportResult, MessageFilter, SortOrder, KEY_INITIAL_IMPORT_DONE};
use finguide_storage::KeyValueStore;

use crate::source::MessageSource;

/// Messages per parse request.
pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub batch_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE }
    }
}

/// One-shot upload of the existing inbox to the remote parser.
///
/// Orchestrates: read inbox → filter → batch → parse sequentially → flag.
pub struct HistoricalImporter {
    source: Arc<dyn MessageSource>,
    parser: Arc<dyn RemoteParser>,
    store: Arc<dyn KeyValueStore>,
    filter: MessageFilter,
    options: ImportOptions,
}

impl HistoricalImporter {
    pub fn new(
        source: Arc<dyn MessageSource>,
        parser: Arc<dyn RemoteParser>,
        store: Arc<dyn KeyValueStore>,
        filter: MessageFilter,
        options: ImportOptions,
    ) -> Self {
        Self { source, parser, store, filter, options }
    }

    /// Never fails. An unreadable inbox yields an empty result; a failed
    /// parse request ends the run with `parsed = 0` and `aborted` set.
    /// Batches already accepted by the backend stay accepted.
    pub async fn run(&self) -> ImportResult {
        let messages = match self.source.read_inbox(SortOrder::NewestFirst).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Could not read SMS inbox, skipping import: {e}");
                return ImportResult::default();
            }
        };

        let bodies: Vec<String> = messages
            .iter()
            .filter(|m| m.has_body() && self.filter.matches(m))
            .map(|m| m.body().to_string())
            .collect();

        let mut result = ImportResult {
            read: messages.len(),
            matched: bodies.len(),
            ..ImportResult::default()
        };
        tracing::info!(read = result.read, matched = result.matched, "Starting SMS import");

        // A zero batch size would never make progress.
        let batch_size = self.options.batch_size.max(1);
        for (index, batch) in bodies.chunks(batch_size).enumerate() {
            result.batches += 1;
            match self.parser.parse(batch.to_vec()).await {
                Ok(response) => {
                    let parsed = response.parsed_or(batch.len());
                    result.parsed += parsed;
                    tracing::debug!(batch = index, size = batch.len(), parsed, "Batch parsed");
                }
                Err(e) => {
                    tracing::warn!(batch = index, "SMS import aborted: {e}");
                    result.parsed = 0;
                    result.aborted = Some(e.to_string());
                    return result;
                }
            }
        }

        if let Err(e) = self.store.set_bool(KEY_INITIAL_IMPORT_DONE, true).await {
            tracing::warn!("Could not record initial import: {e}");
        }
        tracing::info!(parsed = result.parsed, batches = result.batches, "SMS import complete");
        result
    }
}
