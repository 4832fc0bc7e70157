pub mod consent;
pub mod file_source;
pub mod import;
pub mod listener;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

pub use consent::{ConsentError, ConsentEvent, ConsentFlow, ConsentState};
pub use file_source::FileMessageSource;
pub use import::{HistoricalImporter, ImportOptions, DEFAULT_BATCH_SIZE};
pub use listener::{FailureReporter, ListenerFailure, LiveListener, LiveOutcome};
pub use source::{MessageHandler, MessageSource, SourceError};
