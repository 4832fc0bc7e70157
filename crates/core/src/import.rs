use serde::{Deserialize, Serialize};

/// Counters from one historical import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// Messages returned by the inbox read.
    pub read: usize,
    /// Messages that passed the financial filter and had a body.
    pub matched: usize,
    /// Transactions the remote parser reported as parsed. Zero when aborted.
    pub parsed: usize,
    /// Parse requests issued, including the one that failed.
    pub batches: usize,
    /// Error text of the parse request that aborted the run.
    pub aborted: Option<String>,
}

impl ImportResult {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}
