use async_trait::async_trait;
use thiserror::Error;

use crate::types::ParseResponse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Parser returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// The backend service that turns raw SMS bodies into transactions.
///
/// The backend deduplicates by transaction reference, so resubmitting a
/// message is harmless.
#[async_trait]
pub trait RemoteParser: Send + Sync {
    async fn parse(&self, messages: Vec<String>) -> Result<ParseResponse, ClientError>;
}
