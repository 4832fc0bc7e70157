use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::parser::{ClientError, RemoteParser};
use crate::types::{ParseRequest, ParseResponse};

pub const PARSE_SMS_PATH: &str = "/api/v1/transactions/parse-sms";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token for the signed-in user.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// [`RemoteParser`] over the FinGuide REST API.
#[derive(Debug, Clone)]
pub struct HttpParser {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpParser {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base = config.base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{base}{PARSE_SMS_PATH}"),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteParser for HttpParser {
    async fn parse(&self, messages: Vec<String>) -> Result<ParseResponse, ClientError> {
        let count = messages.len();
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&ParseRequest { messages });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status: status.as_u16(), body });
        }

        let parsed: ParseResponse = response.json().await?;
        tracing::debug!(
            sent = count,
            parsed = ?parsed.parsed_count,
            failed = ?parsed.failed_count,
            "Parse request completed"
        );
        Ok(parsed)
    }
}
