use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single SMS as handed over by the device's message provider.
///
/// Carriers regularly strip the sender, and some providers return rows with
/// no body, so both fields are optional. The JSON shape matches a typical SMS
/// backup export (`address`, `body`, `date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub date: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(address: impl Into<String>, body: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            address: Some(address.into()),
            body: Some(body.into()),
            date,
        }
    }

    /// Sender address, or `""` when the provider did not supply one.
    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or_default()
    }

    /// Body text, or `""` when the provider did not supply one.
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn has_body(&self) -> bool {
        !self.body().trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

pub fn sort_messages(messages: &mut [RawMessage], order: SortOrder) {
    match order {
        SortOrder::NewestFirst => messages.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::OldestFirst => messages.sort_by(|a, b| a.date.cmp(&b.date)),
    }
}
