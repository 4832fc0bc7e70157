use serde::{Deserialize, Serialize};

use crate::message::RawMessage;

/// Substrings of sender addresses used by mobile-money operators.
pub const DEFAULT_SENDER_TOKENS: &[&str] = &[
    "m-money",
    "momo",
    "mtn",
    "mobilemoney",
    "airtel",
    "162",
    "164",
    "165",
    "182",
];

/// Substrings of message bodies that indicate a money movement.
pub const DEFAULT_BODY_KEYWORDS: &[&str] = &[
    "rwf",
    "balance",
    "transferred",
    "payment",
    "received",
    "txid",
    "transaction",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    pub sender_tokens: Vec<String>,
    pub body_keywords: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            sender_tokens: DEFAULT_SENDER_TOKENS.iter().map(|s| s.to_string()).collect(),
            body_keywords: DEFAULT_BODY_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Classifies messages as financial by sender or, failing that, by body.
///
/// The check is a disjunction: a known sender is enough, and a keyword in the
/// body is enough. A false positive costs one rejected line at the backend; a
/// false negative loses a transaction.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    sender_tokens: Vec<String>,
    body_keywords: Vec<String>,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self::new(FilterRules::default())
    }
}

impl MessageFilter {
    pub fn new(rules: FilterRules) -> Self {
        Self {
            sender_tokens: normalize(rules.sender_tokens),
            body_keywords: normalize(rules.body_keywords),
        }
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, String> {
        let rules: FilterRules =
            toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))?;
        Ok(Self::new(rules))
    }

    pub fn sender_matches(&self, sender: Option<&str>) -> bool {
        let sender = sender.unwrap_or_default().to_lowercase();
        !sender.is_empty() && self.sender_tokens.iter().any(|t| sender.contains(t.as_str()))
    }

    pub fn body_matches(&self, body: Option<&str>) -> bool {
        let body = body.unwrap_or_default().to_lowercase();
        !body.is_empty() && self.body_keywords.iter().any(|k| body.contains(k.as_str()))
    }

    pub fn is_financial(&self, sender: Option<&str>, body: Option<&str>) -> bool {
        self.sender_matches(sender) || self.body_matches(body)
    }

    pub fn matches(&self, message: &RawMessage) -> bool {
        self.is_financial(message.address.as_deref(), message.body.as_deref())
    }
}

// Lower-case once up front; blank tokens would match every message.
fn normalize(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
