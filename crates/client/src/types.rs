use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/transactions/parse-sms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseRequest {
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
            TransactionType::Transfer => write!(f, "transfer"),
        }
    }
}

/// A transaction the backend created from one SMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub id: i64,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub category: Option<String>,
    /// Amount in RWF.
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    pub transaction_date: NaiveDateTime,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "full_confidence")]
    pub confidence_score: f32,
}

fn full_confidence() -> f32 {
    1.0
}

/// Parser reply for one batch. Every field may be missing; callers decide the
/// fallback for an absent `parsed_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub parsed_count: Option<usize>,
    #[serde(default)]
    pub failed_count: Option<usize>,
    #[serde(default)]
    pub transactions: Vec<ParsedTransaction>,
}

impl ParseResponse {
    pub fn with_count(parsed_count: usize) -> Self {
        Self {
            parsed_count: Some(parsed_count),
            ..Self::default()
        }
    }

    /// Reported count, or `fallback` when the backend left it out.
    pub fn parsed_or(&self, fallback: usize) -> usize {
        self.parsed_count.unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_response() {
        let json = r#"{
            "parsed_count": 1,
            "failed_count": 0,
            "transactions": [{
                "id": 7,
                "transaction_type": "income",
                "category": "other_income",
                "need_want": "uncategorized",
                "amount": 20000.0,
                "description": "Mobile Money received",
                "counterparty": "0788123726",
                "counterparty_name": null,
                "reference": "ABC123",
                "transaction_date": "2025-03-01T08:15:00",
                "is_recurring": false,
                "is_verified": false,
                "confidence_score": 0.8,
                "created_at": "2025-03-01T08:16:00"
            }]
        }"#;
        let resp: ParseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.parsed_count, Some(1));
        let tx = &resp.transactions[0];
        assert_eq!(tx.transaction_type, TransactionType::Income);
        assert_eq!(tx.amount, Decimal::from(20000));
        assert_eq!(tx.reference.as_deref(), Some("ABC123"));
    }

    #[test]
    fn missing_count_uses_fallback() {
        let resp: ParseResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.parsed_count, None);
        assert_eq!(resp.parsed_or(50), 50);
        assert_eq!(ParseResponse::with_count(3).parsed_or(50), 3);
    }

    #[test]
    fn request_shape() {
        let body = serde_json::to_value(ParseRequest { messages: vec!["a".into()] }).unwrap();
        assert_eq!(body, serde_json::json!({ "messages": ["a"] }));
    }
}
