use serde::{Deserialize, Serialize};

pub const KEY_CONSENT_GIVEN: &str = "smsConsentGiven";
pub const KEY_CONSENT_FLOW_COMPLETED: &str = "smsConsentFlowCompleted";
pub const KEY_INITIAL_IMPORT_DONE: &str = "smsInitialImportDone";

/// The user's answer to the one-time SMS consent screen.
///
/// `flow_completed` records that the screen was shown and answered, whatever
/// the answer was. Absent keys read as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub given: bool,
    pub flow_completed: bool,
}

impl ConsentRecord {
    pub fn declined() -> Self {
        Self { given: false, flow_completed: true }
    }

    pub fn needs_prompt(&self) -> bool {
        !self.flow_completed
    }
}
