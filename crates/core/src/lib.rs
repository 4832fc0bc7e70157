pub mod consent;
pub mod filter;
pub mod import;
pub mod message;
pub mod money;
pub mod simulation;

pub use consent::{ConsentRecord, KEY_CONSENT_FLOW_COMPLETED, KEY_CONSENT_GIVEN, KEY_INITIAL_IMPORT_DONE};
pub use filter::{FilterRules, MessageFilter};
pub use import::ImportResult;
pub use message::{sort_messages, RawMessage, SortOrder};
pub use money::Money;
pub use simulation::{ProjectionPoint, SimulationError, SimulationInput, SimulationResult};
