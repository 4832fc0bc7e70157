pub mod http;
pub mod parser;
pub mod types;

pub use http::{ApiConfig, HttpParser};
pub use parser::{ClientError, RemoteParser};
pub use types::{ParseRequest, ParseResponse, ParsedTransaction, TransactionType};
