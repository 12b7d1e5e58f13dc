use async_trait::async_trait;
use thiserror::Error;

pub mod parser_server;

pub use parser_server::HttpParserNotifier;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid parser server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Parser server returned non-success status: {status}. Body: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Tells the packet parser that the current structure changed.
#[async_trait]
pub trait StructureUpdateNotifier: Send + Sync {
    /// Returns the JSON body the parser server answered with.
    async fn notify_structure_updated(&self) -> Result<serde_json::Value, NotifyError>;
}
