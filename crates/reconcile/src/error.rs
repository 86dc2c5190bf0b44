use thiserror::Error;

/// Failures reaching or reading the network controller.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("controller unavailable: {0}")]
    Unavailable(String),
    #[error("lookup failed: {0}")]
    Lookup(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("notifier {sink} failed: {message}")]
pub struct NotifyError {
    pub sink: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("snapshot provider unavailable: {0}")]
    ProviderUnavailable(#[source] ProviderError),
    #[error("db error: {0}")]
    Db(#[from] stalker_db::DbError),
    #[error("tracked device {0} not found")]
    DeviceNotFound(i64),
}

impl EngineError {
    /// The cached provider session should be dropped so the next cycle
    /// reconnects from scratch.
    pub fn should_reconnect(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
