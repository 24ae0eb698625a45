//! Error types for Dripcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DripcastError>;

#[derive(Error, Debug)]
pub enum DripcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DripcastError {
    /// Returns the appropriate exit code for this error
    ///
    /// Schedulers branch on these: 2 means "retry at the next slot",
    /// 4 means "the remote post landed but history did not".
    pub fn exit_code(&self) -> i32 {
        match self {
            DripcastError::InvalidInput(_) => 3,
            DripcastError::Publish(PublishError::RateLimited(_)) => 2,
            DripcastError::Ledger(LedgerError::CommitFailed { .. }) => 4,
            DripcastError::Publish(_) => 1,
            DripcastError::Config(_) => 1,
            DripcastError::Ledger(_) => 1,
        }
    }

    /// Short machine-readable classification of the terminal failure state
    pub fn status(&self) -> &'static str {
        match self {
            DripcastError::Publish(PublishError::RateLimited(_)) => "rate-limited",
            DripcastError::Ledger(LedgerError::CommitFailed { .. }) => "commit-failed",
            _ => "failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Queue file not found: {0}")]
    QueueMissing(String),

    #[error("Queue file has no content: {0}")]
    QueueEmpty(String),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Published as {external_id} but failed to record it: {source}")]
    CommitFailed {
        external_id: String,
        source: std::io::Error,
    },
}

/// Classified publish outcomes from a [`Publisher`](crate::publisher::Publisher)
///
/// The runner reconciles each class differently: duplicates are compensated
/// with a sentinel ledger entry, rate limits and transient failures leave
/// the ledger untouched so the same candidate is retried next invocation.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("Remote rejected content as duplicate: {0}")]
    DuplicateRejected(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Publish failed: {0}")]
    Transient(String),
}
