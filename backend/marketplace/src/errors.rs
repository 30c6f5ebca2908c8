//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Please connect your wallet first")]
    WalletNotConnected,

    #[error("Unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("No transaction method available")]
    NoTransactionMethod,

    /// Both the primary and the fallback submission attempt failed.
    /// Carries the text of the last underlying error.
    #[error("Transaction failed: {0}")]
    SubmissionFailed(String),

    #[error("Transaction was submitted but no transaction hash was returned")]
    MissingHash,

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Confirmation error: {0}")]
    Confirmation(String),

    #[error("View call failed: {0}")]
    View(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, MarketError>;
