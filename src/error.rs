//! Error types for the chatbot

use thiserror::Error;

/// Result type alias for chatbot operations
pub type Result<T> = std::result::Result<T, ChatbotError>;

#[derive(Error, Debug)]
pub enum ChatbotError {

    // =============================
    // Startup Errors
    // =============================

    #[error("Missing {0} in environment")]
    ConfigMissing(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // =============================
    // Turn Errors
    // =============================

    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Never leaves the page fetcher; a failed page is just absent.
    #[error("Fetch failed for {url}: {reason}")]
    FetchItemFailed { url: String, reason: String },

    #[error("Answer stream truncated: {0}")]
    StreamTruncated(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
