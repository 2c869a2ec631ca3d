//! Error types for the finance buddy services

use thiserror::Error;

/// Result type alias for finance buddy operations
pub type Result<T> = std::result::Result<T, BuddyError>;

/// Shown when no chat completions credential is configured.
pub const UNAVAILABLE_MESSAGE: &str =
    "I apologize, but the service is currently unavailable. Please try again later.";

/// Shown when the model answered without any content.
pub const EMPTY_REPLY_MESSAGE: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

/// Shown for every other failure during a conversation turn.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "I apologize, but I encountered an error. Please try again later.";

#[derive(Error, Debug)]
pub enum BuddyError {

    // =============================
    // Conversation Errors
    // =============================

    #[error("Chat completions API key not configured")]
    NotConfigured,

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Empty reply from language model")]
    EmptyReply,

    // =============================
    // Profile & Task Errors
    // =============================

    #[error("Invalid value for {field}: {reason}")]
    InvalidProfileValue { field: &'static str, reason: String },

    #[error("Unknown profile field: {0}")]
    UnknownProfileField(String),

    #[error("Invalid profile document: {0}")]
    InvalidProfile(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Profile changed since it was read (current version {0})")]
    PreconditionFailed(String),

    // =============================
    // Infrastructure Errors
    // =============================

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

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

impl BuddyError {
    /// Fixed apology text a chat participant sees for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            BuddyError::NotConfigured => UNAVAILABLE_MESSAGE,
            BuddyError::EmptyReply => EMPTY_REPLY_MESSAGE,
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}
