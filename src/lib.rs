//! Finance Buddy
//!
//! A personal finance chat assistant:
//! - Conversational advice from an OpenAI-compatible chat model
//! - A financial profile that the model keeps current from the conversation
//! - A persisted chat transcript and a small checklist of money tasks
//!
//! TURN FLOW:
//! TRANSCRIPT + PROFILE → MODEL → JSON REPLY → PROFILE UPDATE → RESPONSE

pub mod api;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod format;
pub mod models;
pub mod openai;
pub mod profile;
pub mod prompt;
pub mod storage;
pub mod tasks;

pub use error::{BuddyError, Result};

// Re-export common types
pub use chat::ChatSession;
pub use config::AppConfig;
pub use conversation::ConversationService;
pub use models::*;
pub use openai::ModelBackend;
pub use profile::{FinancialProfile, ProfileField};
pub use tasks::{TaskBoard, TaskProgress};
