//! Core data models for chat transcripts and the task checklist

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    Savings,
    Debt,
    Budgeting,
    Organization,
    Investment,
}

//
// ================= Message =================
//

/// One entry of the chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    /// Stored as RFC 3339 text with millisecond precision
    #[serde(with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    /// A bot message flagged as a failed turn.
    pub fn bot_error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Sender::Bot, text)
        }
    }
}

//
// ================= Task =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub category: TaskCategory,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: TaskCategory,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            completed: false,
            category,
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sender::User => "You",
            Sender::Bot => "Buddy",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskCategory::Savings => "Savings",
            TaskCategory::Debt => "Debt",
            TaskCategory::Budgeting => "Budgeting",
            TaskCategory::Organization => "Organization",
            TaskCategory::Investment => "Investment",
        };
        write!(f, "{}", s)
    }
}

/// Fixed textual interchange form for message timestamps.
mod iso_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_wire_format() {
        let mut msg = Message::user("How do I start an emergency fund?");
        msg.id = "42".to_string();
        msg.timestamp = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "user");
        assert_eq!(json["timestamp"], "2026-10-16T09:30:00.000Z");
        assert!(json.get("isError").is_none());
    }

    #[test]
    fn test_error_flag_serialized_only_when_set() {
        let msg = Message::bot_error("Sorry");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["sender"], "bot");
    }

    #[test]
    fn test_message_accepts_offset_timestamps() {
        let raw = r#"{"id":"1","text":"hi","sender":"bot","timestamp":"2026-10-16T11:30:00+02:00"}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.timestamp, Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap());
        assert!(!msg.is_error);
    }

    #[test]
    fn test_task_category_literals() {
        let task = Task::new("9", "Open a Roth IRA", "Start small", TaskCategory::Investment);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["category"], "Investment");
        assert_eq!(json["completed"], false);
    }
}
