//! Conversation service
//!
//! One turn: take the recent transcript and the stored profile, ask the model
//! for a JSON reply, fold any `profile_updates` into the profile store, and
//! hand back the user-facing `response` text.

use crate::error::BuddyError;
use crate::models::{Message, Sender};
use crate::openai::{ChatRequest, ChatTurn, ModelBackend};
use crate::profile::FinancialProfile;
use crate::prompt::{profile_context, SYSTEM_PROMPT};
use crate::storage::ProfileStore;
use crate::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Transcript entries sent along with each turn
pub const HISTORY_WINDOW: usize = 10;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

pub struct ConversationService {
    model: ModelBackend,
    profiles: ProfileStore,
}

impl ConversationService {
    pub fn new(model: ModelBackend, profiles: ProfileStore) -> Self {
        Self { model, profiles }
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Reply text for `new_text`; never fails.
    ///
    /// Errors collapse into the fixed apology strings of
    /// [`BuddyError::user_message`].
    pub async fn get_response(&self, history: &[Message], new_text: &str) -> String {
        match self.respond(history, new_text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Conversation turn failed: {}", e);
                e.user_message().to_string()
            }
        }
    }

    /// Same turn as [`get_response`](Self::get_response) with the failure kept.
    pub async fn respond(&self, history: &[Message], new_text: &str) -> Result<String> {
        let model = match &self.model {
            ModelBackend::Configured(model) => model,
            ModelBackend::NotConfigured => return Err(BuddyError::NotConfigured),
        };

        let profile = self.profiles.load().await;
        let request = build_request(history, &profile, new_text);

        info!(
            history = history.len(),
            sent = request.messages.len(),
            "Requesting advisor reply"
        );

        let content = model
            .complete(&request)
            .await?
            .filter(|content| !content.is_empty())
            .ok_or(BuddyError::EmptyReply)?;

        debug!(reply = %content, "Advisor reply received");

        match parse_reply(&content) {
            Reply::Structured { response, updates } => {
                if let Some(updates) = updates {
                    self.apply_updates(updates).await;
                }
                Ok(response)
            }
            Reply::Raw => {
                warn!("Reply is not the expected JSON object, returning raw text");
                Ok(content)
            }
        }
    }

    async fn apply_updates(&self, updates: Value) {
        if updates.is_null() {
            return;
        }

        match FinancialProfile::from_json(updates) {
            Ok(updates) if updates.is_empty() => {}
            Ok(updates) => {
                info!("Updating profile from conversation");
                self.profiles.update(updates).await;
            }
            Err(e) => warn!("Ignoring invalid profile updates: {}", e),
        }
    }
}

/// Last [`HISTORY_WINDOW`] messages, oldest first.
///
/// The sort is stable so messages sharing a timestamp keep transcript order.
pub fn recent_messages(history: &[Message]) -> Vec<&Message> {
    let mut sorted: Vec<&Message> = history.iter().collect();
    sorted.sort_by_key(|msg| msg.timestamp);
    let skip = sorted.len().saturating_sub(HISTORY_WINDOW);
    sorted.split_off(skip)
}

pub fn build_request(
    history: &[Message],
    profile: &FinancialProfile,
    new_text: &str,
) -> ChatRequest {
    let mut messages = vec![
        ChatTurn::system(SYSTEM_PROMPT),
        ChatTurn::system(profile_context(profile)),
    ];

    messages.extend(recent_messages(history).into_iter().map(|msg| match msg.sender {
        Sender::User => ChatTurn::user(msg.text.clone()),
        Sender::Bot => ChatTurn::assistant(msg.text.clone()),
    }));

    messages.push(ChatTurn::user(new_text));

    ChatRequest {
        messages,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        json_object: true,
    }
}

#[derive(Debug, PartialEq)]
enum Reply {
    Structured {
        response: String,
        updates: Option<Value>,
    },
    /// Not a JSON object with a string `response`
    Raw,
}

fn parse_reply(content: &str) -> Reply {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(content) else {
        return Reply::Raw;
    };

    match object.remove("response") {
        Some(Value::String(response)) => Reply::Structured {
            response,
            updates: object.remove("profile_updates"),
        },
        _ => Reply::Raw,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::openai::{ChatModel, ChatRequest};
    use crate::Result;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned completions and records every request.
    #[derive(Default)]
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Result<Option<String>>>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        pub fn replying(replies: Vec<Result<Option<String>>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn text(reply: &str) -> Self {
            Self::replying(vec![Ok(Some(reply.to_string()))])
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, request: &ChatRequest) -> Result<Option<String>> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;
    use crate::error::{EMPTY_REPLY_MESSAGE, GENERIC_FAILURE_MESSAGE, UNAVAILABLE_MESSAGE};
    use crate::openai::Role;
    use crate::profile::{EmploymentStatus, RiskTolerance};
    use crate::storage::{InMemoryKeyValueStore, KeyValueStore, PROFILE_KEY};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn service(model: Arc<ScriptedModel>) -> (ProfileStore, ConversationService) {
        let profiles = ProfileStore::new(Arc::new(InMemoryKeyValueStore::new()));
        let service = ConversationService::new(ModelBackend::Configured(model), profiles.clone());
        (profiles, service)
    }

    fn message_at(sender: Sender, text: &str, offset_secs: i64) -> Message {
        let base = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        Message {
            timestamp: base + Duration::seconds(offset_secs),
            ..Message::new(sender, text)
        }
    }

    #[tokio::test]
    async fn test_unconfigured_returns_unavailable_and_touches_nothing() {
        let slots = Arc::new(InMemoryKeyValueStore::new());
        let service =
            ConversationService::new(ModelBackend::NotConfigured, ProfileStore::new(slots.clone()));

        let reply = service.get_response(&[], "I make $5000 a month").await;

        assert_eq!(reply, UNAVAILABLE_MESSAGE);
        assert_eq!(slots.get(PROFILE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_structured_reply_updates_profile() {
        let model = Arc::new(ScriptedModel::text(
            r#"{"response":"Nice work!","profile_updates":{"income":5000}}"#,
        ));
        let (profiles, service) = service(model);
        profiles
            .save(&FinancialProfile {
                age: Some(29),
                ..Default::default()
            })
            .await;

        let reply = service.get_response(&[], "I make $5000 a month").await;

        assert_eq!(reply, "Nice work!");
        let profile = profiles.load().await;
        assert_eq!(profile.income, Some(5000.0));
        assert_eq!(profile.age, Some(29));
    }

    #[tokio::test]
    async fn test_plain_text_reply_is_returned_verbatim() {
        let model = Arc::new(ScriptedModel::text("hello"));
        let (profiles, service) = service(model);

        assert_eq!(service.get_response(&[], "hi").await, "hello");
        assert!(profiles.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_json_without_response_string_is_raw() {
        let raw = r#"{"answer":"nope","profile_updates":{"age":40}}"#;
        let model = Arc::new(ScriptedModel::text(raw));
        let (profiles, service) = service(model);

        assert_eq!(service.get_response(&[], "hi").await, raw);
        assert!(profiles.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_updates_are_skipped_but_response_kept() {
        let model = Arc::new(ScriptedModel::text(
            r#"{"response":"Got it","profile_updates":{"employmentStatus":"freelance","age":31}}"#,
        ));
        let (profiles, service) = service(model);

        assert_eq!(service.get_response(&[], "I freelance").await, "Got it");
        assert!(profiles.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_null_fields_and_unknown_keys() {
        let model = Arc::new(ScriptedModel::text(
            r#"{"response":"ok","profile_updates":{"riskTolerance":"moderate","location":null,"favoriteColor":"green"}}"#,
        ));
        let (profiles, service) = service(model);
        profiles
            .save(&FinancialProfile {
                location: Some("Denver".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(service.get_response(&[], "hi").await, "ok");

        let profile = profiles.load().await;
        assert_eq!(profile.risk_tolerance, Some(RiskTolerance::Moderate));
        assert_eq!(profile.location.as_deref(), Some("Denver"));
    }

    #[tokio::test]
    async fn test_empty_content_is_empty_reply() {
        let model = Arc::new(ScriptedModel::replying(vec![
            Ok(None),
            Ok(Some(String::new())),
        ]));
        let (_, service) = service(model);

        assert_eq!(service.get_response(&[], "hi").await, EMPTY_REPLY_MESSAGE);
        assert!(matches!(
            service.respond(&[], "hi").await,
            Err(BuddyError::EmptyReply)
        ));
    }

    #[tokio::test]
    async fn test_model_failure_is_generic_error() {
        let model = Arc::new(ScriptedModel::replying(vec![Err(BuddyError::LlmError(
            "timeout".to_string(),
        ))]));
        let (profiles, service) = service(model);

        assert_eq!(service.get_response(&[], "hi").await, GENERIC_FAILURE_MESSAGE);
        assert!(profiles.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_request_carries_window_profile_and_new_text() {
        let model = Arc::new(ScriptedModel::text(r#"{"response":"ok"}"#));
        let (profiles, service) = service(model.clone());
        profiles
            .save(&FinancialProfile {
                employment_status: Some(EmploymentStatus::Student),
                ..Default::default()
            })
            .await;

        // 15 messages, stored out of order
        let mut history: Vec<Message> = (0..15)
            .map(|i| {
                let sender = if i % 2 == 0 { Sender::User } else { Sender::Bot };
                message_at(sender, &format!("m{}", i), i)
            })
            .collect();
        history.reverse();
        history.rotate_left(4);

        service.get_response(&history, "what next?").await;

        let requests = model.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.messages.len(), 2 + HISTORY_WINDOW + 1);
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, 1000);
        assert!(request.json_object);

        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, Role::System);
        assert!(request.messages[1]
            .content
            .starts_with("Current user profile: {\n"));
        assert!(request.messages[1].content.contains("\"student\""));

        let window: Vec<&str> = request.messages[2..12]
            .iter()
            .map(|turn| turn.content.as_str())
            .collect();
        let expected: Vec<String> = (5..15).map(|i| format!("m{}", i)).collect();
        assert_eq!(window, expected);
        assert_eq!(request.messages[2].role, Role::Assistant);
        assert_eq!(request.messages[3].role, Role::User);

        let last = request.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "what next?");
    }

    #[test]
    fn test_recent_messages_keeps_transcript_order_on_ties() {
        let history = vec![
            message_at(Sender::User, "first", 0),
            message_at(Sender::Bot, "second", 0),
            message_at(Sender::User, "earlier", -5),
        ];

        let texts: Vec<&str> = recent_messages(&history)
            .iter()
            .map(|msg| msg.text.as_str())
            .collect();
        assert_eq!(texts, vec!["earlier", "first", "second"]);
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(
            parse_reply(r#"{"response":"hi"}"#),
            Reply::Structured {
                response: "hi".to_string(),
                updates: None
            }
        );
        assert_eq!(parse_reply(r#"["response"]"#), Reply::Raw);
        assert_eq!(parse_reply(r#"{"response":42}"#), Reply::Raw);
        assert_eq!(parse_reply("not json"), Reply::Raw);
    }
}
