//! Chat transcript flow

use crate::conversation::ConversationService;
use crate::models::Message;
use crate::storage::MessageStore;
use std::sync::Arc;
use tracing::{info, warn};

pub const WELCOME_MESSAGE: &str = "Hello! I'm your financial buddy. I can help with investments, debt management, budgeting, organization and much more. How can I help you today?";

pub struct ChatSession {
    service: Arc<ConversationService>,
    store: MessageStore,
    messages: Vec<Message>,
}

impl ChatSession {
    /// Load the stored transcript, greeting the user when it is empty.
    pub async fn open(service: Arc<ConversationService>, store: MessageStore) -> Self {
        let mut messages = store.load().await;
        if messages.is_empty() {
            messages.push(Message::bot(WELCOME_MESSAGE));
            store.save(&messages).await;
        }

        info!(messages = messages.len(), "Chat session opened");

        Self {
            service,
            store,
            messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Run one turn. Blank input is ignored and returns `None`.
    pub async fn send(&mut self, text: &str) -> Option<Message> {
        if text.trim().is_empty() {
            return None;
        }

        let prior = self.messages.len();
        self.messages.push(Message::user(text));
        self.store.save(&self.messages).await;

        let reply = match self.service.respond(&self.messages[..prior], text).await {
            Ok(reply) => Message::bot(reply),
            Err(e) => {
                warn!("Chat turn failed: {}", e);
                Message::bot_error(e.user_message())
            }
        };

        self.messages.push(reply.clone());
        self.store.save(&self.messages).await;

        Some(reply)
    }
}
