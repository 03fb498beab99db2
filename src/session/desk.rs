//! Support desk: the conversation flow on top of a session store

use super::store::SessionStore;
use super::types::{ChatMessage, ChatSession, MessageKind};
use crate::chat::{build_prompt, reply_with_fallback, ChatBackend, ChatContext, ChatTurn};
use crate::error::Result;
use crate::sentiment::analysis::analyze_message_sentiment;
use crate::sentiment::{AggregateSentiment, Rating, SentimentData, ServiceLevel};
use serde::Serialize;
use std::sync::Arc;

/// A user message and the reply it produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub user_message: ChatMessage,
    pub bot_message: ChatMessage,
    /// Keyword score of the user text
    pub user_sentiment: f64,
    /// Score reported by the chat backend, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_sentiment: Option<f64>,
}

/// Drives support conversations
///
/// Sending a message records it with its keyword sentiment, asks the chat
/// backend for a reply with the session's service level and recent history,
/// and records the reply. Backend failures become the fallback apology.
#[derive(Clone)]
pub struct SupportDesk {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn ChatBackend>,
    history_messages: usize,
}

impl SupportDesk {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn ChatBackend>,
        history_messages: usize,
    ) -> Self {
        Self {
            store,
            backend,
            history_messages,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn active_session(&self) -> Result<ChatSession> {
        self.store.active_session()
    }

    /// Send a user message and collect the bot reply
    pub async fn send_message(&self, content: &str) -> Result<Exchange> {
        let session = self.store.active_session()?;
        let level = session.service_level;

        let context = ChatContext {
            service_level: Some(level),
            previous_messages: session
                .messages
                .iter()
                .map(|m| match m.kind {
                    MessageKind::User => ChatTurn::user(m.content.clone()),
                    MessageKind::Bot => ChatTurn::assistant(m.content.clone()),
                })
                .collect(),
        };

        let user_message = self.store.add_message(ChatMessage::user(content, level))?;
        let user_sentiment = analyze_message_sentiment(content);
        self.store
            .record_sentiment(SentimentData::new(user_sentiment, level).with_chat_id(&session.id))?;

        let prompt = build_prompt(content, &context, self.history_messages);
        let reply = reply_with_fallback(self.backend.as_ref(), &prompt, &session.id).await;

        let bot_message = self.store.add_message(ChatMessage::bot(reply.reply))?;
        if let Some(score) = reply.sentiment {
            self.store
                .record_sentiment(SentimentData::new(score, level).with_chat_id(&session.id))?;
        }

        tracing::debug!(
            session_id = %session.id,
            user_sentiment,
            bot_sentiment = ?reply.sentiment,
            "Support exchange recorded"
        );

        Ok(Exchange {
            user_message,
            bot_message,
            user_sentiment,
            bot_sentiment: reply.sentiment,
        })
    }

    pub fn rate_message(&self, message_id: &str, rating: Rating) -> Result<ChatMessage> {
        self.store.rate_message(message_id, rating)
    }

    pub fn set_service_level(&self, level: ServiceLevel) -> Result<ChatSession> {
        tracing::info!(%level, "Service level changed");
        self.store.set_service_level(level)
    }

    pub fn close_session(&self) -> Result<(ChatSession, ChatSession)> {
        self.store.close_active()
    }

    pub fn history(&self, limit: usize) -> Result<Vec<ChatSession>> {
        self.store.history(limit)
    }

    pub fn aggregate(&self, window_minutes: u32) -> Result<AggregateSentiment> {
        self.store.aggregate(window_minutes)
    }
}
