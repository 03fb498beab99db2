//! Chat session value types

use crate::sentiment::{Rating, ServiceLevel, NEUTRAL_SCORE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting every new session opens with
pub const GREETING: &str = "Hello! I'm your AI support agent. How can I help you today?";

/// Author of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Bot,
}

/// One message in a support session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Latest rating; re-rating overwrites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_level: Option<ServiceLevel>,
}

impl ChatMessage {
    /// Message typed by the user
    pub fn user(content: impl Into<String>, level: ServiceLevel) -> Self {
        Self::new(MessageKind::User, content, Some(level))
    }

    /// Reply from the support agent
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(MessageKind::Bot, content, None)
    }

    fn new(kind: MessageKind, content: impl Into<String>, level: Option<ServiceLevel>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            sentiment: None,
            service_level: level,
        }
    }
}

/// A support conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Mean of rated messages, computed on close
    pub overall_sentiment: f64,
    pub service_level: ServiceLevel,
    pub is_active: bool,
}

impl ChatSession {
    /// Open a session with the standard greeting
    pub fn start(level: ServiceLevel) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: vec![ChatMessage::bot(GREETING)],
            start_time: Utc::now(),
            end_time: None,
            overall_sentiment: NEUTRAL_SCORE,
            service_level: level,
            is_active: true,
        }
    }

    /// Mark closed and freeze the overall sentiment
    pub fn close(&mut self) {
        self.end_time = Some(Utc::now());
        self.is_active = false;
        self.overall_sentiment = compute_overall_sentiment(&self.messages);
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn message_mut(&mut self, id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Number of messages carrying a rating
    pub fn rated_count(&self) -> usize {
        self.messages.iter().filter(|m| m.sentiment.is_some()).count()
    }
}

/// Mean rating score over rated messages; 0.5 when nothing is rated
///
/// # Examples
///
/// ```
/// use helpdesk::sentiment::{Rating, ServiceLevel};
/// use helpdesk::session::{compute_overall_sentiment, ChatMessage};
///
/// let mut up = ChatMessage::bot("a");
/// up.sentiment = Some(Rating::Up);
/// let mut down = ChatMessage::bot("b");
/// down.sentiment = Some(Rating::Down);
/// let unrated = ChatMessage::user("c", ServiceLevel::Basic);
///
/// assert_eq!(compute_overall_sentiment(&[up, down, unrated]), 0.5);
/// ```
pub fn compute_overall_sentiment(messages: &[ChatMessage]) -> f64 {
    let scores: Vec<f64> = messages
        .iter()
        .filter_map(|m| m.sentiment.map(|r| r.score()))
        .collect();
    if scores.is_empty() {
        return NEUTRAL_SCORE;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}
