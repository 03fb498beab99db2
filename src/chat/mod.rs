//! Chat-completion backends
//!
//! The support desk talks to a remote chat API that accepts a single
//! prompt string and a session id. [`ChatClient`] is the live
//! implementation; [`CannedBackend`] answers offline from fixed reply tables.

pub mod suggestions;

use crate::config::ChatConfig;
use crate::error::{HelpdeskError, Result};
use crate::sentiment::analysis::{analyze_message_sentiment, canned_reply, SentimentClass};
use crate::sentiment::ServiceLevel;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub use suggestions::{generate_agent_config, regenerate_field, AgentSuggestions, SuggestionField};

/// Reply sent when the chat backend cannot be reached
pub const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble connecting to the support service right now. Please try again in a moment, or submit a support ticket if the issue persists.";

/// Sentiment reported alongside [`FALLBACK_REPLY`]
pub const FALLBACK_SENTIMENT: f64 = 0.3;

/// Response fields checked for the reply text, in order
const REPLY_FIELDS: [&str; 4] = ["reply", "response", "message", "content"];

/// A reply from a chat backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub timestamp: DateTime<Utc>,
    /// Score in [0, 1] when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>, sentiment: Option<f64>) -> Self {
        Self {
            reply: reply.into(),
            timestamp: Utc::now(),
            sentiment,
        }
    }

    /// The apology reply used when the backend fails
    pub fn fallback() -> Self {
        Self::new(FALLBACK_REPLY, Some(FALLBACK_SENTIMENT))
    }
}

/// Something that turns a prompt into a reply
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a fully built prompt for a conversation
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot produce a reply
    async fn send(&self, prompt: &str, session_id: &str) -> Result<ChatReply>;
}

/// Speaker of a previous conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One previous turn included for context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Context used to build a prompt
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub service_level: Option<ServiceLevel>,
    pub previous_messages: Vec<ChatTurn>,
}

/// Build the prompt sent for `message`
///
/// A service-level preamble comes first when a level is set, and it stays in
/// place when history follows so every turn carries the tier. When there are
/// previous turns, the last `history_limit` of them are listed before the new
/// message.
///
/// # Examples
///
/// ```
/// use helpdesk::chat::{build_prompt, ChatContext, ChatTurn};
/// use helpdesk::sentiment::ServiceLevel;
///
/// let context = ChatContext {
///     service_level: Some(ServiceLevel::Basic),
///     previous_messages: vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")],
/// };
/// let prompt = build_prompt("where is my invoice?", &context, 5);
/// assert!(prompt.starts_with("[Service Level: BASIC - "));
/// assert!(prompt.contains("Previous conversation:\nUser: hi\nAssistant: hello"));
/// assert!(prompt.ends_with("\n\nUser: where is my invoice?"));
/// ```
pub fn build_prompt(message: &str, context: &ChatContext, history_limit: usize) -> String {
    let mut prompt = String::new();

    if let Some(level) = context.service_level {
        prompt.push_str(&format!(
            "[Service Level: {} - {}]\n\n",
            level.to_string().to_uppercase(),
            level.prompt_hint()
        ));
    }

    let history = &context.previous_messages;
    if history.is_empty() || history_limit == 0 {
        prompt.push_str(message);
        return prompt;
    }

    let start = history.len().saturating_sub(history_limit);
    let lines: Vec<String> = history[start..]
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, turn.content)
        })
        .collect();

    prompt.push_str("Previous conversation:\n");
    prompt.push_str(&lines.join("\n"));
    prompt.push_str("\n\nUser: ");
    prompt.push_str(message);
    prompt
}

/// Send through `backend`, turning any failure into [`ChatReply::fallback`]
///
/// # Examples
///
/// ```
/// use helpdesk::chat::{reply_with_fallback, CannedBackend};
///
/// # tokio_test::block_on(async {
/// let reply = reply_with_fallback(&CannedBackend::new(), "User: thanks, great help", "s").await;
/// assert!(!reply.reply.is_empty());
/// # });
/// ```
pub async fn reply_with_fallback(
    backend: &dyn ChatBackend,
    prompt: &str,
    session_id: &str,
) -> ChatReply {
    match backend.send(prompt, session_id).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(session_id, "Chat backend failed, using fallback reply: {:#}", e);
            ChatReply::fallback()
        }
    }
}

/// Client for the remote chat-completion API
///
/// # Examples
///
/// ```no_run
/// use helpdesk::chat::{ChatBackend, ChatClient};
/// use helpdesk::config::ChatConfig;
///
/// # async fn example() -> helpdesk::error::Result<()> {
/// let config = ChatConfig {
///     api_key: Some("key".to_string()),
///     ..ChatConfig::default()
/// };
/// let client = ChatClient::new(&config)?;
/// let reply = client.send("How do I reset my password?", "user@example.com").await?;
/// println!("{}", reply.reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl ChatClient {
    /// Create a client from configuration
    ///
    /// A missing API key is not an error here; it is reported on first use.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("helpdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HelpdeskError::Chat(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    /// Whether an API key is configured
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, prompt: &str, session_id: &str) -> Result<ChatReply> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            HelpdeskError::MissingCredentials("chat API key is not configured".to_string())
        })?;

        tracing::debug!(session_id, chars = prompt.len(), "Sending chat request");

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", api_key)
            .json(&serde_json::json!({
                "message": prompt,
                "session_id": session_id,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Chat request failed: {}", e);
                HelpdeskError::transport("Chat request failed", e, HelpdeskError::Chat)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let detail = error_detail(&body).unwrap_or_else(|| status.to_string());
            tracing::error!("Chat API returned error {}: {}", status, detail);
            return Err(HelpdeskError::Chat(format!("Chat API error: {}", detail)).into());
        }

        let body: Value = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse chat response: {}", e);
            HelpdeskError::Chat(format!("Failed to parse chat response: {}", e))
        })?;

        parse_reply(&body)
    }
}

/// Extract reply text and sentiment from a chat API response body
///
/// # Errors
///
/// Returns [`HelpdeskError::Chat`] when none of the reply fields is present
pub fn parse_reply(body: &Value) -> Result<ChatReply> {
    let content = REPLY_FIELDS
        .iter()
        .filter_map(|field| body.get(*field))
        .find(|v| is_present(v))
        .ok_or_else(|| {
            tracing::error!("Unexpected chat response format: {}", body);
            HelpdeskError::Chat("No response from AI".to_string())
        })?;

    let reply = match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let sentiment = body.get("sentiment").and_then(Value::as_f64);

    Ok(ChatReply::new(reply, sentiment))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn error_detail(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| body.get("error").and_then(Value::as_str))
        .map(str::to_string)
}

/// Offline backend answering from fixed reply tables
///
/// The reply tone follows the keyword sentiment of the final user message in
/// the prompt.
#[derive(Debug, Default, Clone)]
pub struct CannedBackend;

impl CannedBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatBackend for CannedBackend {
    async fn send(&self, prompt: &str, _session_id: &str) -> Result<ChatReply> {
        let class = SentimentClass::from_score(analyze_message_sentiment(last_user_text(prompt)));
        let reply = canned_reply(&mut rand::rng(), class);
        Ok(ChatReply::new(reply, None))
    }
}

/// Text of the last block of a prompt without its `User: ` prefix
fn last_user_text(prompt: &str) -> &str {
    let block = prompt.rsplit("\n\n").next().unwrap_or(prompt);
    block.strip_prefix("User: ").unwrap_or(block)
}
