//! Agent profile suggestions generated through the chat backend

use super::ChatBackend;
use crate::error::{HelpdeskError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const DEFAULT_NAME: &str = "Support Agent";
const DEFAULT_BIO: &str = "Your helpful AI assistant";
const DEFAULT_DESCRIPTION: &str = "A professional support agent ready to help.";

const SYSTEM_PROMPT: &str = "You are an AI assistant helping to create customer support agents. Based on the user's business description, generate:
1. A concise, professional agent name (max 3 words)
2. A brief bio describing the agent's expertise (1 sentence, max 100 chars)
3. A detailed description of the agent's capabilities, personality, and communication style (2-3 paragraphs)

Format your response as JSON with keys: name, bio, description";

/// One editable field of an agent profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionField {
    Name,
    Bio,
    Description,
}

impl SuggestionField {
    /// Maximum length in characters
    pub fn limit(&self) -> usize {
        match self {
            SuggestionField::Name => 50,
            SuggestionField::Bio => 100,
            SuggestionField::Description => 1000,
        }
    }

    fn default_value(&self) -> &'static str {
        match self {
            SuggestionField::Name => DEFAULT_NAME,
            SuggestionField::Bio => DEFAULT_BIO,
            SuggestionField::Description => DEFAULT_DESCRIPTION,
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            SuggestionField::Name => "Generate a new concise, professional agent name (max 3 words)",
            SuggestionField::Bio => {
                "Generate a new brief bio describing the agent's expertise (1 sentence, max 100 chars)"
            }
            SuggestionField::Description => {
                "Generate a new detailed description of the agent's capabilities, personality, and communication style (2-3 paragraphs)"
            }
        }
    }
}

impl fmt::Display for SuggestionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionField::Name => write!(f, "name"),
            SuggestionField::Bio => write!(f, "bio"),
            SuggestionField::Description => write!(f, "description"),
        }
    }
}

impl FromStr for SuggestionField {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SuggestionField::Name),
            "bio" => Ok(SuggestionField::Bio),
            "description" => Ok(SuggestionField::Description),
            other => Err(HelpdeskError::InvalidInput(format!(
                "Unknown field: {}. Must be one of: name, bio, description",
                other
            ))),
        }
    }
}

/// Suggested agent profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentSuggestions {
    pub name: String,
    pub bio: String,
    pub description: String,
}

/// Ask the backend for a complete agent profile for a business
///
/// A JSON reply is used field by field. Anything else is read line-wise:
/// first line name, second bio, the rest description. Each field is cut to
/// its limit and missing ones get defaults.
///
/// # Errors
///
/// Propagates backend failures
pub async fn generate_agent_config(
    backend: &dyn ChatBackend,
    business: &str,
    session_id: &str,
) -> Result<AgentSuggestions> {
    let prompt = format!(
        "{}\n\nCreate a customer support agent for this business: {}",
        SYSTEM_PROMPT, business
    );
    let reply = backend.send(&prompt, session_id).await?;
    Ok(parse_suggestions(&reply.reply))
}

/// Ask the backend for a replacement value of one field
///
/// # Errors
///
/// Propagates backend failures
pub async fn regenerate_field(
    backend: &dyn ChatBackend,
    field: SuggestionField,
    business: &str,
    current: &AgentSuggestions,
    session_id: &str,
) -> Result<String> {
    let or_unset = |v: &str| {
        if v.trim().is_empty() {
            "Not set".to_string()
        } else {
            v.to_string()
        }
    };
    let prompt = format!(
        "You are an AI assistant helping to create customer support agents. {}. \nCurrent values for context:\n- Name: {}\n- Bio: {}\nRespond with only the requested {}, no additional text or formatting.\n\nBusiness: {}",
        field.instruction(),
        or_unset(&current.name),
        or_unset(&current.bio),
        field,
        business
    );

    let reply = backend.send(&prompt, session_id).await?;
    Ok(truncate_chars(reply.reply.trim(), field.limit()))
}

/// Parse a suggestion reply, JSON first and line-wise as a fallback
pub fn parse_suggestions(content: &str) -> AgentSuggestions {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => {
            let field = |f: SuggestionField| {
                let value = map
                    .get(&f.to_string())
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(f.default_value());
                truncate_chars(value, f.limit())
            };
            AgentSuggestions {
                name: field(SuggestionField::Name),
                bio: field(SuggestionField::Bio),
                description: field(SuggestionField::Description),
            }
        }
        _ => {
            tracing::warn!("Suggestion reply is not a JSON object, using line parsing");
            parse_lines(content)
        }
    }
}

fn parse_lines(content: &str) -> AgentSuggestions {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();

    let pick = |value: String, field: SuggestionField| {
        let value = truncate_chars(&value, field.limit());
        if value.is_empty() {
            field.default_value().to_string()
        } else {
            value
        }
    };

    let name = lines
        .first()
        .map(|l| strip_label(l, "name"))
        .unwrap_or_default();
    let bio = lines
        .get(1)
        .map(|l| strip_label(l, "bio"))
        .unwrap_or_default();
    let description = strip_label(&lines.iter().skip(2).copied().collect::<Vec<_>>().join("\n"), "description");

    AgentSuggestions {
        name: pick(name, SuggestionField::Name),
        bio: pick(bio, SuggestionField::Bio),
        description: pick(description, SuggestionField::Description),
    }
}

/// Remove a leading `label:` (case-insensitive, colon optional)
fn strip_label(line: &str, label: &str) -> String {
    match Regex::new(&format!(r"(?i)^{}:?\s*", regex::escape(label))) {
        Ok(re) => re.replace(line, "").to_string(),
        Err(_) => line.to_string(),
    }
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatReply, MockChatBackend};

    #[test]
    fn test_parse_json_suggestions() {
        let s = parse_suggestions(r#"{"name":"Acme Helper","bio":"Knows anvils","description":"Friendly."}"#);
        assert_eq!(s.name, "Acme Helper");
        assert_eq!(s.bio, "Knows anvils");
        assert_eq!(s.description, "Friendly.");
    }

    #[test]
    fn test_parse_json_applies_defaults_and_limits() {
        let long_name = "n".repeat(80);
        let s = parse_suggestions(&format!(r#"{{"name":"{}"}}"#, long_name));
        assert_eq!(s.name.chars().count(), 50);
        assert_eq!(s.bio, DEFAULT_BIO);
        assert_eq!(s.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_parse_line_fallback() {
        let s = parse_suggestions("Name: Desk Pal\nBio: Always there\n\nDescription: Line one\nLine two");
        assert_eq!(s.name, "Desk Pal");
        assert_eq!(s.bio, "Always there");
        assert_eq!(s.description, "Line one\nLine two");
    }

    #[test]
    fn test_parse_line_fallback_defaults() {
        let s = parse_suggestions("Only a name");
        assert_eq!(s.name, "Only a name");
        assert_eq!(s.bio, DEFAULT_BIO);
        assert_eq!(s.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_strip_label_case_insensitive() {
        assert_eq!(strip_label("NAME Bob", "name"), "Bob");
        assert_eq!(strip_label("bio:   hi", "bio"), "hi");
        assert_eq!(strip_label("nameless", "name"), "less");
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("Bio".parse::<SuggestionField>().unwrap(), SuggestionField::Bio);
        assert!("title".parse::<SuggestionField>().is_err());
    }

    #[tokio::test]
    async fn test_generate_agent_config_uses_backend() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .withf(|prompt, _| prompt.contains("Create a customer support agent for this business: bakery"))
            .returning(|_, _| {
                Ok(ChatReply::new(
                    r#"{"name":"Crumb","bio":"Bread expert","description":"Warm."}"#,
                    None,
                ))
            });

        let s = generate_agent_config(&backend, "bakery", "s").await.unwrap();
        assert_eq!(s.name, "Crumb");
    }

    #[tokio::test]
    async fn test_regenerate_field_trims_and_limits() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .withf(|prompt, _| prompt.contains("- Name: Not set") && prompt.contains("requested bio"))
            .returning(|_, _| Ok(ChatReply::new(format!("  {}  ", "b".repeat(150)), None)));

        let value = regenerate_field(
            &backend,
            SuggestionField::Bio,
            "bakery",
            &AgentSuggestions::default(),
            "s",
        )
        .await
        .unwrap();
        assert_eq!(value.len(), 100);
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_, _| Err(HelpdeskError::MissingCredentials("no key".into()).into()));
        assert!(generate_agent_config(&backend, "x", "s").await.is_err());
    }
}
