//! Wire types for the agent registry and the agent service contract

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Registry-reported status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AgentStatus {
    Online,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Online => write!(f, "Online"),
            AgentStatus::Offline => write!(f, "Offline"),
            AgentStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Capability advertised by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Capability {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// One price entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Integer amount as a string
    pub amount: String,
    /// Asset unit; `lovelace` or empty means ADA
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FixedPricing {
    #[serde(rename = "Amounts", default)]
    pub amounts: Vec<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentPricing {
    #[serde(default)]
    pub pricing_type: String,
    #[serde(rename = "FixedPricing", default, skip_serializing_if = "Option::is_none")]
    pub fixed_pricing: Option<FixedPricing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIdentifier {
    #[serde(default)]
    pub payment_identifier: String,
    #[serde(default)]
    pub payment_type: String,
    #[serde(rename = "sellerVKey", default)]
    pub seller_vkey: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Legal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
}

/// An agent entry from the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryAgent {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub agent_identifier: String,
    pub api_base_url: String,
    #[serde(rename = "Capability", default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,
    #[serde(rename = "AgentPricing", default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<AgentPricing>,
    #[serde(rename = "PaymentIdentifier", default)]
    pub payment_identifiers: Vec<PaymentIdentifier>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(rename = "Legal", default, skip_serializing_if = "Option::is_none")]
    pub legal: Option<Legal>,
}

impl RegistryAgent {
    pub fn is_online(&self) -> bool {
        self.status == AgentStatus::Online
    }

    /// Capability name, or empty
    pub fn capability_name(&self) -> &str {
        self.capability.as_ref().map(|c| c.name.as_str()).unwrap_or("")
    }

    /// First fixed-pricing amount, if any
    pub fn first_price(&self) -> Option<&Amount> {
        self.pricing
            .as_ref()
            .and_then(|p| p.fixed_pricing.as_ref())
            .and_then(|f| f.amounts.first())
    }

    /// Lowercased name, description, capability and tags joined by spaces
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name,
            self.description,
            self.capability_name(),
            self.tags.join(" ")
        )
        .to_lowercase()
    }
}

/// One field of an agent's input form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub id: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InputFieldData>,
}

fn default_field_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InputFieldData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Normalized input schema of an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSchema {
    pub input_data: Vec<InputField>,
}

impl InputSchema {
    /// Single free-text field used when an agent publishes no usable schema
    pub fn default_text() -> Self {
        Self {
            input_data: vec![InputField {
                id: "text".to_string(),
                field_type: "string".to_string(),
                name: "Text Input".to_string(),
                data: Some(InputFieldData {
                    description: Some("Enter your query or question".to_string()),
                    placeholder: Some("Type your message here...".to_string()),
                }),
            }],
        }
    }

    /// Understand both registry-style and JSON-schema-style documents
    ///
    /// Registry style lists fields under `input_data`. JSON-schema style
    /// has `properties`; each property becomes a field and `required` ones
    /// come first. Returns `None` when neither shape yields a field.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(fields) = value.get("input_data") {
            if let Ok(input_data) = serde_json::from_value::<Vec<InputField>>(fields.clone()) {
                if !input_data.is_empty() {
                    return Some(Self { input_data });
                }
            }
        }

        let properties = value.get("properties")?.as_object()?;
        let required: Vec<&str> = value
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut input_data: Vec<InputField> = properties
            .iter()
            .filter(|(_, spec)| spec.get("type").and_then(Value::as_str) != Some("object"))
            .map(|(id, spec)| InputField {
                id: id.clone(),
                field_type: spec
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("string")
                    .to_string(),
                name: spec
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or(id)
                    .to_string(),
                data: spec
                    .get("description")
                    .and_then(Value::as_str)
                    .map(|d| InputFieldData {
                        description: Some(d.to_string()),
                        placeholder: None,
                    }),
            })
            .collect();
        input_data.sort_by_key(|f| !required.contains(&f.id.as_str()));

        if input_data.is_empty() {
            None
        } else {
            Some(Self { input_data })
        }
    }

    /// Fill every field with the same text
    pub fn fill_all(&self, text: &str) -> BTreeMap<String, String> {
        self.input_data
            .iter()
            .map(|f| (f.id.clone(), text.to_string()))
            .collect()
    }
}

/// Response of `POST /start_job`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartJobResponse {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Job state as reported by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Processing,
    AwaitingPayment,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Response of `GET /status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub job_id: String,
    pub status: JobState,
    /// Agent-defined result; strings are used as-is
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusResponse {
    /// Result rendered as text
    ///
    /// A string is returned as-is. An object with a string `response` field
    /// yields that field. Anything else is JSON-encoded.
    pub fn result_text(&self) -> Option<String> {
        match self.result.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(
                other
                    .get("response")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            ),
        }
    }
}
