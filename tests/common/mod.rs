use async_trait::async_trait;
use helpdesk::chat::{ChatBackend, ChatReply};
use helpdesk::config::{Config, RegistryConfig};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Registry configuration pointing at a mock server
#[allow(dead_code)]
pub fn registry_config(base_url: &str) -> RegistryConfig {
    RegistryConfig {
        url: base_url.to_string(),
        token: "test-token".to_string(),
        timeout_seconds: 5,
        ..RegistryConfig::default()
    }
}

/// Configuration suitable for an in-process server
#[allow(dead_code)]
pub fn offline_config() -> Config {
    let mut config = Config::default();
    config.support.offline = true;
    config
}

/// Registry entry JSON in the registry's field casing
#[allow(dead_code)]
pub fn agent_entry(name: &str, description: &str, status: &str, api_base_url: &str) -> Value {
    json!({
        "id": format!("id-{}", name),
        "name": name,
        "description": description,
        "status": status,
        "agentIdentifier": format!("agent-{}", name.to_lowercase().replace(' ', "-")),
        "apiBaseUrl": api_base_url,
        "Capability": {"name": "general", "version": "1.0"},
        "AgentPricing": {
            "pricingType": "Fixed",
            "FixedPricing": {"Amounts": [{"amount": "1000000", "unit": "lovelace"}]}
        },
        "Tags": []
    })
}

/// Chat backend that records prompts and answers from a script
#[allow(dead_code)]
pub struct ScriptedBackend {
    pub prompts: Mutex<Vec<(String, String)>>,
    reply: Option<ChatReply>,
}

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn replying(text: &str, sentiment: Option<f64>) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: Some(ChatReply::new(text, sentiment)),
        }
    }

    pub fn failing() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: None,
        }
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().expect("prompt lock").clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send(&self, prompt: &str, session_id: &str) -> anyhow::Result<ChatReply> {
        self.prompts
            .lock()
            .expect("prompt lock")
            .push((prompt.to_string(), session_id.to_string()));
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(anyhow::anyhow!("backend down")),
        }
    }
}
