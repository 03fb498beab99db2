//! Agent registry client

use super::types::RegistryAgent;
use crate::config::RegistryConfig;
use crate::error::{HelpdeskError, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Words that mark an agent as suitable for support work
pub const SUPPORT_KEYWORDS: [&str; 8] = [
    "support", "help", "doc", "faq", "assist", "customer", "qa", "question",
];

/// Capability words preferred when ranking support agents
const SUPPORT_CAPABILITY_WORDS: [&str; 3] = ["support", "help", "assist"];

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct EntryPage {
    #[serde(default)]
    entries: Vec<RegistryAgent>,
}

/// Whether an agent's text mentions any support keyword
pub fn matches_support_keywords(agent: &RegistryAgent) -> bool {
    let text = agent.search_text();
    SUPPORT_KEYWORDS.iter().any(|k| text.contains(k))
}

fn has_support_capability(agent: &RegistryAgent) -> bool {
    let capability = agent.capability_name().to_lowercase();
    SUPPORT_CAPABILITY_WORDS
        .iter()
        .any(|w| capability.contains(w))
}

/// Order support agents: online first, then support-flavoured capabilities
///
/// The sort is stable, so registry order breaks ties.
pub fn rank_support_agents(agents: &mut [RegistryAgent]) {
    agents.sort_by_key(|a| (!a.is_online(), !has_support_capability(a)));
}

/// Client for the agent registry
///
/// # Examples
///
/// ```no_run
/// use helpdesk::config::RegistryConfig;
/// use helpdesk::masumi::RegistryClient;
///
/// # async fn example() -> helpdesk::error::Result<()> {
/// let client = RegistryClient::new(&RegistryConfig::default())?;
/// for agent in client.discover_agents(20).await? {
///     println!("{} ({})", agent.name, agent.status);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
    network: String,
    token: String,
}

impl RegistryClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("helpdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HelpdeskError::Registry(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            network: config.network.clone(),
            token: config.token.clone(),
        })
    }

    /// List registry entries for the configured network
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Registry`] on transport failure or a non-2xx
    /// response
    pub async fn discover_agents(&self, limit: u32) -> Result<Vec<RegistryAgent>> {
        let url = format!("{}/api/v1/registry-entry", self.base_url);
        tracing::debug!(network = %self.network, limit, "Discovering agents");

        let response = self
            .client
            .post(&url)
            .header("token", &self.token)
            .json(&serde_json::json!({
                "network": self.network,
                "limit": limit,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Agent discovery request failed: {}", e);
                HelpdeskError::transport("Agent discovery failed", e, HelpdeskError::Registry)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Registry returned error {}", status);
            return Err(HelpdeskError::Registry(format!(
                "Failed to fetch agents: {}",
                status
            ))
            .into());
        }

        let envelope: Envelope<EntryPage> = response.json().await.map_err(|e| {
            HelpdeskError::Registry(format!("Failed to parse registry response: {}", e))
        })?;

        let agents = envelope.data.map(|d| d.entries).unwrap_or_default();
        tracing::info!("Discovered {} agents", agents.len());
        Ok(agents)
    }

    /// Look up one agent by identifier; `None` when the registry answers 404
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Registry`] on other failures
    pub async fn agent_details(&self, agent_identifier: &str) -> Result<Option<RegistryAgent>> {
        let url = format!("{}/api/v1/payment-information", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("agentIdentifier", agent_identifier)])
            .header("token", &self.token)
            .send()
            .await
            .map_err(|e| {
                HelpdeskError::transport("Agent details retrieval failed", e, HelpdeskError::Registry)
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(HelpdeskError::Registry(format!(
                "Failed to get agent details: {}",
                status
            ))
            .into());
        }

        let envelope: Envelope<RegistryAgent> = response.json().await.map_err(|e| {
            HelpdeskError::Registry(format!("Failed to parse agent details: {}", e))
        })?;
        Ok(envelope.data)
    }

    /// Online agents whose text mentions a support keyword
    pub async fn find_support_agents(&self, limit: u32) -> Result<Vec<RegistryAgent>> {
        let agents = self.discover_agents(limit).await?;
        Ok(agents
            .into_iter()
            .filter(|a| a.is_online() && matches_support_keywords(a))
            .collect())
    }

    /// Highest-ranked support agent, or `None`
    ///
    /// Discovery failures are logged and reported as `None`.
    pub async fn best_support_agent(&self, limit: u32) -> Option<RegistryAgent> {
        match self.find_support_agents(limit).await {
            Ok(mut agents) => {
                rank_support_agents(&mut agents);
                agents.into_iter().next()
            }
            Err(e) => {
                tracing::warn!("Failed to get best support agent: {:#}", e);
                None
            }
        }
    }
}
