//! Client for an agent's service endpoints
//!
//! Every agent exposes `/availability`, `/input_schema`, `/start_job` and
//! `/status` under its `apiBaseUrl`.

use super::types::{InputSchema, JobStatusResponse, StartJobResponse};
use crate::error::{HelpdeskError, Result};
use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status lookup used by the job poller
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    /// Fetch the current status of a job
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse>;
}

/// HTTP client bound to one agent's base URL
#[derive(Debug, Clone)]
pub struct AgentServiceClient {
    client: Client,
    base_url: String,
    availability_timeout: Duration,
}

impl AgentServiceClient {
    /// Create a client for `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: &str, availability_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("helpdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                HelpdeskError::AgentService(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            availability_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Whether `/availability` answers 2xx within the timeout
    ///
    /// Any failure, including a timeout, is logged and reported as `false`.
    pub async fn check_availability(&self) -> bool {
        let result = self
            .client
            .get(self.url("availability"))
            .timeout(self.availability_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    base_url = %self.base_url,
                    status = %response.status(),
                    "Agent availability check failed"
                );
                false
            }
            Err(e) => {
                tracing::warn!(base_url = %self.base_url, "Agent availability check failed: {}", e);
                false
            }
        }
    }

    /// Fetch the input schema, falling back to a single text field
    pub async fn input_schema(&self) -> InputSchema {
        match self.fetch_input_schema().await {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(base_url = %self.base_url, "Using default input schema: {:#}", e);
                InputSchema::default_text()
            }
        }
    }

    async fn fetch_input_schema(&self) -> Result<InputSchema> {
        let response = self
            .client
            .get(self.url("input_schema"))
            .send()
            .await
            .map_err(|e| {
                HelpdeskError::transport("Failed to get input schema", e, HelpdeskError::AgentService)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HelpdeskError::AgentService(format!(
                "Failed to get input schema: {}",
                status
            ))
            .into());
        }

        let body: Value = response.json().await.map_err(|e| {
            HelpdeskError::AgentService(format!("Failed to parse input schema: {}", e))
        })?;

        InputSchema::from_value(&body).ok_or_else(|| {
            HelpdeskError::AgentService("Input schema has no usable fields".to_string()).into()
        })
    }

    /// Start a job with the given field values
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::AgentService`] on transport failure, non-2xx
    /// response or an unreadable body
    pub async fn start_job(&self, input_data: &BTreeMap<String, String>) -> Result<StartJobResponse> {
        let body = serde_json::json!({
            "input_data": input_data,
            "identifier_from_purchaser": purchaser_identifier(),
        });

        let response = self
            .client
            .post(self.url("start_job"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to start agent job: {}", e);
                HelpdeskError::transport("Job initiation failed", e, HelpdeskError::AgentService)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("Agent returned error {}: {}", status, text);
            return Err(HelpdeskError::AgentService(format!(
                "Failed to start job: {} {}",
                status, text
            ))
            .into());
        }

        let started: StartJobResponse = response.json().await.map_err(|e| {
            HelpdeskError::AgentService(format!("Failed to parse start_job response: {}", e))
        })?;
        tracing::info!(job_id = %started.job_id, base_url = %self.base_url, "Agent job started");
        Ok(started)
    }
}

#[async_trait]
impl JobStatusSource for AgentServiceClient {
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let response = self
            .client
            .get(self.url("status"))
            .query(&[("job_id", job_id)])
            .send()
            .await
            .map_err(|e| {
                HelpdeskError::transport("Status check failed", e, HelpdeskError::AgentService)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                HelpdeskError::AgentService(format!("Status check failed: {}", status)).into(),
            );
        }

        response.json().await.map_err(|e| {
            HelpdeskError::AgentService(format!("Failed to parse job status: {}", e)).into()
        })
    }
}

/// `job_<unix millis>_<13 random alphanumerics>`
pub fn purchaser_identifier() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(13)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("job_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}
