//! End-to-end agent workflows: querying one agent and probing many

use super::poller::{poll_job, PollPolicy};
use super::service::AgentServiceClient;
use super::types::RegistryAgent;
use crate::error::{HelpdeskError, Result};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Gap between probe start times
pub const PROBE_STAGGER: Duration = Duration::from_millis(500);

/// Ask one agent a question and wait for the answer
///
/// Checks availability, reads the input schema, fills every field with
/// `query`, starts a job and polls it to completion.
///
/// # Errors
///
/// - [`HelpdeskError::AgentUnavailable`] when the availability check fails
/// - any error from starting or polling the job
pub async fn query_agent(
    agent: &RegistryAgent,
    query: &str,
    policy: &PollPolicy,
    availability_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String> {
    let client = AgentServiceClient::new(&agent.api_base_url, availability_timeout)?;

    if !client.check_availability().await {
        return Err(HelpdeskError::AgentUnavailable(agent.name.clone()).into());
    }

    let schema = client.input_schema().await;
    let input_data = schema.fill_all(query);
    tracing::debug!(agent = %agent.name, fields = input_data.len(), "Prepared job input");

    let started = client.start_job(&input_data).await?;
    poll_job(&client, &started.job_id, policy, cancel).await
}

/// Outcome of probing one agent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProbe {
    pub agent: RegistryAgent,
    pub is_available: bool,
    #[serde(with = "duration_millis")]
    pub response_time: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Probe agents concurrently, starting each `stagger * index` after the first
///
/// Results are sorted available-first, then by response time.
pub async fn probe_agents(
    agents: Vec<RegistryAgent>,
    stagger: Duration,
    availability_timeout: Duration,
) -> Vec<AgentProbe> {
    let probes = agents.into_iter().enumerate().map(|(index, agent)| async move {
        tokio::time::sleep(stagger * index as u32).await;
        probe_one(agent, availability_timeout).await
    });

    let mut results = join_all(probes).await;
    sort_probes(&mut results);

    let available = results.iter().filter(|r| r.is_available).count();
    tracing::info!("Probe results: {}/{} agents available", available, results.len());
    results
}

async fn probe_one(agent: RegistryAgent, availability_timeout: Duration) -> AgentProbe {
    let started = Instant::now();
    let (is_available, error) =
        match AgentServiceClient::new(&agent.api_base_url, availability_timeout) {
            Ok(client) => {
                let ok = client.check_availability().await;
                (ok, (!ok).then(|| "availability check failed".to_string()))
            }
            Err(e) => (false, Some(format!("{:#}", e))),
        };
    let response_time = started.elapsed();

    tracing::debug!(
        agent = %agent.name,
        is_available,
        response_ms = response_time.as_millis() as u64,
        "Agent probed"
    );

    AgentProbe {
        agent,
        is_available,
        response_time,
        error,
    }
}

/// Available first, then fastest
pub fn sort_probes(results: &mut [AgentProbe]) {
    results.sort_by_key(|r| (!r.is_available, r.response_time));
}

/// First available agent of sorted probe results
pub fn best_working_agent(results: &[AgentProbe]) -> Option<&AgentProbe> {
    results.iter().find(|r| r.is_available)
}
