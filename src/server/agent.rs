//! Agent-service endpoints
//!
//! Jobs are accepted without payment, stored as `processing` and answered in
//! the background through the chat backend.

use super::extract::{ApiJson, ApiQuery};
use super::{ApiError, ApiResult, AppState};
use crate::error::HelpdeskError;
use crate::masumi::JobState;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use metrics::increment_counter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Confidence reported with every answer
pub const RESULT_CONFIDENCE: f64 = 0.95;

/// Source reported with every answer
pub const RESULT_SOURCE: &str = "Flux Point Studios AI";

const DOCUMENTATION_URL: &str =
    "https://docs.masumi.network/technical-documentation/mip-3-agentic-service-standard";

/// Finished jobs kept for status lookups; older ones are dropped first
pub const MAX_FINISHED_JOBS: usize = 1000;

/// Jobs by id
pub type JobTable = Arc<RwLock<HashMap<String, JobRecord>>>;

/// Answer and its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub response: String,
    pub metadata: ResultMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub confidence: f64,
    pub sources: Vec<String>,
}

impl JobResult {
    fn answer(response: String) -> Self {
        Self {
            response,
            metadata: ResultMetadata {
                confidence: RESULT_CONFIDENCE,
                sources: vec![RESULT_SOURCE.to_string()],
            },
        }
    }
}

/// One accepted job
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_from_purchaser: Option<String>,
    #[serde(skip)]
    pub input_data: Value,
    pub status: JobState,
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// SHA-256 of `{input, output}`, hex encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_hash: Option<String>,
}

impl JobRecord {
    fn new(identifier_from_purchaser: Option<String>, input_data: Value) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            identifier_from_purchaser,
            input_data,
            status: JobState::Processing,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
            result_hash: None,
        }
    }

    fn message(&self) -> Option<&str> {
        self.input_data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
    }

    fn chat_session_id(&self) -> String {
        self.input_data
            .pointer("/context/sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.job_id.clone())
    }

    fn complete(&mut self, response: String) {
        let result = JobResult::answer(response);
        self.result_hash = Some(result_hash(&self.input_data, &result));
        self.result = Some(result);
        self.status = JobState::Completed;
        self.completed_at = Some(Utc::now());
    }

    fn fail(&mut self, message: &str) {
        self.status = JobState::Failed;
        self.error = Some(message.to_string());
        self.completed_at = Some(Utc::now());
    }
}

/// Drop the oldest finished jobs until at most `keep` remain
///
/// Jobs still processing are never removed.
pub fn prune_finished(jobs: &mut HashMap<String, JobRecord>, keep: usize) {
    let mut finished: Vec<(DateTime<Utc>, String)> = jobs
        .values()
        .filter_map(|job| job.completed_at.map(|at| (at, job.job_id.clone())))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort();
    let excess = finished.len() - keep;
    for (_, job_id) in finished.into_iter().take(excess) {
        jobs.remove(&job_id);
    }
    tracing::debug!("Pruned {} finished jobs", excess);
}

/// Hex SHA-256 of the JSON document `{input, output}`
pub fn result_hash(input: &Value, output: &JobResult) -> String {
    let document = json!({ "input": input, "output": output });
    let digest = Sha256::digest(document.to_string().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub async fn descriptor() -> Json<Value> {
    Json(json!({
        "name": "AI Support Agent",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /input_schema",
            "GET /output_schema",
            "GET /availability",
            "POST /start_job",
            "GET /status",
            "GET /health"
        ],
        "documentation": DOCUMENTATION_URL,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}

pub async fn input_schema() -> Json<Value> {
    Json(json!({
        "type": "object",
        "properties": {
            "message": {
                "type": "string",
                "description": "The message or question for the AI support agent"
            },
            "context": {
                "type": "object",
                "description": "Optional context about the conversation",
                "properties": {
                    "userId": { "type": "string" },
                    "sessionId": { "type": "string" },
                    "category": { "type": "string" }
                }
            }
        },
        "required": ["message"]
    }))
}

pub async fn output_schema() -> Json<Value> {
    Json(json!({
        "type": "object",
        "properties": {
            "response": {
                "type": "string",
                "description": "The AI agent response"
            },
            "metadata": {
                "type": "object",
                "properties": {
                    "confidence": { "type": "number" },
                    "sources": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    }))
}

pub async fn availability(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "message": "Agent is ready to accept requests",
        "price": {
            "amount": state.config.agent.price_lovelace,
            "unit": "lovelace"
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    #[serde(default)]
    pub identifier_from_purchaser: Option<String>,
    #[serde(default)]
    pub input_data: Value,
}

pub async fn start_job(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<StartJobRequest>,
) -> ApiResult<Value> {
    let record = JobRecord::new(request.identifier_from_purchaser, request.input_data);
    if record.message().is_none() {
        return Err(ApiError::bad_request(
            "Missing required field: input_data.message",
        ));
    }

    let job_id = record.job_id.clone();
    state.jobs.write().await.insert(job_id.clone(), record);
    tracing::info!(job_id = %job_id, "Job accepted");

    tokio::spawn(process_job(state.clone(), job_id.clone()));

    Ok(Json(json!({
        "status": "success",
        "job_id": job_id,
        "payment_id": null,
    })))
}

/// Answer a stored job through the chat backend
pub async fn process_job(state: Arc<AppState>, job_id: String) {
    let request = {
        let jobs = state.jobs.read().await;
        jobs.get(&job_id)
            .and_then(|job| job.message().map(|m| (m.to_string(), job.chat_session_id())))
    };
    let Some((message, session_id)) = request else {
        tracing::warn!(job_id = %job_id, "Job vanished before processing");
        return;
    };

    let outcome = state.backend.send(&message, &session_id).await;

    let mut jobs = state.jobs.write().await;
    let Some(job) = jobs.get_mut(&job_id) else {
        return;
    };
    match outcome {
        Ok(reply) => {
            job.complete(reply.reply);
            increment_counter!("helpdesk_agent_jobs_total", "outcome" => "completed");
            tracing::info!(job_id = %job_id, "Job completed");
        }
        Err(e) => {
            job.fail("Failed to process request");
            increment_counter!("helpdesk_agent_jobs_total", "outcome" => "failed");
            tracing::error!(job_id = %job_id, "Job processing failed: {:#}", e);
        }
    }
    prune_finished(&mut jobs, MAX_FINISHED_JOBS);
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub job_id: Option<String>,
}

pub async fn job_status(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> ApiResult<JobRecord> {
    let job_id = query
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing job_id parameter"))?;

    let jobs = state.jobs.read().await;
    jobs.get(&job_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| HelpdeskError::JobNotFound(job_id).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_hash_is_stable_hex() {
        let input = json!({"message": "hi"});
        let result = JobResult::answer("hello".to_string());
        let a = result_hash(&input, &result);
        let b = result_hash(&input, &result);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, result_hash(&json!({"message": "other"}), &result));
    }

    #[test]
    fn test_job_record_session_id_from_context() {
        let record = JobRecord::new(None, json!({"message": "hi", "context": {"sessionId": "s1"}}));
        assert_eq!(record.chat_session_id(), "s1");

        let record = JobRecord::new(None, json!({"message": "hi"}));
        assert_eq!(record.chat_session_id(), record.job_id);
    }

    #[test]
    fn test_job_record_requires_non_blank_message() {
        assert!(JobRecord::new(None, json!({"message": "  "})).message().is_none());
        assert!(JobRecord::new(None, json!({})).message().is_none());
        assert!(JobRecord::new(None, Value::Null).message().is_none());
    }

    #[test]
    fn test_complete_sets_result_and_hash() {
        let mut record = JobRecord::new(None, json!({"message": "hi"}));
        record.complete("answer".to_string());
        assert_eq!(record.status, JobState::Completed);
        assert!(record.completed_at.is_some());
        assert!(record.result_hash.is_some());
        let result = record.result.unwrap();
        assert_eq!(result.metadata.confidence, RESULT_CONFIDENCE);
        assert_eq!(result.metadata.sources, vec![RESULT_SOURCE.to_string()]);
    }

    #[test]
    fn test_prune_finished_drops_oldest_and_keeps_processing() {
        let mut jobs = HashMap::new();
        let mut finished_ids = Vec::new();
        for i in 0..4 {
            let mut record = JobRecord::new(None, json!({"message": "hi"}));
            record.complete(format!("answer {}", i));
            record.completed_at = Some(Utc::now() + chrono::Duration::seconds(i));
            finished_ids.push(record.job_id.clone());
            jobs.insert(record.job_id.clone(), record);
        }
        let pending = JobRecord::new(None, json!({"message": "still going"}));
        let pending_id = pending.job_id.clone();
        jobs.insert(pending_id.clone(), pending);

        prune_finished(&mut jobs, 2);

        assert_eq!(jobs.len(), 3);
        assert!(jobs.contains_key(&pending_id));
        assert!(!jobs.contains_key(&finished_ids[0]));
        assert!(!jobs.contains_key(&finished_ids[1]));
        assert!(jobs.contains_key(&finished_ids[2]));
        assert!(jobs.contains_key(&finished_ids[3]));

        prune_finished(&mut jobs, 2);
        assert_eq!(jobs.len(), 3);
    }
}
