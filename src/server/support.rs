//! Support portal endpoints

use super::extract::{ApiJson, ApiQuery, OptionalJson};
use super::{ApiError, ApiResult, AppState};
use crate::sentiment::{AggregateSentiment, Rating, Scenario, SentimentData, ServiceLevel};
use crate::session::{ChatMessage, ChatSession, Exchange};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub async fn active_session(State(state): State<Arc<AppState>>) -> ApiResult<ChatSession> {
    Ok(Json(state.desk.active_session()?))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> ApiResult<Exchange> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Message content must not be empty"));
    }
    Ok(Json(state.desk.send_message(content).await?))
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: Rating,
}

pub async fn rate_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<RateRequest>,
) -> ApiResult<ChatMessage> {
    Ok(Json(state.desk.rate_message(&id, request.rating)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLevelRequest {
    pub service_level: ServiceLevel,
}

pub async fn set_service_level(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ServiceLevelRequest>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.desk.set_service_level(request.service_level)?))
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub closed: ChatSession,
    pub active: ChatSession,
}

pub async fn close_session(State(state): State<Arc<AppState>>) -> ApiResult<CloseResponse> {
    let (closed, active) = state.desk.close_session()?;
    tracing::info!(
        closed = %closed.id,
        overall = closed.overall_sentiment,
        "Support session closed"
    );
    Ok(Json(CloseResponse { closed, active }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Vec<ChatSession>> {
    let limit = query.limit.unwrap_or(state.config.support.history_limit);
    Ok(Json(state.desk.history(limit)?))
}

#[derive(Debug, Deserialize)]
pub struct SentimentQuery {
    pub window_minutes: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
}

impl SimulatorStatus {
    fn of(state: &AppState) -> Self {
        Self {
            running: state.simulator.is_running(),
            scenario: state.simulator.running_scenario(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResponse {
    pub aggregate: AggregateSentiment,
    pub window_minutes: u32,
    pub latest: Option<SentimentData>,
    pub simulator: SimulatorStatus,
}

pub async fn sentiment(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SentimentQuery>,
) -> ApiResult<SentimentResponse> {
    let window_minutes = query
        .window_minutes
        .unwrap_or(state.config.sentiment.window_minutes);
    let store = state.desk.store();

    Ok(Json(SentimentResponse {
        aggregate: store.aggregate(window_minutes)?,
        window_minutes,
        latest: store.latest_sentiment()?,
        simulator: SimulatorStatus::of(&state),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSimulatorRequest {
    #[serde(default)]
    pub scenario: Option<Scenario>,
    #[serde(default, alias = "interval_ms")]
    pub interval_ms: Option<u64>,
}

pub async fn start_simulator(
    State(state): State<Arc<AppState>>,
    OptionalJson(request): OptionalJson<StartSimulatorRequest>,
) -> ApiResult<SimulatorStatus> {
    let scenario = request.scenario.unwrap_or(state.config.sentiment.scenario);
    let interval = request
        .interval_ms
        .unwrap_or(state.config.sentiment.interval_ms);

    state
        .simulator
        .start(scenario, Duration::from_millis(interval));
    tracing::info!(%scenario, interval_ms = interval, "Sentiment simulator started");
    Ok(Json(SimulatorStatus::of(&state)))
}

pub async fn stop_simulator(State(state): State<Arc<AppState>>) -> ApiResult<SimulatorStatus> {
    state.simulator.stop();
    tracing::info!("Sentiment simulator stopped");
    Ok(Json(SimulatorStatus::of(&state)))
}
