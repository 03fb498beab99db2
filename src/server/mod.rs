//! HTTP service
//!
//! Two route groups share one router:
//!
//! - `/api/...`: the support portal (sessions, ratings, sentiment)
//! - `/`, `/health`, `/input_schema`, `/output_schema`, `/availability`,
//!   `/start_job`, `/status`: the agent-service contract, backed by an
//!   in-memory job table and the chat backend

pub mod agent;
pub mod extract;
pub mod support;

use crate::chat::{CannedBackend, ChatBackend, ChatClient};
use crate::config::Config;
use crate::error::{HelpdeskError, Result};
use crate::sentiment::SentimentSimulator;
use crate::session::{InMemorySessionStore, SessionStore, SupportDesk};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub use agent::{JobRecord, JobResult, JobTable};

/// Shared state behind every handler
pub struct AppState {
    pub config: Config,
    pub desk: SupportDesk,
    pub backend: Arc<dyn ChatBackend>,
    pub simulator: SentimentSimulator,
    pub jobs: JobTable,
}

impl AppState {
    /// Build state from its parts and start feeding simulator output into
    /// the session store's sentiment history
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: Config, store: Arc<dyn SessionStore>, backend: Arc<dyn ChatBackend>) -> Self {
        let desk = SupportDesk::new(store.clone(), backend.clone(), config.chat.history_messages);
        let simulator = SentimentSimulator::new();
        spawn_sentiment_feed(&simulator, store);

        Self {
            config,
            desk,
            backend,
            simulator,
            jobs: JobTable::default(),
        }
    }

    /// Build state from configuration
    ///
    /// Uses the canned offline backend when `support.offline` is set.
    ///
    /// # Errors
    ///
    /// Returns error if the chat client cannot be built
    pub fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn SessionStore> =
            Arc::new(InMemorySessionStore::new(config.support.service_level));
        let backend = chat_backend(&config)?;
        Ok(Self::new(config, store, backend))
    }
}

/// Chat backend selected by configuration
///
/// # Errors
///
/// Returns error if the chat client cannot be built
pub fn chat_backend(config: &Config) -> Result<Arc<dyn ChatBackend>> {
    if config.support.offline {
        tracing::info!("Offline mode: using canned replies");
        return Ok(Arc::new(CannedBackend::new()));
    }

    let client = ChatClient::new(&config.chat)?;
    if !client.has_credentials() {
        tracing::warn!("No chat API key configured; replies will fall back to the apology text");
    }
    Ok(Arc::new(client))
}

fn spawn_sentiment_feed(simulator: &SentimentSimulator, store: Arc<dyn SessionStore>) {
    let mut rx = simulator.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(data) => {
                    if let Err(e) = store.record_sentiment(data) {
                        tracing::error!("Failed to record simulated sentiment: {:#}", e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Sentiment feed lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("Sentiment feed stopped");
    });
}

/// Build the full router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Agent-service contract
        .route("/", get(agent::descriptor))
        .route("/health", get(agent::health))
        .route("/input_schema", get(agent::input_schema))
        .route("/output_schema", get(agent::output_schema))
        .route("/availability", get(agent::availability))
        .route("/start_job", post(agent::start_job))
        .route("/status", get(agent::job_status))
        // Support portal
        .route("/api/sessions/active", get(support::active_session))
        .route("/api/sessions/active/messages", post(support::send_message))
        .route(
            "/api/sessions/active/messages/:id/rating",
            post(support::rate_message),
        )
        .route(
            "/api/sessions/active/service-level",
            put(support::set_service_level),
        )
        .route("/api/sessions/active/close", post(support::close_session))
        .route("/api/sessions/history", get(support::history))
        .route("/api/sentiment", get(support::sentiment))
        .route("/api/sentiment/simulator/start", post(support::start_simulator))
        .route("/api/sentiment/simulator/stop", post(support::stop_simulator))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(config: Config) -> Result<()> {
    let addr = config.server.bind_address();
    let state = Arc::new(AppState::from_config(config)?);
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!("Failed to bind {}: {}", addr, e);
        HelpdeskError::Config(format!("Failed to bind {}: {}", addr, e))
    })?;
    tracing::info!("HelpDesk server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await?;

    state.simulator.stop();
    Ok(())
}

/// JSON error body: `{error, message?, details?}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: status
                    .canonical_reason()
                    .unwrap_or("Error")
                    .to_string(),
                message: Some(message.into()),
                details: None,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.body.details = Some(details);
        self
    }
}

/// Status bucket for a library error
pub fn status_for(error: &HelpdeskError) -> StatusCode {
    match error {
        HelpdeskError::InvalidInput(_) | HelpdeskError::Serialization(_) => {
            StatusCode::BAD_REQUEST
        }
        HelpdeskError::MessageNotFound(_) | HelpdeskError::JobNotFound(_) => StatusCode::NOT_FOUND,
        HelpdeskError::Registry(_)
        | HelpdeskError::AgentService(_)
        | HelpdeskError::Chat(_)
        | HelpdeskError::JobFailed { .. } => StatusCode::BAD_GATEWAY,
        HelpdeskError::AgentUnavailable(_) | HelpdeskError::MissingCredentials(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        HelpdeskError::Timeout(_) | HelpdeskError::PollingExhausted { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = err
            .downcast_ref::<HelpdeskError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", err);
        } else {
            tracing::debug!("Request rejected: {:#}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl From<HelpdeskError> for ApiError {
    fn from(err: HelpdeskError) -> Self {
        anyhow::Error::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Handler result
pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;
