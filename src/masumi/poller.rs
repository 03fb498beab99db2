//! Cancellable job polling with backoff

use super::service::JobStatusSource;
use super::types::JobState;
use crate::config::PollingConfig;
use crate::error::{HelpdeskError, Result};
use metrics::increment_counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result text used when a completed job carries none
pub const DEFAULT_COMPLETED_TEXT: &str = "Job completed successfully";

/// How often and how long to poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    /// Wait after the first attempt
    pub initial_delay: Duration,
    /// Multiplier applied to the wait after each further attempt
    pub backoff_factor: f64,
    /// Upper bound on any single wait
    pub max_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            initial_delay: Duration::from_secs(2),
            backoff_factor: 1.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_factor: config.backoff_factor,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl PollPolicy {
    /// Wait after attempt `attempt` (zero-based)
    ///
    /// # Examples
    ///
    /// ```
    /// use helpdesk::masumi::PollPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = PollPolicy {
    ///     max_attempts: 5,
    ///     initial_delay: Duration::from_millis(100),
    ///     backoff_factor: 2.0,
    ///     max_delay: Duration::from_millis(300),
    /// };
    /// assert_eq!(policy.delay_for(0), Duration::from_millis(100));
    /// assert_eq!(policy.delay_for(1), Duration::from_millis(200));
    /// assert_eq!(policy.delay_for(2), Duration::from_millis(300));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(attempt.min(64) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Poll a job until it completes, fails, runs out of attempts or is cancelled
///
/// Transport and decode errors are logged and retried. A `failed` status
/// stops polling at once.
///
/// # Errors
///
/// - [`HelpdeskError::JobFailed`] when the agent reports failure
/// - [`HelpdeskError::PollingExhausted`] when every attempt is used
/// - [`HelpdeskError::Cancelled`] when `cancel` fires
pub async fn poll_job(
    source: &dyn JobStatusSource,
    job_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<String> {
    let mut last_error: Option<String> = None;

    for attempt in 0..policy.max_attempts {
        increment_counter!("helpdesk_job_poll_attempts_total");

        let fetched = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled(job_id)),
            fetched = source.job_status(job_id) => fetched,
        };

        match fetched {
            Ok(status) => match status.status {
                JobState::Completed => {
                    increment_counter!("helpdesk_jobs_total", "outcome" => "completed");
                    tracing::info!(job_id, attempts = attempt + 1, "Job completed");
                    return Ok(status
                        .result_text()
                        .unwrap_or_else(|| DEFAULT_COMPLETED_TEXT.to_string()));
                }
                JobState::Failed => {
                    increment_counter!("helpdesk_jobs_total", "outcome" => "failed");
                    let message = status.error.unwrap_or_else(|| "Job failed".to_string());
                    tracing::warn!(job_id, "Job failed: {}", message);
                    return Err(HelpdeskError::JobFailed {
                        job_id: job_id.to_string(),
                        message,
                    }
                    .into());
                }
                other => {
                    tracing::debug!(job_id, attempt = attempt + 1, state = ?other, "Job not finished");
                }
            },
            Err(e) => {
                tracing::warn!(job_id, "Job polling attempt {} failed: {:#}", attempt + 1, e);
                last_error = Some(format!("{:#}", e));
            }
        }

        if attempt + 1 < policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => return Err(cancelled(job_id)),
                _ = tokio::time::sleep(policy.delay_for(attempt)) => {}
            }
        }
    }

    increment_counter!("helpdesk_jobs_total", "outcome" => "exhausted");
    Err(HelpdeskError::PollingExhausted {
        attempts: policy.max_attempts,
        message: last_error
            .unwrap_or_else(|| "Job did not complete within the expected time".to_string()),
    }
    .into())
}

fn cancelled(job_id: &str) -> anyhow::Error {
    tracing::info!(job_id, "Job polling cancelled");
    HelpdeskError::Cancelled(format!("Polling for job {} was cancelled", job_id)).into()
}

/// Handle to a polling task running in the background
pub struct PollHandle {
    cancel: CancellationToken,
    handle: JoinHandle<Result<String>>,
}

impl PollHandle {
    /// Request cancellation; the task ends with a cancelled error
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task's outcome
    pub async fn join(self) -> Result<String> {
        self.handle
            .await
            .map_err(|e| HelpdeskError::AgentService(format!("Polling task failed: {}", e)))?
    }
}

/// Spawn [`poll_job`] on the runtime
pub fn spawn_poll(
    source: Arc<dyn JobStatusSource>,
    job_id: String,
    policy: PollPolicy,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle =
        tokio::spawn(async move { poll_job(source.as_ref(), &job_id, &policy, &token).await });
    PollHandle { cancel, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masumi::types::JobStatusResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted responses, repeating the last one
    struct Scripted {
        responses: Mutex<VecDeque<Result<JobStatusResponse>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(states: Vec<Result<JobStatusResponse>>) -> Self {
            Self {
                responses: Mutex::new(states.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobStatusSource for Scripted {
        async fn job_status(&self, _job_id: &str) -> Result<JobStatusResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut queue = self.responses.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                match queue.front().unwrap() {
                    Ok(status) => Ok(status.clone()),
                    Err(e) => Err(anyhow::anyhow!("{}", e)),
                }
            }
        }
    }

    fn status(value: serde_json::Value) -> Result<JobStatusResponse> {
        Ok(serde_json::from_value(value).unwrap())
    }

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(10),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_running() {
        let source = Scripted::new(vec![
            status(json!({"job_id": "j", "status": "running"})),
            status(json!({"job_id": "j", "status": "completed", "result": "answer"})),
        ]);
        let out = poll_job(&source, "j", &fast_policy(5), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "answer");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_result_uses_default_text() {
        let source = Scripted::new(vec![status(json!({"status": "completed"}))]);
        let out = poll_job(&source, "j", &fast_policy(3), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, DEFAULT_COMPLETED_TEXT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stops_immediately() {
        let source = Scripted::new(vec![status(
            json!({"job_id": "j", "status": "failed", "error": "bad input"}),
        )]);
        let err = poll_job(&source, "j", &fast_policy(10), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(source.calls(), 1);
        match err.downcast_ref::<HelpdeskError>() {
            Some(HelpdeskError::JobFailed { message, .. }) => assert_eq!(message, "bad input"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_retried() {
        let source = Scripted::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            Err(anyhow::anyhow!("connection reset")),
            status(json!({"status": "completed", "result": "ok"})),
        ]);
        let out = poll_job(&source, "j", &fast_policy(5), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "ok");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let source = Scripted::new(vec![status(json!({"status": "pending"}))]);
        let err = poll_job(&source, "j", &fast_policy(4), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(source.calls(), 4);
        assert!(matches!(
            err.downcast_ref::<HelpdeskError>(),
            Some(HelpdeskError::PollingExhausted { attempts: 4, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_reports_last_transport_error() {
        let source = Scripted::new(vec![Err(anyhow::anyhow!("dns failure"))]);
        let err = poll_job(&source, "j", &fast_policy(2), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dns failure"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_poll_can_be_cancelled() {
        let source = Arc::new(Scripted::new(vec![status(json!({"status": "running"}))]));
        let policy = PollPolicy {
            max_attempts: 1_000,
            initial_delay: Duration::from_secs(2),
            backoff_factor: 1.0,
            max_delay: Duration::from_secs(2),
        };
        let handle = spawn_poll(source.clone(), "j".to_string(), policy);
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.cancel();
        let err = handle.join().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HelpdeskError>(),
            Some(HelpdeskError::Cancelled(_))
        ));
        assert!(source.calls() < 1_000);
    }

    #[test]
    fn test_delay_backoff_capped() {
        let policy = PollPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 3.0,
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(60), Duration::from_secs(2));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = PollPolicy::from(&PollingConfig::default());
        assert_eq!(policy, PollPolicy::default());
    }
}
