//! Error types for HelpDesk
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for HelpDesk operations
///
/// Covers configuration loading, the external registry and agent services,
/// the chat-completion API, the in-memory session store and job polling.
#[derive(Error, Debug)]
pub enum HelpdeskError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Agent registry errors (discovery, details lookup)
    #[error("Registry error: {0}")]
    Registry(String),

    /// Errors returned by an agent's service endpoints
    #[error("Agent service error: {0}")]
    AgentService(String),

    /// The agent did not answer its availability check
    #[error("Agent is currently unavailable: {0}")]
    AgentUnavailable(String),

    /// Chat-completion API errors
    #[error("Chat API error: {0}")]
    Chat(String),

    /// Missing credentials for an external service
    #[error("Missing credentials for service: {0}")]
    MissingCredentials(String),

    /// Session store errors (lock poisoning, inconsistent state)
    #[error("Session error: {0}")]
    Session(String),

    /// No message with this id in the active session
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// No job with this id
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Caller supplied an invalid value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The agent reported the job as failed
    #[error("Job {job_id} failed: {message}")]
    JobFailed {
        /// Job identifier returned by `/start_job`
        job_id: String,
        /// Error text reported by the agent
        message: String,
    },

    /// The poller ran out of attempts before the job finished
    #[error("Job polling failed after {attempts} attempts: {message}")]
    PollingExhausted {
        /// Number of status requests made
        attempts: u32,
        /// Last error or status observed
        message: String,
    },

    /// Operation was cancelled through its cancellation token
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Upstream request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HelpdeskError {
    /// Map a failed HTTP exchange, keeping timeouts distinguishable
    ///
    /// Timeouts become [`HelpdeskError::Timeout`]; every other failure is
    /// built with `wrap`.
    pub fn transport(
        context: &str,
        err: reqwest::Error,
        wrap: impl FnOnce(String) -> HelpdeskError,
    ) -> Self {
        let message = format!("{}: {}", context, err);
        if err.is_timeout() {
            HelpdeskError::Timeout(message)
        } else {
            wrap(message)
        }
    }
}

/// Result type alias for HelpDesk operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`HelpdeskError`] where the variant matters (HTTP status
/// mapping, retry decisions).
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = HelpdeskError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_registry_error_display() {
        let error = HelpdeskError::Registry("503 Service Unavailable".to_string());
        assert_eq!(error.to_string(), "Registry error: 503 Service Unavailable");
    }

    #[test]
    fn test_agent_unavailable_display() {
        let error = HelpdeskError::AgentUnavailable("https://agent.example".to_string());
        assert_eq!(
            error.to_string(),
            "Agent is currently unavailable: https://agent.example"
        );
    }

    #[test]
    fn test_job_failed_display() {
        let error = HelpdeskError::JobFailed {
            job_id: "job_1".to_string(),
            message: "model overloaded".to_string(),
        };
        assert_eq!(error.to_string(), "Job job_1 failed: model overloaded");
    }

    #[test]
    fn test_polling_exhausted_display() {
        let error = HelpdeskError::PollingExhausted {
            attempts: 30,
            message: "status still running".to_string(),
        };
        let s = error.to_string();
        assert!(s.contains("30 attempts"));
        assert!(s.contains("status still running"));
    }

    #[test]
    fn test_missing_credentials_display() {
        let error = HelpdeskError::MissingCredentials("chat api".to_string());
        assert_eq!(error.to_string(), "Missing credentials for service: chat api");
    }

    #[test]
    fn test_message_not_found_display() {
        let error = HelpdeskError::MessageNotFound("abc".to_string());
        assert_eq!(error.to_string(), "Message not found: abc");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: HelpdeskError = io_error.into();
        assert!(matches!(error, HelpdeskError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: HelpdeskError = json_error.into();
        assert!(matches!(error, HelpdeskError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: HelpdeskError = yaml_error.into();
        assert!(matches!(error, HelpdeskError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HelpdeskError>();
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: Result<()> = Err(HelpdeskError::Cancelled("poll".to_string()).into());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HelpdeskError>(),
            Some(HelpdeskError::Cancelled(_))
        ));
    }
}
