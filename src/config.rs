//! Configuration management for the helpdesk
//!
//! Configuration is loaded from a YAML file, then overridden by `HELPDESK_*`
//! environment variables and finally by CLI flags.

use crate::cli::{Cli, Commands};
use crate::error::{HelpdeskError, Result};
use crate::sentiment::{Scenario, ServiceLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Agent registry connection
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Chat-completion API connection
    #[serde(default)]
    pub chat: ChatConfig,
    /// Job polling policy
    #[serde(default)]
    pub polling: PollingConfig,
    /// Sentiment simulator settings
    #[serde(default)]
    pub sentiment: SentimentConfig,
    /// Support portal settings
    #[serde(default)]
    pub support: SupportConfig,
    /// Settings for the agent-service endpoints this crate serves
    #[serde(default)]
    pub agent: AgentServiceConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Agent registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry base URL
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Network name sent with discovery requests
    #[serde(default = "default_network")]
    pub network: String,

    /// Value of the `token` header
    #[serde(default = "default_registry_token")]
    pub token: String,

    /// Number of agents requested per discovery call
    #[serde(default = "default_discovery_limit")]
    pub discovery_limit: u32,

    /// Request timeout in seconds
    #[serde(default = "default_registry_timeout")]
    pub timeout_seconds: u64,
}

fn default_registry_url() -> String {
    "https://registry.masumi.network".to_string()
}

fn default_network() -> String {
    "Preprod".to_string()
}

fn default_registry_token() -> String {
    // Public read-only key published for the test registry
    "public-test-key-masumi-registry-c23f3d21".to_string()
}

fn default_discovery_limit() -> u32 {
    50
}

fn default_registry_timeout() -> u64 {
    30
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            network: default_network(),
            token: default_registry_token(),
            discovery_limit: default_discovery_limit(),
            timeout_seconds: default_registry_timeout(),
        }
    }
}

/// Chat-completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Endpoint receiving `{message, session_id}`
    #[serde(default = "default_chat_api_url")]
    pub api_url: String,

    /// Value of the `api-key` header; required for live calls
    #[serde(default)]
    pub api_key: Option<String>,

    /// Session id sent when the caller has none
    #[serde(default = "default_chat_session_id")]
    pub session_id: String,

    /// Request timeout in seconds
    #[serde(default = "default_chat_timeout")]
    pub timeout_seconds: u64,

    /// Number of previous messages included in prompts
    #[serde(default = "default_history_messages")]
    pub history_messages: usize,
}

fn default_chat_api_url() -> String {
    "https://api.fluxpointstudios.com/chat".to_string()
}

fn default_chat_session_id() -> String {
    "helpdesk".to_string()
}

fn default_chat_timeout() -> u64 {
    60
}

fn default_history_messages() -> usize {
    5
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: default_chat_api_url(),
            api_key: None,
            session_id: default_chat_session_id(),
            timeout_seconds: default_chat_timeout(),
            history_messages: default_history_messages(),
        }
    }
}

/// Job polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound on the delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Timeout for availability probes, in seconds
    #[serde(default = "default_availability_timeout")]
    pub availability_timeout_seconds: u64,
}

fn default_max_attempts() -> u32 {
    30
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_availability_timeout() -> u64 {
    10
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
            availability_timeout_seconds: default_availability_timeout(),
        }
    }
}

impl PollingConfig {
    pub fn availability_timeout(&self) -> Duration {
        Duration::from_secs(self.availability_timeout_seconds)
    }
}

/// Sentiment simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    #[serde(default)]
    pub scenario: Scenario,

    /// Emission interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Trailing window for the aggregate, in minutes
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_window_minutes() -> u32 {
    5
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            interval_ms: default_interval_ms(),
            window_minutes: default_window_minutes(),
        }
    }
}

/// Support portal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    /// Service level of the first session
    #[serde(default)]
    pub service_level: ServiceLevel,

    /// Default number of sessions in the history view
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Answer with canned replies instead of calling the chat API
    #[serde(default)]
    pub offline: bool,
}

fn default_history_limit() -> usize {
    10
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            service_level: ServiceLevel::default(),
            history_limit: default_history_limit(),
            offline: false,
        }
    }
}

/// Agent-service endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentServiceConfig {
    /// Price advertised by `/availability`, in lovelace
    #[serde(default = "default_agent_price")]
    pub price_lovelace: String,
}

fn default_agent_price() -> String {
    "1000000".to_string()
}

impl Default for AgentServiceConfig {
    fn default() -> Self {
        Self {
            price_lovelace: default_agent_price(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,

    /// Also append logs to this file
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "helpdesk=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| HelpdeskError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| HelpdeskError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("HELPDESK_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("HELPDESK_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid HELPDESK_PORT: {}", port);
            }
        }

        if let Ok(url) = std::env::var("HELPDESK_REGISTRY_URL") {
            self.registry.url = url;
        }

        if let Ok(token) = std::env::var("HELPDESK_REGISTRY_TOKEN") {
            self.registry.token = token;
        }

        if let Ok(network) = std::env::var("HELPDESK_NETWORK") {
            self.registry.network = network;
        }

        if let Ok(url) = std::env::var("HELPDESK_CHAT_API_URL") {
            self.chat.api_url = url;
        }

        if let Ok(key) = std::env::var("HELPDESK_CHAT_API_KEY") {
            if !key.trim().is_empty() {
                self.chat.api_key = Some(key);
            }
        }

        if let Ok(attempts) = std::env::var("HELPDESK_POLL_MAX_ATTEMPTS") {
            if let Ok(value) = attempts.parse() {
                self.polling.max_attempts = value;
            } else {
                tracing::warn!("Invalid HELPDESK_POLL_MAX_ATTEMPTS: {}", attempts);
            }
        }

        if let Ok(delay) = std::env::var("HELPDESK_POLL_INITIAL_DELAY_MS") {
            if let Ok(value) = delay.parse() {
                self.polling.initial_delay_ms = value;
            } else {
                tracing::warn!("Invalid HELPDESK_POLL_INITIAL_DELAY_MS: {}", delay);
            }
        }

        if let Ok(scenario) = std::env::var("HELPDESK_SCENARIO") {
            match scenario.parse() {
                Ok(value) => self.sentiment.scenario = value,
                Err(e) => tracing::warn!("Invalid HELPDESK_SCENARIO: {}", e),
            }
        }

        if let Ok(level) = std::env::var("HELPDESK_SERVICE_LEVEL") {
            match level.parse() {
                Ok(value) => self.support.service_level = value,
                Err(e) => tracing::warn!("Invalid HELPDESK_SERVICE_LEVEL: {}", e),
            }
        }

        if let Ok(offline) = std::env::var("HELPDESK_OFFLINE") {
            let v = offline.to_lowercase();
            self.support.offline = v == "true" || v == "1";
        }

        if let Ok(price) = std::env::var("HELPDESK_AGENT_PRICE") {
            self.agent.price_lovelace = price;
        }

        if let Ok(level) = std::env::var("HELPDESK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json_logs) = std::env::var("HELPDESK_JSON_LOGS") {
            let v = json_logs.to_lowercase();
            self.logging.json_format = v == "true" || v == "1";
        }

        if let Ok(log_file) = std::env::var("HELPDESK_LOG_FILE") {
            self.logging.file_path = Some(PathBuf::from(log_file));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            self.logging.level = "helpdesk=debug".to_string();
        }
        if cli.json_logs {
            self.logging.json_format = true;
        }
        match &cli.command {
            Commands::Serve { host, port } => {
                if let Some(host) = host {
                    self.server.host = host.clone();
                }
                if let Some(port) = port {
                    self.server.port = *port;
                }
            }
            Commands::Support { level, offline } => {
                if let Some(level) = level {
                    self.support.service_level = *level;
                }
                if *offline {
                    self.support.offline = true;
                }
            }
            _ => {}
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Config`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(HelpdeskError::Config("server.host cannot be empty".to_string()).into());
        }

        for (name, value) in [
            ("registry.url", &self.registry.url),
            ("chat.api_url", &self.chat.api_url),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(HelpdeskError::Config(format!(
                    "{} is not a valid URL ({}): {}",
                    name, value, e
                ))
                .into());
            }
        }

        if self.registry.network.trim().is_empty() {
            return Err(
                HelpdeskError::Config("registry.network cannot be empty".to_string()).into(),
            );
        }

        if self.registry.discovery_limit == 0 {
            return Err(HelpdeskError::Config(
                "registry.discovery_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if self.registry.timeout_seconds == 0 || self.chat.timeout_seconds == 0 {
            return Err(
                HelpdeskError::Config("timeouts must be greater than 0".to_string()).into(),
            );
        }

        if self.polling.max_attempts == 0 {
            return Err(HelpdeskError::Config(
                "polling.max_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        if self.polling.backoff_factor < 1.0 || !self.polling.backoff_factor.is_finite() {
            return Err(HelpdeskError::Config(
                "polling.backoff_factor must be a finite value >= 1.0".to_string(),
            )
            .into());
        }

        if self.polling.max_delay_ms < self.polling.initial_delay_ms {
            return Err(HelpdeskError::Config(
                "polling.max_delay_ms must be >= polling.initial_delay_ms".to_string(),
            )
            .into());
        }

        if self.sentiment.interval_ms == 0 {
            return Err(HelpdeskError::Config(
                "sentiment.interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.sentiment.window_minutes == 0 {
            return Err(HelpdeskError::Config(
                "sentiment.window_minutes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.price_lovelace.parse::<u64>().is_err() {
            return Err(HelpdeskError::Config(format!(
                "agent.price_lovelace must be an integer amount: {}",
                self.agent.price_lovelace
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli() -> Cli {
        Cli {
            config: None,
            verbose: false,
            json_logs: false,
            command: Commands::Demo { count: 10 },
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.registry.network, "Preprod");
        assert_eq!(config.polling.max_attempts, 30);
        assert_eq!(config.polling.initial_delay_ms, 2000);
        assert_eq!(config.sentiment.interval_ms, 2000);
        assert_eq!(config.sentiment.window_minutes, 5);
        assert_eq!(config.support.history_limit, 10);
        assert_eq!(config.agent.price_lovelace, "1000000");
        assert!(config.chat.api_key.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = Config::default();
        config.registry.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_attempts() {
        let mut config = Config::default();
        config.polling.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_backoff_below_one() {
        let mut config = Config::default();
        config.polling.backoff_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_price_not_numeric() {
        let mut config = Config::default();
        config.agent.price_lovelace = "one ada".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HelpdeskError>(),
            Some(HelpdeskError::Config(_))
        ));
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
server:
  port: 9090
registry:
  network: Mainnet
chat:
  api_key: secret
polling:
  max_attempts: 5
  backoff_factor: 1.5
sentiment:
  scenario: veryNegative
support:
  service_level: premium
  offline: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.registry.network, "Mainnet");
        assert_eq!(config.chat.api_key.as_deref(), Some("secret"));
        assert_eq!(config.polling.max_attempts, 5);
        assert_eq!(config.sentiment.scenario, Scenario::VeryNegative);
        assert_eq!(config.support.service_level, ServiceLevel::Premium);
        assert!(config.support.offline);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &cli()).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 7001").unwrap();
        let config = Config::load(file.path().to_str().unwrap(), &cli()).unwrap();
        assert_eq!(config.server.port, 7001);
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server: [unclosed").unwrap();
        assert!(Config::load(file.path().to_str().unwrap(), &cli()).is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("HELPDESK_PORT", "8123");
        std::env::set_var("HELPDESK_CHAT_API_KEY", "from-env");
        std::env::set_var("HELPDESK_SERVICE_LEVEL", "enterprise");
        std::env::set_var("HELPDESK_SCENARIO", "positive");

        let config = Config::load("nonexistent.yaml", &cli()).unwrap();

        std::env::remove_var("HELPDESK_PORT");
        std::env::remove_var("HELPDESK_CHAT_API_KEY");
        std::env::remove_var("HELPDESK_SERVICE_LEVEL");
        std::env::remove_var("HELPDESK_SCENARIO");

        assert_eq!(config.server.port, 8123);
        assert_eq!(config.chat.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.support.service_level, ServiceLevel::Enterprise);
        assert_eq!(config.sentiment.scenario, Scenario::Positive);
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_ignored() {
        std::env::set_var("HELPDESK_PORT", "not-a-port");
        let config = Config::load("nonexistent.yaml", &cli()).unwrap();
        std::env::remove_var("HELPDESK_PORT");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    #[serial]
    fn test_verbose_flag_raises_log_level() {
        let mut args = cli();
        args.verbose = true;
        let config = Config::load("nonexistent.yaml", &args).unwrap();
        assert_eq!(config.logging.level, "helpdesk=debug");
    }
    #[test]
    #[serial]
    fn test_serve_flags_override_server() {
        let mut args = cli();
        args.command = Commands::Serve {
            host: Some("0.0.0.0".to_string()),
            port: Some(9100),
        };
        let config = Config::load("nonexistent.yaml", &args).unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:9100");
    }

    #[test]
    #[serial]
    fn test_support_flags_override_support() {
        let mut args = cli();
        args.command = Commands::Support {
            level: Some(ServiceLevel::Enterprise),
            offline: true,
        };
        let config = Config::load("nonexistent.yaml", &args).unwrap();
        assert_eq!(config.support.service_level, ServiceLevel::Enterprise);
        assert!(config.support.offline);
    }
}
