//! Logging setup
//!
//! Human-readable or JSON output on stderr, optionally mirrored to a file.
//! `RUST_LOG` takes precedence over the configured filter.

use crate::config::LoggingConfig;
use crate::error::Result;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber from configuration
///
/// # Errors
///
/// Returns error if the filter is invalid, the log file cannot be opened or
/// a global subscriber is already installed
///
/// # Examples
///
/// ```no_run
/// use helpdesk::config::LoggingConfig;
/// use helpdesk::logging::init_logging;
///
/// let config = LoggingConfig {
///     level: "helpdesk=debug".to_string(),
///     json_format: true,
///     file_path: None,
/// };
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let file = match &config.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    if config.json_format {
        let stderr_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);
        let file_layer = file.map(|f| fmt::layer().json().with_current_span(true).with_writer(f));
        registry.with(stderr_layer).with(file_layer).try_init()?;
    } else {
        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);
        let file_layer = file.map(|f| {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(f)
        });
        registry.with(stderr_layer).with(file_layer).try_init()?;
    }

    Ok(())
}

/// `RUST_LOG` if set, otherwise `level`
fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_build_filter_from_level() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter("helpdesk=debug").unwrap();
        assert!(filter.to_string().contains("helpdesk=debug"));
    }

    #[test]
    #[serial]
    fn test_build_filter_rejects_garbage() {
        std::env::remove_var("RUST_LOG");
        assert!(build_filter("helpdesk=notalevel").is_err());
    }

    #[test]
    #[serial]
    fn test_rust_log_takes_precedence() {
        std::env::set_var("RUST_LOG", "warn");
        let filter = build_filter("helpdesk=debug").unwrap();
        std::env::remove_var("RUST_LOG");
        assert_eq!(filter.to_string(), "warn");
    }
}
