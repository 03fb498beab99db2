//! HTTP service command

use crate::config::Config;
use crate::error::Result;
use crate::server;

/// Run the HTTP service until Ctrl-C
pub async fn run_serve(config: Config) -> Result<()> {
    tracing::info!(
        registry = %config.registry.url,
        offline = config.support.offline,
        "Starting HelpDesk service"
    );
    server::serve(config).await
}
