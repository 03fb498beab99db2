//! HelpDesk - AI support desk back end
//!
//! Main entry point for the `helpdesk` binary.

use anyhow::Result;
use std::time::Duration;

use helpdesk::cli::{AgentsCommand, Cli, Commands};
use helpdesk::commands;
use helpdesk::config::{Config, DEFAULT_CONFIG_PATH};
use helpdesk::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;

    init_logging(&config.logging)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            commands::serve::run_serve(config).await?;
        }
        Commands::Agents { command } => {
            tracing::info!("Starting agent command");
            match command {
                AgentsCommand::List {
                    search,
                    support_only,
                    page,
                    limit,
                    json,
                } => {
                    commands::agents::list_agents(
                        &config,
                        search.as_deref(),
                        support_only,
                        page,
                        limit,
                        json,
                    )
                    .await?;
                }
                AgentsCommand::Show { identifier, json } => {
                    commands::agents::show_agent(&config, &identifier, json).await?;
                }
                AgentsCommand::Test { limit } => {
                    commands::agents::test_agents(&config, limit).await?;
                }
                AgentsCommand::Query { agent, query } => {
                    commands::agents::query(&config, agent.as_deref(), &query).await?;
                }
            }
        }
        Commands::Simulate {
            scenario,
            interval_ms,
            duration_secs,
            batch,
        } => {
            commands::simulate::run_simulate(
                &config,
                scenario,
                interval_ms,
                Duration::from_secs(duration_secs),
                batch,
            )
            .await?;
        }
        Commands::Demo { count } => {
            commands::simulate::run_demo(count)?;
        }
        Commands::Support { .. } => {
            commands::support::run_support(config).await?;
        }
        Commands::Suggest { business, field } => {
            commands::suggest::run_suggest(&config, &business, field).await?;
        }
    }

    Ok(())
}
