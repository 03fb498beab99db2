//! Agent discovery commands
//!
//! Listing, details, availability probing and one-shot queries against
//! agents on the registry.

use crate::config::Config;
use crate::error::{HelpdeskError, Result};
use crate::masumi::{
    best_working_agent, price_display, probe_agents, query_agent, AgentFilter, AgentProbe,
    Paginator, PollPolicy, RegistryAgent, RegistryClient, PAGE_SIZE, PROBE_STAGGER,
};
use colored::Colorize;
use prettytable::{row, Table};
use tokio_util::sync::CancellationToken;

/// List online agents, filtered and paginated
///
/// # Examples
///
/// ```no_run
/// use helpdesk::commands::agents::list_agents;
/// use helpdesk::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// list_agents(&Config::default(), Some("faq"), true, 1, None, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_agents(
    config: &Config,
    search: Option<&str>,
    support_only: bool,
    page: usize,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let client = RegistryClient::new(&config.registry)?;
    let limit = limit
        .map(|l| l as u32)
        .unwrap_or(config.registry.discovery_limit);
    let agents = client.discover_agents(limit).await?;

    let filter = AgentFilter {
        search: search.map(str::to_string),
        support_only,
    };
    let filtered = filter.apply(&agents);

    let mut pager = Paginator::new(filtered.len(), PAGE_SIZE);
    pager.go_to(page);
    let visible = pager.current_page(&filtered);

    if json {
        println!("{}", serde_json::to_string_pretty(visible)?);
        return Ok(());
    }

    if filtered.is_empty() {
        println!("No agents match the current filter.");
        return Ok(());
    }

    output_agents_table(visible);
    println!(
        "Page {} of {} ({} agents, {} discovered)\n",
        pager.current(),
        pager.total_pages(),
        filtered.len(),
        agents.len()
    );
    Ok(())
}

/// Show details of one agent
pub async fn show_agent(config: &Config, identifier: &str, json: bool) -> Result<()> {
    let client = RegistryClient::new(&config.registry)?;
    let agent = client
        .agent_details(identifier)
        .await?
        .ok_or_else(|| HelpdeskError::InvalidInput(format!("Agent not found: {}", identifier)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agent)?);
        return Ok(());
    }

    println!("\n{}", agent.name.bold());
    println!("  Identifier:  {}", agent.agent_identifier);
    println!("  Status:      {}", status_label(&agent));
    println!("  Capability:  {}", agent.capability_name());
    println!("  Price:       {}", price_display(&agent));
    println!("  API:         {}", agent.api_base_url);
    if let Some(author) = &agent.author_name {
        println!("  Author:      {}", author);
    }
    if !agent.tags.is_empty() {
        println!("  Tags:        {}", agent.tags.join(", "));
    }
    if !agent.description.is_empty() {
        println!("\n{}", agent.description);
    }
    println!();
    Ok(())
}

/// Probe support agents and report which answer
pub async fn test_agents(config: &Config, limit: usize) -> Result<()> {
    let client = RegistryClient::new(&config.registry)?;
    let mut agents = client
        .find_support_agents(config.registry.discovery_limit)
        .await?;
    agents.truncate(limit);

    if agents.is_empty() {
        println!("No support agents found on {}.", config.registry.network);
        return Ok(());
    }

    println!("Probing {} agents...", agents.len());
    let results = probe_agents(
        agents,
        PROBE_STAGGER,
        config.polling.availability_timeout(),
    )
    .await;

    output_probe_table(&results);
    match best_working_agent(&results) {
        Some(best) => println!(
            "Best working agent: {} ({} ms)\n",
            best.agent.name.green().bold(),
            best.response_time.as_millis()
        ),
        None => println!("{}\n", "No agent answered its availability check.".red()),
    }
    Ok(())
}

/// Send a question to an agent and print the answer
///
/// Without an identifier, support agents are probed and the fastest working
/// one is used. Ctrl-C cancels polling.
pub async fn query(config: &Config, identifier: Option<&str>, text: &str) -> Result<()> {
    let client = RegistryClient::new(&config.registry)?;
    let agent = match identifier {
        Some(id) => client
            .agent_details(id)
            .await?
            .ok_or_else(|| HelpdeskError::InvalidInput(format!("Agent not found: {}", id)))?,
        None => pick_working_agent(config, &client).await?,
    };

    println!("Asking {}...", agent.name.bold());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let policy = PollPolicy::from(&config.polling);
    let answer = query_agent(
        &agent,
        text,
        &policy,
        config.polling.availability_timeout(),
        &cancel,
    )
    .await?;

    println!("\n{}\n", answer);
    Ok(())
}

async fn pick_working_agent(config: &Config, client: &RegistryClient) -> Result<RegistryAgent> {
    let agents = client
        .find_support_agents(config.registry.discovery_limit)
        .await?;
    let results = probe_agents(
        agents,
        PROBE_STAGGER,
        config.polling.availability_timeout(),
    )
    .await;

    best_working_agent(&results)
        .map(|probe| probe.agent.clone())
        .ok_or_else(|| {
            HelpdeskError::AgentUnavailable("no working support agent found".to_string()).into()
        })
}

fn status_label(agent: &RegistryAgent) -> String {
    if agent.is_online() {
        "Online".green().to_string()
    } else {
        "Offline".red().to_string()
    }
}

fn output_agents_table(agents: &[RegistryAgent]) {
    let mut table = Table::new();
    table.add_row(row!["Name", "Capability", "Price", "Status", "Identifier"]);

    for agent in agents {
        table.add_row(row![
            agent.name,
            agent.capability_name(),
            price_display(agent),
            status_label(agent),
            agent.agent_identifier
        ]);
    }

    println!();
    table.printstd();
}

fn output_probe_table(results: &[AgentProbe]) {
    let mut table = Table::new();
    table.add_row(row!["Name", "Available", "Response", "Error"]);

    for probe in results {
        let available = if probe.is_available {
            "yes".green().to_string()
        } else {
            "no".red().to_string()
        };
        table.add_row(row![
            probe.agent.name,
            available,
            format!("{} ms", probe.response_time.as_millis()),
            probe.error.as_deref().unwrap_or("")
        ]);
    }

    println!();
    table.printstd();
}
