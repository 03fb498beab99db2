//! Sentiment simulator and service-level demo commands

use crate::config::Config;
use crate::error::Result;
use crate::sentiment::analysis::{calculate_stats, service_level_comparison, DemoStats};
use crate::sentiment::{
    calculate_aggregate, generate_batch, Scenario, SentimentData, SentimentSimulator,
};
use colored::Colorize;
use prettytable::{row, Table};
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Stream simulated sentiment for `duration`, then print the aggregate
///
/// With `batch`, generates that many historical values at once instead and
/// prints their statistics.
pub async fn run_simulate(
    config: &Config,
    scenario: Option<Scenario>,
    interval_ms: Option<u64>,
    duration: Duration,
    batch: Option<usize>,
) -> Result<()> {
    let scenario = scenario.unwrap_or(config.sentiment.scenario);
    let window = config.sentiment.window_minutes;

    if let Some(count) = batch {
        let data = generate_batch(&mut rand::rng(), scenario, count, window);
        print_summary(scenario, &data, window);
        return Ok(());
    }

    let interval = Duration::from_millis(interval_ms.unwrap_or(config.sentiment.interval_ms));
    println!(
        "{} {} every {} ms for {} s (Ctrl-C to stop)\n",
        "Simulating".bold(),
        scenario.name(),
        interval.as_millis(),
        duration.as_secs()
    );

    let simulator = SentimentSimulator::new();
    let mut stream = BroadcastStream::new(simulator.subscribe());
    simulator.start(scenario, interval);

    let mut received = Vec::new();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            item = stream.next() => match item {
                Some(Ok(data)) => {
                    print_observation(&data);
                    received.push(data);
                }
                Some(Err(e)) => tracing::warn!("Simulator stream lagged: {}", e),
                None => break,
            },
        }
    }

    simulator.stop();
    print_summary(scenario, &received, window);
    Ok(())
}

/// Compare simulated sentiment across service levels
pub fn run_demo(count: usize) -> Result<()> {
    let comparison = service_level_comparison(&mut rand::rng(), count);

    let mut table = Table::new();
    table.add_row(row![
        "Service Level",
        "Average",
        "Min",
        "Max",
        "Positive %",
        "Neutral %",
        "Negative %"
    ]);
    for (level, stats) in &comparison {
        table.add_row(row![
            level.to_string(),
            format!("{:.2}", stats.average),
            format!("{:.2}", stats.min),
            format!("{:.2}", stats.max),
            stats.positive,
            stats.neutral,
            stats.negative
        ]);
    }

    println!("\nService level comparison ({} samples each):\n", count);
    table.printstd();
    println!();
    Ok(())
}

fn print_observation(data: &SentimentData) {
    let score = format!("{:.2}", data.score);
    let score = if data.score >= 0.7 {
        score.green()
    } else if data.score < 0.4 {
        score.red()
    } else {
        score.yellow()
    };
    println!(
        "{}  {}  {:<10} {}",
        data.timestamp.format("%H:%M:%S"),
        score,
        data.level.to_string(),
        data.label
    );
}

fn print_summary(scenario: Scenario, data: &[SentimentData], window_minutes: u32) {
    let scores: Vec<f64> = data.iter().map(|d| d.score).collect();
    let DemoStats {
        average,
        min,
        max,
        positive,
        neutral,
        negative,
    } = calculate_stats(&scores);
    let aggregate = calculate_aggregate(data, window_minutes);

    println!("\n{} ({})", scenario.name().bold(), scenario.description());
    println!("  Samples:   {}", data.len());
    println!("  Average:   {:.2} (min {:.2}, max {:.2})", average, min, max);
    println!(
        "  Mix:       {}% positive, {}% neutral, {}% negative",
        positive, neutral, negative
    );
    println!(
        "  Trend:     {} over the last {} minutes\n",
        aggregate.trend, window_minutes
    );
}
