//! Interactive support chat
//!
//! Runs a readline loop over a [`SupportDesk`]: plain text goes to the chat
//! backend, slash commands rate messages, switch tiers and close sessions.

use super::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::config::Config;
use crate::error::Result;
use crate::sentiment::Rating;
use crate::server::chat_backend;
use crate::session::{ChatMessage, ChatSession, InMemorySessionStore, MessageKind, SupportDesk};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

/// Start the interactive support chat
///
/// # Errors
///
/// Returns error if the terminal or the session store fails
pub async fn run_support(config: Config) -> Result<()> {
    tracing::info!("Starting interactive support chat");

    let store = Arc::new(InMemorySessionStore::new(config.support.service_level));
    let desk = SupportDesk::new(store, chat_backend(&config)?, config.chat.history_messages);
    let history_limit = config.support.history_limit;
    let window = config.sentiment.window_minutes;

    let mut rl = DefaultEditor::new()?;
    print_welcome_banner(&desk.active_session()?);

    loop {
        let level = desk.active_session()?.service_level;
        let prompt = format!("[{}] >> ", level.to_string().to_uppercase());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Type 'exit' to leave.");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                return Err(e.into());
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        rl.add_history_entry(trimmed)?;

        let command = match parse_special_command(trimmed) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.to_string().yellow());
                continue;
            }
        };

        match command {
            SpecialCommand::Exit => break,
            SpecialCommand::Help => print_help(),
            SpecialCommand::Messages => print_messages(&desk.active_session()?),
            SpecialCommand::Rate { index, rating } => {
                let session = desk.active_session()?;
                match session.messages.get(index - 1) {
                    Some(message) => match desk.rate_message(&message.id, rating) {
                        Ok(_) => println!("Rated message {} {}", index, rating_badge(rating)),
                        Err(e) => println!("{}", format!("Rating failed: {:#}", e).red()),
                    },
                    None => println!(
                        "{}",
                        format!(
                            "No message {}; the session has {} messages",
                            index,
                            session.messages.len()
                        )
                        .yellow()
                    ),
                }
            }
            SpecialCommand::Level(level) => {
                desk.set_service_level(level)?;
                println!("Service level set to {}", level.to_string().bold());
            }
            SpecialCommand::Sentiment => {
                let aggregate = desk.aggregate(window)?;
                println!(
                    "Sentiment over the last {} minutes: {:.2} ({}, {} samples)\n",
                    window, aggregate.average, aggregate.trend, aggregate.samples
                );
            }
            SpecialCommand::Close => {
                let (closed, active) = desk.close_session()?;
                println!(
                    "Session closed with overall sentiment {:.2} ({} rated messages)",
                    closed.overall_sentiment,
                    closed.rated_count()
                );
                print_welcome_banner(&active);
            }
            SpecialCommand::History => print_history(&desk.history(history_limit)?),
            SpecialCommand::None => {
                let exchange = desk.send_message(trimmed).await?;
                print_message(&exchange.bot_message, None);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_welcome_banner(session: &ChatSession) {
    println!();
    println!(
        "{} {}",
        "HelpDesk support chat".bold().cyan(),
        format!("[{}]", session.service_level).dimmed()
    );
    println!("Type '/help' for commands, 'exit' to leave.\n");
    if let Some(greeting) = session.messages.first() {
        print_message(greeting, None);
    }
}

fn print_message(message: &ChatMessage, index: Option<usize>) {
    let who = match message.kind {
        MessageKind::User => "You".green().bold(),
        MessageKind::Bot => "Agent".cyan().bold(),
    };
    let number = index.map(|i| format!("{:>3}. ", i)).unwrap_or_default();
    let rating = message.sentiment.map(rating_badge).unwrap_or_default();
    println!("{}{}: {} {}\n", number, who, message.content, rating);
}

fn print_messages(session: &ChatSession) {
    for (i, message) in session.messages.iter().enumerate() {
        print_message(message, Some(i + 1));
    }
}

fn print_history(sessions: &[ChatSession]) {
    if sessions.is_empty() {
        println!("No closed sessions yet.\n");
        return;
    }
    for session in sessions {
        let ended = session
            .end_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{}  {:<10} {:>3} messages  sentiment {:.2}",
            ended,
            session.service_level.to_string(),
            session.messages.len(),
            session.overall_sentiment
        );
    }
    println!();
}

fn rating_badge(rating: Rating) -> String {
    match rating {
        Rating::Up => "(+1)".green().to_string(),
        Rating::Down => "(-1)".red().to_string(),
        Rating::Neutral => "(0)".dimmed().to_string(),
    }
}
