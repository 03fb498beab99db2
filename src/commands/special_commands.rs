//! Slash commands for the interactive support chat
//!
//! Anything that does not start with `/` (other than `exit`/`quit`) is a
//! message for the support agent. Commands are case-insensitive.

use crate::sentiment::{Rating, ServiceLevel};
use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Commands handled by the chat loop itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Rate the n-th message (1-based, as listed by `/messages`)
    Rate { index: usize, rating: Rating },
    /// List messages of the active session with their numbers
    Messages,
    /// Close the session and start a new one
    Close,
    /// Show closed sessions
    History,
    /// Change the service level of the active session
    Level(ServiceLevel),
    /// Show the sentiment aggregate
    Sentiment,
    Help,
    Exit,
    /// Not a command; send the text as a message
    None,
}

/// Parse one line of input
///
/// # Examples
///
/// ```
/// use helpdesk::commands::special_commands::{parse_special_command, SpecialCommand};
/// use helpdesk::sentiment::Rating;
///
/// assert_eq!(
///     parse_special_command("/rate 2 up").unwrap(),
///     SpecialCommand::Rate { index: 2, rating: Rating::Up }
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = lower.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match command {
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/messages" | "/msgs" => Ok(SpecialCommand::Messages),
        "/close" => Ok(SpecialCommand::Close),
        "/history" => Ok(SpecialCommand::History),
        "/sentiment" => Ok(SpecialCommand::Sentiment),
        "/level" => parse_level(&args),
        "/rate" => parse_rate(&args),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

fn parse_level(args: &[&str]) -> Result<SpecialCommand, CommandError> {
    let arg = args.first().ok_or_else(|| CommandError::MissingArgument {
        command: "/level".to_string(),
        usage: "/level <basic|premium|enterprise>".to_string(),
    })?;
    arg.parse::<ServiceLevel>()
        .map(SpecialCommand::Level)
        .map_err(|_| CommandError::UnsupportedArgument {
            command: "/level".to_string(),
            arg: arg.to_string(),
        })
}

fn parse_rate(args: &[&str]) -> Result<SpecialCommand, CommandError> {
    let usage = || CommandError::MissingArgument {
        command: "/rate".to_string(),
        usage: "/rate <message number> <up|down|neutral>".to_string(),
    };
    let (index, rating) = match args {
        [index, rating] => (*index, *rating),
        _ => return Err(usage()),
    };

    let index = index
        .parse::<usize>()
        .ok()
        .filter(|i| *i > 0)
        .ok_or_else(|| CommandError::UnsupportedArgument {
            command: "/rate".to_string(),
            arg: index.to_string(),
        })?;
    let rating = rating
        .parse::<Rating>()
        .map_err(|_| CommandError::UnsupportedArgument {
            command: "/rate".to_string(),
            arg: rating.to_string(),
        })?;

    Ok(SpecialCommand::Rate { index, rating })
}

/// Print the command reference
pub fn print_help() {
    println!("{}", "Support chat commands".bold());
    println!("  /messages                  List messages with their numbers");
    println!("  /rate <n> <up|down|neutral> Rate message n");
    println!("  /level <basic|premium|enterprise>");
    println!("                             Change the service level");
    println!("  /sentiment                 Show the sentiment average and trend");
    println!("  /close                     Close this session and start a new one");
    println!("  /history                   Show closed sessions");
    println!("  /help                      Show this help");
    println!("  exit | quit                Leave the chat");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("my order is late").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "QUIT", "/exit", " /quit "] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(
            parse_special_command("/rate 3 down").unwrap(),
            SpecialCommand::Rate {
                index: 3,
                rating: Rating::Down
            }
        );
        assert_eq!(
            parse_special_command("/RATE 1 Neutral").unwrap(),
            SpecialCommand::Rate {
                index: 1,
                rating: Rating::Neutral
            }
        );
    }

    #[test]
    fn test_parse_rate_errors() {
        assert!(matches!(
            parse_special_command("/rate"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/rate 0 up"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/rate 2 sideways"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(
            parse_special_command("/level enterprise").unwrap(),
            SpecialCommand::Level(ServiceLevel::Enterprise)
        );
        assert!(matches!(
            parse_special_command("/level"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_special_command("/level gold"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_special_command("/dance").unwrap_err(),
            CommandError::UnknownCommand("/dance".to_string())
        );
    }
}
