//! Agent profile suggestion command

use crate::chat::{generate_agent_config, regenerate_field, AgentSuggestions, SuggestionField};
use crate::config::Config;
use crate::error::Result;
use crate::server::chat_backend;
use colored::Colorize;

/// Print a suggested profile, or one regenerated field
pub async fn run_suggest(
    config: &Config,
    business: &str,
    field: Option<SuggestionField>,
) -> Result<()> {
    let backend = chat_backend(config)?;
    let session_id = &config.chat.session_id;

    match field {
        Some(field) => {
            let value = regenerate_field(
                backend.as_ref(),
                field,
                business,
                &AgentSuggestions::default(),
                session_id,
            )
            .await?;
            println!("{}: {}", field.to_string().bold(), value);
        }
        None => {
            let suggestions = generate_agent_config(backend.as_ref(), business, session_id).await?;
            println!("\n{} {}", "Name:".bold(), suggestions.name);
            println!("{} {}", "Bio:".bold(), suggestions.bio);
            println!("\n{}\n", suggestions.description);
        }
    }
    Ok(())
}
