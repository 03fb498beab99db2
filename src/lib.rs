//! HelpDesk - AI support desk back end
//!
//! This library provides the support-session model, sentiment tracking, the
//! agent registry and job clients, the chat-completion client and the HTTP
//! service behind the `helpdesk` binary.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `sentiment`: scenarios, generation, aggregation and the simulator
//! - `session`: chat sessions, the session store and the support desk
//! - `chat`: chat-completion backends and agent profile suggestions
//! - `masumi`: agent discovery, agent service calls and job polling
//! - `server`: the axum HTTP service
//! - `config`: configuration management and validation
//! - `logging`: tracing subscriber setup
//! - `error`: error types and result aliases
//! - `cli` / `commands`: command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use helpdesk::chat::CannedBackend;
//! use helpdesk::sentiment::ServiceLevel;
//! use helpdesk::session::{InMemorySessionStore, SupportDesk};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(InMemorySessionStore::new(ServiceLevel::Premium));
//!     let desk = SupportDesk::new(store, Arc::new(CannedBackend::new()), 5);
//!
//!     let exchange = desk.send_message("My invoice looks wrong").await?;
//!     println!("{}", exchange.bot_message.content);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod masumi;
pub mod sentiment;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{HelpdeskError, Result};
pub use session::{SessionStore, SupportDesk};
