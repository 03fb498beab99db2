//! Support sessions
//!
//! Sessions, messages and ratings live in a [`SessionStore`]. The
//! [`SupportDesk`] runs conversations against a store and a chat backend.

pub mod desk;
pub mod store;
pub mod types;

pub use desk::{Exchange, SupportDesk};
pub use store::{InMemorySessionStore, SessionStore, DEFAULT_HISTORY_LIMIT};
pub use types::{compute_overall_sentiment, ChatMessage, ChatSession, MessageKind, GREETING};
