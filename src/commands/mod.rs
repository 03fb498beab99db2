//! Command handlers for the CLI
//!
//! - `agents`: registry listing, details, probing and queries
//! - `simulate`: the sentiment simulator and the service-level demo
//! - `support`: the interactive support chat
//! - `suggest`: agent profile suggestions
//! - `serve`: the HTTP service

pub mod agents;
pub mod serve;
pub mod simulate;
pub mod special_commands;
pub mod suggest;
pub mod support;
