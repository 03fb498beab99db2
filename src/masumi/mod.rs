//! Agent discovery and the agent job workflow
//!
//! - `registry`: listing and looking up agents in the registry
//! - `filter`: client-side filtering, pagination and price display
//! - `service`: one agent's availability/schema/job endpoints
//! - `poller`: cancellable status polling with backoff
//! - `workflow`: query an agent end to end; probe many agents

pub mod filter;
pub mod poller;
pub mod registry;
pub mod service;
pub mod types;
pub mod workflow;

pub use filter::{price_display, AgentFilter, Paginator, PAGE_SIZE};
pub use poller::{poll_job, spawn_poll, PollHandle, PollPolicy};
pub use registry::{RegistryClient, SUPPORT_KEYWORDS};
pub use service::{AgentServiceClient, JobStatusSource};
pub use types::{
    AgentStatus, InputSchema, JobState, JobStatusResponse, RegistryAgent, StartJobResponse,
};
pub use workflow::{best_working_agent, probe_agents, query_agent, AgentProbe, PROBE_STAGGER};
