//! Session state, model registry and analysis run orchestration.

pub mod orchestrator;
pub mod registry;
pub mod state;

pub use orchestrator::Orchestrator;
pub use registry::ModelRegistry;
pub use state::{RunKey, RunOutcome, RunSession, RunStatus, RunTicket, Session};
