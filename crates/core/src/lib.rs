//! The agent kernel: a bounded think-act-observe loop over a chat session,
//! dispatching the model's function calls through the tool registry.

pub mod metrics;
pub mod orchestrator;
pub mod phase;
pub mod terminal;
pub mod types;

use aussie_os_policy::PolicyError;
use thiserror::Error;

pub use metrics::{Metrics, MetricsSnapshot};
pub use orchestrator::AgentOrchestrator;
pub use phase::WorkflowPhase;
pub use terminal::{BlockKind, TerminalBlock, TerminalLog};
pub use types::{AgentStatus, Message, MessageRole, TurnOutcome};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid agent profile: {0}")]
    Profile(#[from] PolicyError),
    #[error("Profile allows unknown tool: {0}")]
    UnknownTool(String),
}
