//! Fan-out task execution with threshold voting.

pub mod config;
pub mod executor;
pub mod orchestrator;

pub use config::{SwarmConfig, Topology};
pub use executor::{PlanningExecutor, TaskExecutor};
pub use orchestrator::{SwarmOrchestrator, SwarmReport, SwarmStatus};

use aussie_os_providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("Invalid swarm configuration: {0}")]
    InvalidConfig(String),
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
