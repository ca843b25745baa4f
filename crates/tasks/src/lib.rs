//! Timer-driven jobs that run shell commands or swarm objectives.

pub mod scheduler;
pub mod task;

pub use scheduler::{Scheduler, TASKS_FILE};
pub use task::{NewTask, MAX_INTERVAL_SECONDS, Schedule, ScheduledTask, TaskStatus, TaskType};

use aussie_os_vfs::VfsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Task not found: {0}")]
    NotFound(String),
    #[error("Invalid task: {0}")]
    InvalidTask(String),
    #[error("Filesystem error: {0}")]
    Vfs(#[from] VfsError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
