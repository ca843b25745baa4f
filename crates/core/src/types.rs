use crate::phase::WorkflowPhase;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
    System,
}

/// One entry of the conversation shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    /// Unix millis.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl Message {
    pub fn new(role: MessageRole, text: impl Into<String>, sender: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string()[..9].to_string(),
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            sender,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub is_processing: bool,
    pub phase: WorkflowPhase,
}

/// How a call to `process_input` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without calling tools.
    Completed { iterations: usize },
    /// The model called `idle`.
    Idle { iterations: usize },
    /// Runaway-loop guard tripped.
    IterationLimit,
    /// Rate limited; the same input will be sent again after `delay`.
    RetryScheduled { delay: Duration, attempt: u32 },
    /// Rate limited too many times in a row.
    GaveUp,
    Cancelled,
    Failed,
}
