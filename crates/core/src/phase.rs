use serde::{Deserialize, Serialize};
use std::fmt;

/// What the agent is doing right now. Every turn starts in `Planning`,
/// moves with the tools it dispatches and always ends back in `Idle`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPhase {
    #[default]
    Idle,
    Exploring,
    Planning,
    Coding,
    Verifying,
    Reviewing,
    Deploying,
    Error,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Exploring => "exploring",
            WorkflowPhase::Planning => "planning",
            WorkflowPhase::Coding => "coding",
            WorkflowPhase::Verifying => "verifying",
            WorkflowPhase::Reviewing => "reviewing",
            WorkflowPhase::Deploying => "deploying",
            WorkflowPhase::Error => "error",
        }
    }

    /// Phase entered when `tool` is dispatched. `None` leaves the phase alone.
    pub fn for_tool(tool: &str) -> Option<WorkflowPhase> {
        match tool {
            "file_read" | "file_list" | "browser_navigate" | "browser_scrape" => {
                Some(WorkflowPhase::Exploring)
            }
            "file_write" | "shell_exec" | "apm_install" | "create_bot_app" | "media_gen"
            | "schedule_task" | "swarm_execute" => Some(WorkflowPhase::Coding),
            "browser_click" | "browser_screenshot" => Some(WorkflowPhase::Verifying),
            "github_ops" => Some(WorkflowPhase::Reviewing),
            "deploy_app" => Some(WorkflowPhase::Deploying),
            _ => None,
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_phases() {
        assert_eq!(WorkflowPhase::for_tool("file_write"), Some(WorkflowPhase::Coding));
        assert_eq!(WorkflowPhase::for_tool("shell_exec"), Some(WorkflowPhase::Coding));
        assert_eq!(WorkflowPhase::for_tool("deploy_app"), Some(WorkflowPhase::Deploying));
        assert_eq!(WorkflowPhase::for_tool("github_ops"), Some(WorkflowPhase::Reviewing));
        assert_eq!(WorkflowPhase::for_tool("idle"), None);
        assert_eq!(WorkflowPhase::for_tool("message_notify_user"), None);
    }
}
