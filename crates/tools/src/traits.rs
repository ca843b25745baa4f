use aussie_os_bots::BotError;
use aussie_os_policy::Capability;
use aussie_os_swarm::SwarmError;
use aussie_os_tasks::SchedulerError;
use aussie_os_vfs::VfsError;
use aussie_os_windows::WindowError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    Execution(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Tool {0} not found.")]
    NotFound(String),
    #[error("{0}")]
    Vfs(#[from] VfsError),
    #[error("{0}")]
    Window(#[from] WindowError),
    #[error("{0}")]
    Scheduler(#[from] SchedulerError),
    #[error("{0}")]
    Swarm(#[from] SwarmError),
    #[error("{0}")]
    Bot(#[from] BotError),
}

/// Outcome of one dispatch, as handed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub success: bool,
    pub output: Value,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(message),
        }
    }

    /// The function-response payload: the output, or `{"error": message}`.
    pub fn into_response(self) -> Value {
        match self.error {
            Some(message) => json!({ "error": message }),
            None => self.output,
        }
    }
}

/// Side effects a tool asks of the agent that invoked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEffect {
    /// Show text to the user as an assistant message.
    NotifyUser(String),
    /// End the current turn after this batch of calls.
    Idle,
}

#[derive(Debug, Default)]
pub struct ToolContext {
    effects: Vec<ToolEffect>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_user(&mut self, text: impl Into<String>) {
        self.effects.push(ToolEffect::NotifyUser(text.into()));
    }

    pub fn request_idle(&mut self) {
        self.effects.push(ToolEffect::Idle);
    }

    pub fn idle_requested(&self) -> bool {
        self.effects.contains(&ToolEffect::Idle)
    }

    pub fn effects(&self) -> &[ToolEffect] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<ToolEffect> {
        std::mem::take(&mut self.effects)
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments object.
    fn schema(&self) -> Value;

    /// What the tool touches; checked against the kernel permissions.
    fn capability(&self) -> Capability {
        Capability::None
    }

    async fn execute(&self, ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError>;
}

/// Pull a required string argument. The registry validates before
/// dispatch, so this only fails when a tool is called directly.
pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args[key]
        .as_str()
        .ok_or_else(|| ToolError::Validation(format!("Missing '{}' field", key)))
}

pub(crate) fn opt_str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}
