use crate::traits::{str_arg, Tool, ToolContext, ToolError};
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_storage::{KeyValueStore, MainView, UiState};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

pub struct MessageNotifyUserTool;

#[async_trait]
impl Tool for MessageNotifyUserTool {
    fn name(&self) -> &str {
        "message_notify_user"
    }

    fn description(&self) -> &str {
        "Send a text response or notification to the user chat."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Message to show"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        ctx.notify_user(str_arg(&args, "text")?);
        Ok(json!({ "status": "ok" }))
    }
}

pub struct SwitchViewTool {
    bus: EventBus,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl SwitchViewTool {
    pub fn new(bus: EventBus, store: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self { bus, store }
    }
}

#[async_trait]
impl Tool for SwitchViewTool {
    fn name(&self) -> &str {
        "switch_view"
    }

    fn description(&self) -> &str {
        "Switch the main workspace view."
    }

    fn schema(&self) -> Value {
        let views: Vec<&str> = MainView::ALL.iter().map(MainView::as_str).collect();
        json!({
            "type": "object",
            "properties": {
                "view": {
                    "type": "string",
                    "enum": views
                }
            },
            "required": ["view"]
        })
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let view: MainView = str_arg(&args, "view")?
            .parse()
            .map_err(ToolError::Validation)?;

        if let Some(store) = &self.store {
            if let Err(e) = UiState::record_view(store.as_ref(), view) {
                warn!("Failed to record last view: {}", e);
            }
        }
        self.bus.emit(SystemEvent::SwitchView {
            view: view.to_string(),
        });
        Ok(json!({ "status": "success" }))
    }
}

/// Explicit end of turn.
pub struct IdleTool;

#[async_trait]
impl Tool for IdleTool {
    fn name(&self) -> &str {
        "idle"
    }

    fn description(&self) -> &str {
        "Call when task is complete or waiting for user input."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &mut ToolContext, _args: Value) -> Result<Value, ToolError> {
        ctx.request_idle();
        Ok(json!({ "status": "idle" }))
    }
}
