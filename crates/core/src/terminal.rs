use aussie_os_events::{EventBus, Subscription, SystemEvent};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    AiThought,
    ToolCall,
    Output,
    Command,
    Error,
    System,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::AiThought => "ai-thought",
            BlockKind::ToolCall => "tool-call",
            BlockKind::Output => "output",
            BlockKind::Command => "command",
            BlockKind::Error => "error",
            BlockKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerminalBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub content: String,
    pub timestamp: i64,
    /// Tool arguments for `tool-call` blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

type Blocks = Arc<Mutex<Vec<TerminalBlock>>>;

fn push(blocks: &Blocks, kind: BlockKind, content: &str, metadata: Option<Value>) {
    blocks.lock().push(TerminalBlock {
        id: uuid::Uuid::new_v4().simple().to_string()[..9].to_string(),
        kind,
        content: content.to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        metadata,
    });
}

/// Scrollback of what the agent and the shell did, built from bus events.
pub struct TerminalLog {
    blocks: Blocks,
    subscription: Option<Subscription>,
}

impl TerminalLog {
    pub fn attach(bus: &EventBus) -> Self {
        let blocks: Blocks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&blocks);
        let subscription = bus.subscribe(move |event| match event {
            SystemEvent::AgentThought { text } => push(&sink, BlockKind::AiThought, text, None),
            SystemEvent::ToolExecution { name, args } => {
                push(&sink, BlockKind::ToolCall, name, Some(args.clone()))
            }
            SystemEvent::ShellOutput(output) if !output.is_empty() => {
                push(&sink, BlockKind::Output, output, None)
            }
            _ => {}
        });
        Self {
            blocks,
            subscription: Some(subscription),
        }
    }

    /// A command typed directly into the shell.
    pub fn command(&self, line: &str) {
        push(&self.blocks, BlockKind::Command, line, None);
    }

    pub fn error(&self, text: &str) {
        push(&self.blocks, BlockKind::Error, text, None);
    }

    /// A kernel notice such as a permission change.
    pub fn system(&self, text: &str) {
        push(&self.blocks, BlockKind::System, text, None);
    }

    pub fn blocks(&self) -> Vec<TerminalBlock> {
        self.blocks.lock().clone()
    }

    pub fn clear(&self) {
        self.blocks.lock().clear();
    }

    /// Stop following the bus; recorded blocks stay.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl Drop for TerminalLog {
    fn drop(&mut self) {
        self.detach();
    }
}
