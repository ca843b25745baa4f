use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient toast shown by observers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub timestamp: i64,
}

/// Everything that can travel over the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum SystemEvent {
    FileChange {
        path: String,
        change: FileChangeKind,
    },
    ShellOutput(String),
    BrowserNavigate {
        url: String,
    },
    BrowserAction {
        action: String,
        selector: Option<String>,
    },
    Notification(Notification),
    TaskRun {
        task_id: String,
        name: String,
    },
    TaskComplete {
        task_id: String,
        result: String,
    },
    AgentMessage {
        agent: String,
        text: String,
    },
    SwitchView {
        view: String,
    },
    OpenWindow {
        window_id: String,
        app_id: String,
    },
    AppInstalled {
        id: String,
        installed: bool,
    },
    AppCreated {
        id: String,
        name: String,
    },
    BotUpdate {
        app_id: Option<String>,
    },
    AgentStateUpdate {
        message_count: usize,
        is_processing: bool,
        phase: String,
    },
    AgentThought {
        text: String,
    },
    ToolExecution {
        name: String,
        args: serde_json::Value,
    },
    DeployUpdate {
        deployment_id: String,
        status: String,
        line: Option<String>,
    },
    PermissionsChanged,
}

/// Discriminant of [`SystemEvent`], used for typed registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    FileChange,
    ShellOutput,
    BrowserNavigate,
    BrowserAction,
    Notification,
    TaskRun,
    TaskComplete,
    AgentMessage,
    SwitchView,
    OpenWindow,
    AppInstalled,
    AppCreated,
    BotUpdate,
    AgentStateUpdate,
    AgentThought,
    ToolExecution,
    DeployUpdate,
    PermissionsChanged,
}

impl SystemEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SystemEvent::FileChange { .. } => EventKind::FileChange,
            SystemEvent::ShellOutput(_) => EventKind::ShellOutput,
            SystemEvent::BrowserNavigate { .. } => EventKind::BrowserNavigate,
            SystemEvent::BrowserAction { .. } => EventKind::BrowserAction,
            SystemEvent::Notification(_) => EventKind::Notification,
            SystemEvent::TaskRun { .. } => EventKind::TaskRun,
            SystemEvent::TaskComplete { .. } => EventKind::TaskComplete,
            SystemEvent::AgentMessage { .. } => EventKind::AgentMessage,
            SystemEvent::SwitchView { .. } => EventKind::SwitchView,
            SystemEvent::OpenWindow { .. } => EventKind::OpenWindow,
            SystemEvent::AppInstalled { .. } => EventKind::AppInstalled,
            SystemEvent::AppCreated { .. } => EventKind::AppCreated,
            SystemEvent::BotUpdate { .. } => EventKind::BotUpdate,
            SystemEvent::AgentStateUpdate { .. } => EventKind::AgentStateUpdate,
            SystemEvent::AgentThought { .. } => EventKind::AgentThought,
            SystemEvent::ToolExecution { .. } => EventKind::ToolExecution,
            SystemEvent::DeployUpdate { .. } => EventKind::DeployUpdate,
            SystemEvent::PermissionsChanged => EventKind::PermissionsChanged,
        }
    }
}
