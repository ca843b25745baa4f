use crate::traits::{str_arg, Tool, ToolContext, ToolError};
use aussie_os_policy::Capability;
use aussie_os_swarm::SwarmOrchestrator;
use aussie_os_tasks::{NewTask, Schedule, Scheduler, TaskType};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ScheduleTaskTool {
    scheduler: Arc<Scheduler>,
}

impl ScheduleTaskTool {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl Tool for ScheduleTaskTool {
    fn name(&self) -> &str {
        "schedule_task"
    }

    fn description(&self) -> &str {
        "Schedule an automated task. Without an interval it runs once."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "action": { "type": "string", "description": "Shell command or swarm objective" },
                "type": { "type": "string", "enum": ["command", "swarm"] },
                "interval": { "type": "integer", "description": "Repeat every N seconds" }
            },
            "required": ["name", "action", "type"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::FsWrite
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let task_type = match str_arg(&args, "type")? {
            "swarm" => TaskType::Swarm,
            _ => TaskType::Command,
        };
        // Out-of-range periods are rejected by the scheduler.
        let interval = args["interval"]
            .as_u64()
            .or_else(|| args["interval"].as_f64().map(|s| s.max(0.0) as u64));

        let task = self.scheduler.add(NewTask {
            name: str_arg(&args, "name")?.to_string(),
            task_type,
            action: str_arg(&args, "action")?.to_string(),
            schedule: if interval.is_some() {
                Schedule::Interval
            } else {
                Schedule::Once
            },
            interval_seconds: interval,
        })?;
        Ok(json!({ "status": "scheduled", "taskId": task.id }))
    }
}

pub struct SwarmExecuteTool {
    swarm: Arc<SwarmOrchestrator>,
}

impl SwarmExecuteTool {
    pub fn new(swarm: Arc<SwarmOrchestrator>) -> Self {
        Self { swarm }
    }
}

#[async_trait]
impl Tool for SwarmExecuteTool {
    fn name(&self) -> &str {
        "swarm_execute"
    }

    fn description(&self) -> &str {
        "Run a task on a swarm of independent agents and report whether they reached consensus."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": { "type": "string" },
                "enhanced": { "type": "boolean", "description": "Use five agents instead of three" }
            },
            "required": ["task"]
        })
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let mut config = self.swarm.config().clone();
        if let Some(enhanced) = args["enhanced"].as_bool() {
            config.enhanced = enhanced;
        }
        let report = self
            .swarm
            .execute_with(str_arg(&args, "task")?, &config)
            .await?;
        serde_json::to_value(report).map_err(|e| ToolError::Execution(e.to_string()))
    }
}
