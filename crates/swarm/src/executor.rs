use crate::SwarmError;
use aussie_os_providers::ChatProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// One swarm worker's attempt at a task. Workers share nothing; each call
/// is independent.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, agent_id: usize, task: &str) -> Result<String, SwarmError>;
}

const PLANNER_INSTRUCTION: &str = "\
You are one worker in a swarm of independent agents. Work out how to \
accomplish the task you are given and answer with a short, concrete, \
numbered plan followed by the expected result. Do not ask questions.";

/// Asks the model for a plan; an empty answer counts as a failed attempt.
pub struct PlanningExecutor {
    provider: Arc<dyn ChatProvider>,
}

impl PlanningExecutor {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl TaskExecutor for PlanningExecutor {
    async fn execute(&self, agent_id: usize, task: &str) -> Result<String, SwarmError> {
        let prompt = format!("Agent {} assignment: {}", agent_id, task);
        let plan = self.provider.generate(PLANNER_INSTRUCTION, &prompt).await?;
        if plan.trim().is_empty() {
            return Err(SwarmError::Execution(format!(
                "agent {} returned an empty plan",
                agent_id
            )));
        }
        Ok(plan)
    }
}
