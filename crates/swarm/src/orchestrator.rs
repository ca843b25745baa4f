use crate::config::SwarmConfig;
use crate::executor::TaskExecutor;
use crate::SwarmError;
use aussie_os_events::{EventBus, SystemEvent};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const HIVE_MIND: &str = "Hive Mind";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SwarmStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwarmReport {
    pub status: SwarmStatus,
    pub success_count: usize,
    pub agent_count: usize,
    /// `success_count / agent_count`.
    pub agreement: f64,
    pub message: String,
    /// Output of the first successful worker, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SwarmReport {
    pub fn succeeded(&self) -> bool {
        self.status == SwarmStatus::Success
    }
}

pub struct SwarmOrchestrator {
    executor: Arc<dyn TaskExecutor>,
    config: SwarmConfig,
    bus: EventBus,
}

impl SwarmOrchestrator {
    pub fn new(executor: Arc<dyn TaskExecutor>, config: SwarmConfig, bus: EventBus) -> Self {
        Self {
            executor,
            config,
            bus,
        }
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub async fn execute(&self, task: &str) -> Result<SwarmReport, SwarmError> {
        self.execute_with(task, &self.config).await
    }

    /// Fan `task` out to every worker at once and vote on the outcomes.
    pub async fn execute_with(&self, task: &str, config: &SwarmConfig) -> Result<SwarmReport, SwarmError> {
        if task.trim().is_empty() {
            return Err(SwarmError::InvalidConfig("task must not be empty".to_string()));
        }
        if !(config.consensus_threshold > 0.0 && config.consensus_threshold <= 1.0) {
            return Err(SwarmError::InvalidConfig(format!(
                "consensus threshold must be in (0, 1], got {}",
                config.consensus_threshold
            )));
        }

        let agent_count = config.agent_count();
        let flavour = if config.enhanced { "Enhanced" } else { "Standard" };
        info!("Swarm: {} {} agents for task {:?}", agent_count, config.topology, task);

        self.shell(format!(
            "[Swarm] Initializing {} swarm with {} optimization...",
            config.topology, flavour
        ));
        self.hive(format!("Initializing {} Swarm for task: \"{}\"...", flavour, task));
        self.shell(format!("[Swarm] Spawning {} autonomous agents...", agent_count));
        self.hive(format!(
            "Spawning {} autonomous agents in {} topology.",
            agent_count, config.topology
        ));

        let attempts = (0..agent_count).map(|agent_id| {
            let executor = Arc::clone(&self.executor);
            let bus = self.bus.clone();
            async move {
                let outcome = executor.execute(agent_id, task).await;
                let text = match &outcome {
                    Ok(_) => "Task attempt complete.".to_string(),
                    Err(e) => format!("Error: {}", e),
                };
                bus.emit(SystemEvent::AgentMessage {
                    agent: format!("Agent {}", agent_id),
                    text,
                });
                outcome
            }
        });
        let results = join_all(attempts).await;

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        let agreement = success_count as f64 / agent_count as f64;
        let percent = agreement * 100.0;
        self.shell(format!("[Swarm] Consensus Reached: {:.1}% agreement.", percent));

        let report = if success_count >= config.required_successes() {
            self.hive(format!(
                "✅ Consensus reached ({:.0}%). Task completed successfully.",
                percent
            ));
            SwarmReport {
                status: SwarmStatus::Success,
                success_count,
                agent_count,
                agreement,
                message: format!(
                    "Task completed by swarm. {}/{} agents verified result.",
                    success_count, agent_count
                ),
                details: results.into_iter().find_map(Result::ok),
            }
        } else {
            warn!("Swarm consensus failed: {}/{}", success_count, agent_count);
            self.hive(format!("❌ Consensus failed. Only {:.0}% agreement.", percent));
            SwarmReport {
                status: SwarmStatus::Failure,
                success_count,
                agent_count,
                agreement,
                message: "Swarm failed to reach consensus.".to_string(),
                details: None,
            }
        };
        Ok(report)
    }

    fn shell(&self, line: String) {
        self.bus.emit(SystemEvent::ShellOutput(line));
    }

    fn hive(&self, text: String) {
        self.bus.emit(SystemEvent::AgentMessage {
            agent: HIVE_MIND.to_string(),
            text,
        });
    }
}
