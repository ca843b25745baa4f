use crate::metrics::{Metrics, MetricsSnapshot};
use crate::phase::WorkflowPhase;
use crate::types::{AgentStatus, Message, MessageRole, TurnOutcome};
use crate::AgentError;
use aussie_os_events::{EventBus, Notifier, SystemEvent};
use aussie_os_policy::AgentProfile;
use aussie_os_providers::{ChatProvider, ChatSession, FunctionCall, Part, ProviderError, ToolDeclaration};
use aussie_os_tools::{ToolContext, ToolEffect, ToolRegistry, ToolResult};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct AgentState {
    messages: Vec<Message>,
    is_processing: bool,
    phase: WorkflowPhase,
}

struct PendingRetry {
    token: CancellationToken,
    handle: JoinHandle<TurnOutcome>,
}

/// The next message a turn sends, and where in the loop it stands.
struct Outgoing {
    /// Recorded in the transcript when a fresh turn starts.
    user_text: Option<String>,
    parts: Vec<Part>,
    iteration: usize,
    retries: u32,
    /// Set on retries; a cancelled retry that already woke up must not run.
    retry_token: Option<CancellationToken>,
}

impl Outgoing {
    fn fresh(input: &str) -> Self {
        Self {
            user_text: Some(input.to_string()),
            parts: vec![Part::text(input)],
            iteration: 1,
            retries: 0,
            retry_token: None,
        }
    }
}

/// Drives the chat session through the think-act-observe loop.
///
/// Turns are serialized: a `process_input` issued while another turn is in
/// flight waits for it to finish, in call order. Model text and tool side
/// effects are published on the bus as they happen.
pub struct AgentOrchestrator {
    provider: Arc<dyn ChatProvider>,
    tools: Arc<ToolRegistry>,
    bus: EventBus,
    notifier: Notifier,
    profile: AgentProfile,
    /// Also the turn lock; tokio's mutex queues waiters fairly.
    session: tokio::sync::Mutex<Option<Box<dyn ChatSession>>>,
    state: Mutex<AgentState>,
    cancel: Mutex<CancellationToken>,
    pending_retry: Mutex<Option<PendingRetry>>,
    metrics: Metrics,
}

impl AgentOrchestrator {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        tools: Arc<ToolRegistry>,
        bus: EventBus,
        notifier: Notifier,
        profile: AgentProfile,
    ) -> Result<Arc<Self>, AgentError> {
        profile.validate()?;
        if let Some(unknown) = profile.allowed_tools.iter().find(|t| !tools.contains(t)) {
            return Err(AgentError::UnknownTool(unknown.clone()));
        }
        info!(
            "Agent {} ready with provider {} ({} tools)",
            profile.id,
            provider.name(),
            tools.list().len()
        );

        Ok(Arc::new(Self {
            provider,
            tools,
            bus,
            notifier,
            profile,
            session: tokio::sync::Mutex::new(None),
            state: Mutex::new(AgentState::default()),
            cancel: Mutex::new(CancellationToken::new()),
            pending_retry: Mutex::new(None),
            metrics: Metrics::new(),
        }))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    pub fn status(&self) -> AgentStatus {
        let state = self.state.lock();
        AgentStatus {
            is_processing: state.is_processing,
            phase: state.phase,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Handle one user message. A pending rate-limit retry is dropped first.
    pub async fn process_input(self: &Arc<Self>, input: &str) -> TurnOutcome {
        self.cancel_pending_retry();
        Arc::clone(self).run_turn(Outgoing::fresh(input)).await
    }

    /// Cancel the turn in flight at its next iteration boundary (or while it
    /// waits on the model), and any pending retry.
    pub fn stop(&self) {
        info!("Stop requested for agent {}", self.profile.id);
        self.cancel.lock().cancel();
        self.cancel_pending_retry();
    }

    /// Drop the conversation, the chat session and any pending retry. Waits
    /// for the turn in flight, if any.
    pub async fn clear_history(&self) {
        self.cancel_pending_retry();
        let mut session = self.session.lock().await;
        *session = None;
        self.state.lock().messages.clear();
        info!("Agent {} history cleared", self.profile.id);
        self.emit_state();
    }

    /// Wait for the scheduled retry, if there is one, and return its outcome.
    pub async fn wait_for_pending_retry(&self) -> Option<TurnOutcome> {
        let pending = self.pending_retry.lock().take()?;
        pending.handle.await.ok()
    }

    /// True while a scheduled retry has not yet finished.
    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry
            .lock()
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    // Boxed so a retry can spawn another turn from inside a turn.
    fn run_turn(self: Arc<Self>, mut send: Outgoing) -> BoxFuture<'static, TurnOutcome> {
        Box::pin(async move {
            if !self.provider.is_configured() {
                warn!("Provider {} has no credentials", self.provider.name());
                self.add_message(
                    MessageRole::System,
                    "Error: API key not found. Please check your environment variables.",
                    None,
                );
                self.notifier
                    .error("Agent Error", "API key not found for the model provider.");
                return TurnOutcome::Failed;
            }

            let mut session = self.session.lock().await;
            if send.retry_token.take().is_some_and(|t| t.is_cancelled()) {
                debug!("Retry cancelled while waiting for the session");
                return TurnOutcome::Cancelled;
            }
            let token = CancellationToken::new();
            *self.cancel.lock() = token.clone();

            self.metrics.inc_turns();
            self.set_processing(true);
            self.set_phase(WorkflowPhase::Planning);
            if let Some(text) = send.user_text.take() {
                self.add_message(MessageRole::User, &text, None);
            }

            let outcome = self.drive(&mut session, send, &token).await;
            info!("Turn finished: {:?}", outcome);

            self.set_processing(false);
            self.set_phase(WorkflowPhase::Idle);
            outcome
        })
    }

    async fn drive(
        self: &Arc<Self>,
        slot: &mut Option<Box<dyn ChatSession>>,
        send: Outgoing,
        token: &CancellationToken,
    ) -> TurnOutcome {
        if slot.is_none() {
            let declarations: Vec<ToolDeclaration> = self
                .tools
                .declarations()
                .into_iter()
                .filter(|d| self.profile.is_tool_allowed(&d.name))
                .collect();
            match self
                .provider
                .create_session(&self.profile.system_instruction, &declarations)
            {
                Ok(session) => *slot = Some(session),
                Err(e) => return self.fail(&e.to_string()),
            }
        }
        let Some(session) = slot.as_mut() else {
            return TurnOutcome::Failed;
        };

        let max = self.profile.max_iterations;
        let Outgoing {
            mut parts,
            iteration: first,
            retries,
            ..
        } = send;

        for iteration in first..=max {
            if token.is_cancelled() {
                return self.cancelled();
            }

            debug!("Agent iteration {}/{}", iteration, max);
            self.metrics.inc_llm_requests();
            let reply = tokio::select! {
                _ = token.cancelled() => return self.cancelled(),
                reply = session.send_message(parts.clone()) => reply,
            };
            let response = match reply {
                Ok(response) => response,
                Err(e) => {
                    self.metrics.inc_llm_failures();
                    // The unsent parts are resent as-is, so tool results
                    // already produced this turn still reach the model.
                    return self.handle_provider_error(e, parts, iteration, retries);
                }
            };

            let text = response.texts().collect::<Vec<_>>().join("\n");
            if !text.trim().is_empty() {
                self.add_message(MessageRole::Model, &text, Some(self.agent_name()));
                self.bus.emit(SystemEvent::AgentThought { text });
            }

            let calls: Vec<FunctionCall> = response.function_calls().cloned().collect();
            if calls.is_empty() {
                return TurnOutcome::Completed {
                    iterations: iteration,
                };
            }

            let mut idle = false;
            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                let mut ctx = ToolContext::new();
                let result = self.run_tool(&mut ctx, &call.name, call.args).await;
                for effect in ctx.take_effects() {
                    match effect {
                        ToolEffect::NotifyUser(text) => {
                            self.add_message(MessageRole::Model, &text, Some(self.agent_name()))
                        }
                        ToolEffect::Idle => idle = true,
                    }
                }
                responses.push(Part::function_response(
                    call.name,
                    json!({ "result": result.into_response() }),
                ));
            }

            if idle {
                return TurnOutcome::Idle {
                    iterations: iteration,
                };
            }
            if iteration == max {
                break;
            }
            parts = responses;
        }

        warn!("Agent {} hit the {}-iteration ceiling", self.profile.id, max);
        self.add_message(
            MessageRole::System,
            &format!("Stopped after {} iterations without finishing.", max),
            None,
        );
        TurnOutcome::IterationLimit
    }

    async fn run_tool(&self, ctx: &mut ToolContext, name: &str, args: Value) -> ToolResult {
        if let Some(phase) = WorkflowPhase::for_tool(name) {
            self.set_phase(phase);
        }
        self.bus.emit(SystemEvent::ToolExecution {
            name: name.to_string(),
            args: args.clone(),
        });
        self.metrics.inc_tool_executions();

        let result = if self.profile.is_tool_allowed(name) {
            self.tools.dispatch(ctx, name, args).await
        } else {
            ToolResult::failure(format!(
                "Tool {} is not allowed for agent {}.",
                name, self.profile.id
            ))
        };

        if let Some(error) = &result.error {
            self.metrics.inc_tool_failures();
            if error.starts_with("Permission denied") {
                self.metrics.inc_permission_denials();
            }
        }
        result
    }

    fn handle_provider_error(
        self: &Arc<Self>,
        e: ProviderError,
        parts: Vec<Part>,
        iteration: usize,
        retries: u32,
    ) -> TurnOutcome {
        let Some(delay) = e.retry_after() else {
            error!("LLM call failed: {}", e);
            return self.fail(&e.to_string());
        };

        let max = self.profile.max_rate_limit_retries;
        if retries >= max {
            error!("Still rate limited after {} retries, giving up", max);
            self.add_message(
                MessageRole::System,
                "Rate limit persists after several retries. Check your API quota and try again later.",
                None,
            );
            self.notifier
                .error("Rate Limited", "The model is still rate limited. Giving up.");
            return TurnOutcome::GaveUp;
        }

        let attempt = retries + 1;
        warn!("Rate limited, retry {}/{} in {:?}", attempt, max, delay);
        self.add_message(
            MessageRole::System,
            &format!(
                "Rate limit reached. Retrying in {}s (attempt {}/{})...",
                delay.as_secs_f64(),
                attempt,
                max
            ),
            None,
        );
        self.notifier.warning(
            "Rate Limited",
            &format!("Retrying in {}s.", delay.as_secs_f64()),
        );
        self.schedule_retry(parts, iteration, attempt, delay);
        TurnOutcome::RetryScheduled { delay, attempt }
    }

    fn schedule_retry(self: &Arc<Self>, parts: Vec<Part>, iteration: usize, attempt: u32, delay: Duration) {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let send = Outgoing {
            user_text: None,
            parts,
            iteration,
            retries: attempt,
            retry_token: Some(token.clone()),
        };
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!("Pending retry cancelled");
                    return TurnOutcome::Cancelled;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            this.metrics.inc_rate_limit_retries();
            this.run_turn(send).await
        });

        let previous = self
            .pending_retry
            .lock()
            .replace(PendingRetry { token, handle });
        if let Some(previous) = previous {
            previous.token.cancel();
        }
    }

    fn cancel_pending_retry(&self) {
        let pending = self.pending_retry.lock().take();
        if let Some(pending) = pending {
            info!("Pending retry cancelled");
            pending.token.cancel();
        }
    }

    fn fail(&self, reason: &str) -> TurnOutcome {
        self.set_phase(WorkflowPhase::Error);
        self.add_message(MessageRole::System, &format!("System Error: {}", reason), None);
        self.notifier.error("Agent Error", reason);
        TurnOutcome::Failed
    }

    fn cancelled(&self) -> TurnOutcome {
        info!("Turn cancelled");
        self.add_message(MessageRole::System, "Stopped.", None);
        TurnOutcome::Cancelled
    }

    fn agent_name(&self) -> String {
        self.profile.display_name.clone()
    }

    fn add_message(&self, role: MessageRole, text: &str, sender: Option<String>) {
        self.state
            .lock()
            .messages
            .push(Message::new(role, text, sender));
        self.emit_state();
    }

    fn set_processing(&self, is_processing: bool) {
        self.state.lock().is_processing = is_processing;
    }

    fn set_phase(&self, phase: WorkflowPhase) {
        {
            let mut state = self.state.lock();
            if state.phase == phase {
                return;
            }
            state.phase = phase;
        }
        debug!("Phase -> {}", phase);
        self.emit_state();
    }

    fn emit_state(&self) {
        let event = {
            let state = self.state.lock();
            SystemEvent::AgentStateUpdate {
                message_count: state.messages.len(),
                is_processing: state.is_processing,
                phase: state.phase.as_str().to_string(),
            }
        };
        self.bus.emit(event);
    }
}
