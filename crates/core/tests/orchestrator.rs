use async_trait::async_trait;
use aussie_os_core::{AgentError, AgentOrchestrator, MessageRole, TurnOutcome, WorkflowPhase};
use aussie_os_events::{EventBus, NotificationLevel, Notifier, SystemEvent};
use aussie_os_policy::{AgentProfile, KernelPermissions};
use aussie_os_providers::{
    ChatProvider, ChatSession, ModelResponse, Part, ProviderError, ScriptedProvider,
    ToolDeclaration,
};
use aussie_os_tools::file_tools::{FileListTool, FileReadTool, FileWriteTool};
use aussie_os_tools::system_tools::{IdleTool, MessageNotifyUserTool};
use aussie_os_tools::ToolRegistry;
use aussie_os_vfs::VirtualFileSystem;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    agent: Arc<AgentOrchestrator>,
    vfs: Arc<VirtualFileSystem>,
    events: Arc<Mutex<Vec<SystemEvent>>>,
}

fn harness_with(
    provider: Arc<dyn ChatProvider>,
    permissions: KernelPermissions,
    profile: AgentProfile,
) -> Harness {
    let bus = EventBus::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    bus.subscribe(move |event| sink.lock().push(event.clone()));

    let vfs = Arc::new(VirtualFileSystem::new(bus.clone()));
    let mut registry = ToolRegistry::new(bus.clone(), permissions);
    registry.register(Arc::new(FileReadTool::new(Arc::clone(&vfs))));
    registry.register(Arc::new(FileWriteTool::new(Arc::clone(&vfs))));
    registry.register(Arc::new(FileListTool::new(Arc::clone(&vfs))));
    registry.register(Arc::new(MessageNotifyUserTool));
    registry.register(Arc::new(IdleTool));

    let notifier = Notifier::new(bus.clone());
    let agent = AgentOrchestrator::new(provider, Arc::new(registry), bus, notifier, profile).unwrap();
    Harness { agent, vfs, events }
}

fn harness(provider: &ScriptedProvider) -> Harness {
    harness_with(
        Arc::new(provider.clone()),
        KernelPermissions::default(),
        AgentProfile::default(),
    )
}

impl Harness {
    fn texts(&self) -> Vec<String> {
        self.agent.messages().into_iter().map(|m| m.text).collect()
    }

    fn phases(&self) -> Vec<String> {
        let mut phases: Vec<String> = Vec::new();
        for event in self.events.lock().iter() {
            if let SystemEvent::AgentStateUpdate { phase, .. } = event {
                if phases.last() != Some(phase) {
                    phases.push(phase.clone());
                }
            }
        }
        phases
    }

    fn notified(&self, level: NotificationLevel) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| matches!(e, SystemEvent::Notification(n) if n.level == level))
    }
}

/// Echoes the first text part back after a delay.
struct SlowProvider {
    delay: Duration,
}

struct SlowSession {
    delay: Duration,
}

#[async_trait]
impl ChatProvider for SlowProvider {
    fn name(&self) -> &str {
        "Slow"
    }

    fn create_session(
        &self,
        _system_instruction: &str,
        _tools: &[ToolDeclaration],
    ) -> Result<Box<dyn ChatSession>, ProviderError> {
        Ok(Box::new(SlowSession { delay: self.delay }))
    }
}

#[async_trait]
impl ChatSession for SlowSession {
    async fn send_message(&mut self, parts: Vec<Part>) -> Result<ModelResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        let reply = match parts.first() {
            Some(Part::Text(text)) => format!("echo {}", text),
            _ => "ok".to_string(),
        };
        Ok(ModelResponse::text(reply))
    }
}

#[tokio::test]
async fn test_text_reply_ends_turn() {
    let provider = ScriptedProvider::new().then_text("G'day! How can I help?");
    let h = harness(&provider);

    let outcome = h.agent.process_input("hello").await;

    assert_eq!(outcome, TurnOutcome::Completed { iterations: 1 });
    let messages = h.agent.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Model);
    assert_eq!(messages[1].sender.as_deref(), Some("Jules"));
    assert!(!h.agent.status().is_processing);
    assert_eq!(h.agent.status().phase, WorkflowPhase::Idle);
    assert!(h
        .events
        .lock()
        .iter()
        .any(|e| matches!(e, SystemEvent::AgentThought { text } if text == "G'day! How can I help?")));
}

#[tokio::test]
async fn test_file_write_round_trip_through_model() {
    let provider = ScriptedProvider::new()
        .then_call(
            "file_write",
            json!({"file": "/workspace/notes.txt", "content": "hi"}),
        )
        .then_text("Saved your notes.");
    let h = harness(&provider);

    let outcome = h.agent.process_input("write hi to notes.txt").await;

    assert_eq!(outcome, TurnOutcome::Completed { iterations: 2 });
    assert_eq!(h.vfs.read_file("/workspace/notes.txt").unwrap(), "hi");
    assert_eq!(
        provider.sent()[1],
        vec![Part::function_response(
            "file_write",
            json!({"result": {"status": "success"}})
        )]
    );
    assert_eq!(h.phases(), vec!["planning", "coding", "idle"]);
    assert!(h.events.lock().iter().any(
        |e| matches!(e, SystemEvent::ToolExecution { name, .. } if name == "file_write")
    ));
    assert_eq!(h.agent.metrics().tool_executions, 1);
}

#[tokio::test]
async fn test_tool_error_goes_back_to_model() {
    let provider = ScriptedProvider::new()
        .then_call("file_read", json!({"file": "/workspace/missing.txt"}))
        .then_text("That file does not exist.");
    let h = harness(&provider);

    let outcome = h.agent.process_input("read missing.txt").await;

    assert_eq!(outcome, TurnOutcome::Completed { iterations: 2 });
    assert_eq!(
        provider.sent()[1],
        vec![Part::function_response(
            "file_read",
            json!({"result": {"error": "No such file or directory: /workspace/missing.txt"}})
        )]
    );
    assert_eq!(h.agent.metrics().tool_failures, 1);
}

#[tokio::test]
async fn test_iteration_ceiling() {
    let provider = ScriptedProvider::new().always(ModelResponse::call(
        "file_list",
        json!({"path": "/workspace"}),
    ));
    let h = harness(&provider);

    let outcome = h.agent.process_input("loop forever").await;

    assert_eq!(outcome, TurnOutcome::IterationLimit);
    assert_eq!(provider.calls(), 10);
    assert!(!h.agent.status().is_processing);
    assert_eq!(
        h.texts().last().map(String::as_str),
        Some("Stopped after 10 iterations without finishing.")
    );
}

#[tokio::test]
async fn test_configurable_ceiling() {
    let provider = ScriptedProvider::new().always(ModelResponse::call(
        "file_list",
        json!({"path": "/workspace"}),
    ));
    let profile = AgentProfile {
        max_iterations: 3,
        ..AgentProfile::default()
    };
    let h = harness_with(Arc::new(provider.clone()), KernelPermissions::default(), profile);

    assert_eq!(h.agent.process_input("go").await, TurnOutcome::IterationLimit);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_idle_ends_turn_early() {
    let provider = ScriptedProvider::new().then(ModelResponse::new(vec![
        Part::text("All done."),
        Part::function_call("message_notify_user", json!({"text": "Your site is ready"})),
        Part::function_call("idle", json!({})),
    ]));
    let h = harness(&provider);

    let outcome = h.agent.process_input("finish up").await;

    assert_eq!(outcome, TurnOutcome::Idle { iterations: 1 });
    assert_eq!(provider.calls(), 1);
    assert_eq!(
        h.texts(),
        vec!["finish up", "All done.", "Your site is ready"]
    );
}

#[tokio::test]
async fn test_permission_denial_is_a_tool_error() {
    let provider = ScriptedProvider::new()
        .then_call("file_write", json!({"file": "/workspace/a.txt", "content": "x"}))
        .then_text("I am not allowed to write files.");
    let h = harness_with(
        Arc::new(provider.clone()),
        KernelPermissions::sandboxed(),
        AgentProfile::default(),
    );

    let outcome = h.agent.process_input("write a file").await;

    assert_eq!(outcome, TurnOutcome::Completed { iterations: 2 });
    assert!(!h.vfs.exists("/workspace/a.txt"));
    let response = &provider.sent()[1][0];
    let Part::FunctionResponse(response) = response else {
        panic!("expected a function response");
    };
    assert!(response.response["result"]["error"]
        .as_str()
        .unwrap()
        .starts_with("Permission denied"));
    assert_eq!(h.agent.metrics().permission_denials, 1);
}

#[tokio::test]
async fn test_profile_allow_list() {
    let provider = ScriptedProvider::new()
        .then_call("file_write", json!({"file": "/workspace/a.txt", "content": "x"}))
        .then_text("ok");
    let profile = AgentProfile {
        allowed_tools: vec!["file_read".to_string(), "idle".to_string()],
        ..AgentProfile::default()
    };
    let h = harness_with(Arc::new(provider.clone()), KernelPermissions::default(), profile);

    h.agent.process_input("write").await;

    assert!(!h.vfs.exists("/workspace/a.txt"));
    let Part::FunctionResponse(response) = &provider.sent()[1][0] else {
        panic!("expected a function response");
    };
    assert_eq!(
        response.response["result"]["error"],
        "Tool file_write is not allowed for agent jules."
    );
}

#[test]
fn test_unknown_allowed_tool_rejected() {
    let profile = AgentProfile {
        allowed_tools: vec!["teleport".to_string()],
        ..AgentProfile::default()
    };
    let bus = EventBus::new();
    let result = AgentOrchestrator::new(
        Arc::new(ScriptedProvider::new()),
        Arc::new(ToolRegistry::new(bus.clone(), KernelPermissions::default())),
        bus.clone(),
        Notifier::new(bus),
        profile,
    );
    assert!(matches!(result, Err(AgentError::UnknownTool(name)) if name == "teleport"));
}

#[tokio::test]
async fn test_missing_credentials() {
    let provider = ScriptedProvider::new().then_text("never sent").unconfigured();
    let h = harness(&provider);

    let outcome = h.agent.process_input("hello").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(provider.calls(), 0);
    let messages = h.agent.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::System);
    assert!(h.notified(NotificationLevel::Error));
}

#[tokio::test]
async fn test_unrecoverable_error_returns_to_idle() {
    let provider = ScriptedProvider::new().then_error(ProviderError::Api {
        status: 500,
        message: "backend exploded".to_string(),
    });
    let h = harness(&provider);

    let outcome = h.agent.process_input("hello").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(
        h.texts().last().map(String::as_str),
        Some("System Error: API error (500): backend exploded")
    );
    assert_eq!(h.agent.status().phase, WorkflowPhase::Idle);
    assert_eq!(h.phases(), vec!["planning", "error", "idle"]);
    assert!(h.events.lock().iter().any(|e| matches!(e, SystemEvent::Notification(_))));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_retries_same_input() {
    let provider = ScriptedProvider::new()
        .then_rate_limit(Duration::from_secs(5))
        .then_text("Back in business.");
    let h = harness(&provider);

    let outcome = h.agent.process_input("build me a site").await;
    assert_eq!(
        outcome,
        TurnOutcome::RetryScheduled {
            delay: Duration::from_secs(5),
            attempt: 1
        }
    );
    assert!(h.texts()[1].contains("Retrying in 5s"));
    assert!(h.notified(NotificationLevel::Warning));

    let started = tokio::time::Instant::now();
    let retried = h.agent.wait_for_pending_retry().await;
    assert_eq!(retried, Some(TurnOutcome::Completed { iterations: 1 }));
    assert!(started.elapsed() >= Duration::from_secs(5));

    assert_eq!(provider.sent()[1], vec![Part::text("build me a site")]);
    let user_messages = h
        .agent
        .messages()
        .into_iter()
        .filter(|m| m.role == MessageRole::User)
        .count();
    assert_eq!(user_messages, 1);
    assert_eq!(h.agent.metrics().rate_limit_retries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_mid_turn_resends_tool_results() {
    let append = json!({"file": "/workspace/log.txt", "content": "x", "append": true});
    let provider = ScriptedProvider::new()
        .then_call("file_write", append.clone())
        .then_rate_limit(Duration::from_secs(1))
        .then_text("Appended once.");
    let h = harness(&provider);

    let outcome = h.agent.process_input("append x to log.txt").await;
    assert_eq!(
        outcome,
        TurnOutcome::RetryScheduled {
            delay: Duration::from_secs(1),
            attempt: 1
        }
    );

    let retried = h.agent.wait_for_pending_retry().await;
    assert_eq!(retried, Some(TurnOutcome::Completed { iterations: 2 }));

    let sent = provider.sent();
    assert_eq!(sent.len(), 3);
    let tool_result = vec![Part::function_response(
        "file_write",
        json!({"result": {"status": "success"}}),
    )];
    assert_eq!(sent[1], tool_result);
    assert_eq!(sent[2], tool_result);
    assert_eq!(h.vfs.read_file("/workspace/log.txt").unwrap(), "x");
    assert_eq!(h.agent.metrics().tool_executions, 1);
    let texts = h.texts();
    assert_eq!(texts.iter().filter(|t| *t == "append x to log.txt").count(), 1);
    assert_eq!(texts.last().map(String::as_str), Some("Appended once."));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_gives_up_after_three_retries() {
    let provider = ScriptedProvider::new()
        .then_rate_limit(Duration::from_secs(2))
        .then_rate_limit(Duration::from_secs(2))
        .then_rate_limit(Duration::from_secs(2))
        .then_rate_limit(Duration::from_secs(2))
        .then_text("unreachable");
    let h = harness(&provider);

    let mut outcomes = vec![h.agent.process_input("hello").await];
    while let Some(outcome) = h.agent.wait_for_pending_retry().await {
        outcomes.push(outcome);
    }

    let delay = Duration::from_secs(2);
    assert_eq!(
        outcomes,
        vec![
            TurnOutcome::RetryScheduled { delay, attempt: 1 },
            TurnOutcome::RetryScheduled { delay, attempt: 2 },
            TurnOutcome::RetryScheduled { delay, attempt: 3 },
            TurnOutcome::GaveUp,
        ]
    );
    assert_eq!(provider.calls(), 4);
    assert!(h.texts().last().unwrap().starts_with("Rate limit persists"));
}

#[tokio::test(start_paused = true)]
async fn test_new_input_cancels_pending_retry() {
    let provider = ScriptedProvider::new()
        .then_rate_limit(Duration::from_secs(5))
        .then_text("Answer to the second question.")
        .then_text("should never be used");
    let h = harness(&provider);

    h.agent.process_input("first").await;
    assert!(h.agent.has_pending_retry());

    let outcome = h.agent.process_input("second").await;
    assert_eq!(outcome, TurnOutcome::Completed { iterations: 1 });
    assert!(!h.agent.has_pending_retry());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_clear_history_cancels_pending_retry() {
    let provider = ScriptedProvider::new()
        .then_rate_limit(Duration::from_secs(5))
        .then_text("answer to the forgotten question");
    let h = harness(&provider);

    h.agent.process_input("old question").await;
    assert!(h.agent.has_pending_retry());

    h.agent.clear_history().await;
    assert!(!h.agent.has_pending_retry());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(provider.calls(), 1);
    assert!(h.agent.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_turn_in_flight() {
    let h = harness_with(
        Arc::new(SlowProvider {
            delay: Duration::from_secs(60),
        }),
        KernelPermissions::default(),
        AgentProfile::default(),
    );

    let agent = Arc::clone(&h.agent);
    let turn = tokio::spawn(async move { agent.process_input("take your time").await });
    while !h.agent.status().is_processing {
        tokio::task::yield_now().await;
    }
    h.agent.stop();

    assert_eq!(turn.await.unwrap(), TurnOutcome::Cancelled);
    assert!(!h.agent.status().is_processing);
    assert_eq!(h.texts().last().map(String::as_str), Some("Stopped."));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_inputs_run_in_order() {
    let h = harness_with(
        Arc::new(SlowProvider {
            delay: Duration::from_secs(1),
        }),
        KernelPermissions::default(),
        AgentProfile::default(),
    );

    let (first, second) = tokio::join!(
        h.agent.process_input("first"),
        h.agent.process_input("second")
    );

    assert_eq!(first, TurnOutcome::Completed { iterations: 1 });
    assert_eq!(second, TurnOutcome::Completed { iterations: 1 });
    assert_eq!(
        h.texts(),
        vec!["first", "echo first", "second", "echo second"]
    );
}

#[tokio::test]
async fn test_clear_history_starts_new_session() {
    let provider = ScriptedProvider::new().always(ModelResponse::text("ok"));
    let h = harness(&provider);

    h.agent.process_input("one").await;
    h.agent.clear_history().await;
    assert!(h.agent.messages().is_empty());

    h.agent.process_input("two").await;
    assert_eq!(provider.sessions(), 2);
    assert_eq!(h.texts(), vec!["two", "ok"]);
}
