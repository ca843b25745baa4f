use crate::traits::*;
use crate::types::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Script {
    steps: VecDeque<Result<ModelResponse, ProviderError>>,
    fallback: Option<ModelResponse>,
    sent: Vec<Vec<Part>>,
    sessions: usize,
    system_instructions: Vec<String>,
}

/// Replays a fixed list of model turns and errors, shared by every session
/// it creates. Once the list is exhausted the `always` response (if any) is
/// returned forever.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
    unconfigured: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, response: ModelResponse) -> Self {
        self.script.lock().steps.push_back(Ok(response));
        self
    }

    pub fn then_text(self, text: &str) -> Self {
        self.then(ModelResponse::text(text))
    }

    pub fn then_call(self, name: &str, args: Value) -> Self {
        self.then(ModelResponse::call(name, args))
    }

    pub fn then_error(self, error: ProviderError) -> Self {
        self.script.lock().steps.push_back(Err(error));
        self
    }

    pub fn then_rate_limit(self, retry_after: Duration) -> Self {
        self.then_error(ProviderError::RateLimited {
            retry_after,
            message: "Resource has been exhausted".to_string(),
        })
    }

    pub fn always(self, response: ModelResponse) -> Self {
        self.script.lock().fallback = Some(response);
        self
    }

    /// Behave like a provider without credentials.
    pub fn unconfigured(mut self) -> Self {
        self.unconfigured = true;
        self
    }

    /// Number of `send_message` calls across all sessions.
    pub fn calls(&self) -> usize {
        self.script.lock().sent.len()
    }

    pub fn sent(&self) -> Vec<Vec<Part>> {
        self.script.lock().sent.clone()
    }

    pub fn sessions(&self) -> usize {
        self.script.lock().sessions
    }

    pub fn system_instructions(&self) -> Vec<String> {
        self.script.lock().system_instructions.clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured
    }

    fn create_session(
        &self,
        system_instruction: &str,
        _tools: &[ToolDeclaration],
    ) -> Result<Box<dyn ChatSession>, ProviderError> {
        if self.unconfigured {
            return Err(ProviderError::MissingApiKey("SCRIPTED_API_KEY".to_string()));
        }
        let mut script = self.script.lock();
        script.sessions += 1;
        script.system_instructions.push(system_instruction.to_string());
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedSession {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl ChatSession for ScriptedSession {
    async fn send_message(&mut self, parts: Vec<Part>) -> Result<ModelResponse, ProviderError> {
        let mut script = self.script.lock();
        script.sent.push(parts);
        match script.steps.pop_front() {
            Some(step) => step,
            None => script.fallback.clone().ok_or_else(|| ProviderError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// Stand-in used when no model is configured: answers every message with a
/// short notice and never calls tools.
#[derive(Default)]
pub struct OfflineProvider;

#[async_trait]
impl ChatProvider for OfflineProvider {
    fn name(&self) -> &str {
        "Offline"
    }

    fn create_session(
        &self,
        _system_instruction: &str,
        _tools: &[ToolDeclaration],
    ) -> Result<Box<dyn ChatSession>, ProviderError> {
        Ok(Box::new(OfflineSession))
    }
}

struct OfflineSession;

#[async_trait]
impl ChatSession for OfflineSession {
    async fn send_message(&mut self, parts: Vec<Part>) -> Result<ModelResponse, ProviderError> {
        let reply = match parts.first() {
            Some(Part::Text(text)) => format!(
                "Offline mode: no model is configured, so I can't act on \"{}\". Use !<command> to run the shell directly.",
                text.trim()
            ),
            _ => "Offline mode: nothing to do.".to_string(),
        };
        Ok(ModelResponse::text(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_script_order_then_fallback() {
        let provider = ScriptedProvider::new()
            .then_text("first")
            .then_rate_limit(Duration::from_secs(5))
            .always(ModelResponse::call("idle", json!({})));

        let mut session = provider.create_session("sys", &[]).unwrap();
        let first = session.send_message(vec![Part::text("a")]).await.unwrap();
        assert_eq!(first, ModelResponse::text("first"));

        let second = session.send_message(vec![Part::text("b")]).await;
        assert!(matches!(second, Err(ProviderError::RateLimited { .. })));

        for _ in 0..3 {
            let next = session.send_message(vec![Part::text("c")]).await.unwrap();
            assert!(next.has_function_calls());
        }
        assert_eq!(provider.calls(), 5);
        assert_eq!(provider.sessions(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_script_errors() {
        let provider = ScriptedProvider::new();
        let mut session = provider.create_session("sys", &[]).unwrap();
        assert!(session.send_message(vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_generate_joins_text() {
        let provider = ScriptedProvider::new().then(ModelResponse::new(vec![
            Part::text("step one"),
            Part::text("step two"),
        ]));
        let plan = provider.generate("planner", "do it").await.unwrap();
        assert_eq!(plan, "step one\nstep two");
        assert_eq!(provider.system_instructions(), vec!["planner".to_string()]);
    }

    #[tokio::test]
    async fn test_offline_provider_never_calls_tools() {
        let mut session = OfflineProvider.create_session("sys", &[]).unwrap();
        let reply = session.send_message(vec![Part::text("hello")]).await.unwrap();
        assert!(!reply.has_function_calls());
    }
}
