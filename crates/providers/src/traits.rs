use crate::types::{ModelResponse, Part, ToolDeclaration};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Rate limited, retry in {}s: {message}", retry_after.as_secs_f64())]
    RateLimited { retry_after: Duration, message: String },
    #[error("Missing API key: set {0}")]
    MissingApiKey(String),
}

impl ProviderError {
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// A stateful conversation. The session keeps its own history; a failed
/// `send_message` leaves that history untouched so the same parts can be
/// sent again.
#[async_trait]
pub trait ChatSession: Send {
    async fn send_message(&mut self, parts: Vec<Part>) -> Result<ModelResponse, ProviderError>;
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    /// False when credentials are missing; sessions would fail.
    fn is_configured(&self) -> bool {
        true
    }

    fn create_session(
        &self,
        system_instruction: &str,
        tools: &[ToolDeclaration],
    ) -> Result<Box<dyn ChatSession>, ProviderError>;

    /// Single-shot prompt without tools.
    async fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String, ProviderError> {
        let mut session = self.create_session(system_instruction, &[])?;
        let response = session.send_message(vec![Part::text(prompt)]).await?;
        Ok(response.texts().collect::<Vec<_>>().join("\n"))
    }
}
