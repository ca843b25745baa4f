use crate::traits::*;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_key_env: "GEMINI_API_KEY".to_string(),
            model,
        }
    }

    /// Read the key from `env_var`; a missing variable leaves the provider
    /// unconfigured rather than failing.
    pub fn from_env(env_var: &str, model: String) -> Self {
        let mut provider = Self::new(std::env::var(env_var).ok(), model);
        provider.api_key_env = env_var.to_string();
        provider
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn create_session(
        &self,
        system_instruction: &str,
        tools: &[ToolDeclaration],
    ) -> Result<Box<dyn ChatSession>, ProviderError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::MissingApiKey(self.api_key_env.clone()))?;

        Ok(Box::new(GeminiSession {
            client: self.client.clone(),
            url: format!("{}/models/{}:generateContent", self.base_url, self.model),
            api_key,
            system_instruction: system_instruction.to_string(),
            tools: tools.to_vec(),
            history: Vec::new(),
        }))
    }
}

pub struct GeminiSession {
    client: Client,
    url: String,
    api_key: String,
    system_instruction: String,
    tools: Vec<ToolDeclaration>,
    history: Vec<Content>,
}

impl GeminiSession {
    fn request_body(&self, pending: &Content) -> Value {
        let contents: Vec<&Content> = self.history.iter().chain(std::iter::once(pending)).collect();
        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": self.system_instruction }] },
            "contents": contents,
        });
        if !self.tools.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": self.tools }]);
        }
        body
    }
}

#[async_trait]
impl ChatSession for GeminiSession {
    async fn send_message(&mut self, parts: Vec<Part>) -> Result<ModelResponse, ProviderError> {
        let pending = Content {
            role: Role::User,
            parts,
        };
        let body = self.request_body(&pending);

        tracing::debug!("Gemini request with {} prior turns", self.history.len());
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let model_response = parse_response(&json)?;

        self.history.push(pending);
        self.history.push(Content {
            role: Role::Model,
            parts: model_response.parts.clone(),
        });
        Ok(model_response)
    }
}

fn parse_response(json: &Value) -> Result<ModelResponse, ProviderError> {
    let candidate = json["candidates"]
        .get(0)
        .ok_or_else(|| ProviderError::Parse("No candidates in response".to_string()))?;

    let parts = match candidate["content"]["parts"].as_array() {
        Some(parts) => parts
            .iter()
            .filter_map(|part| serde_json::from_value::<Part>(part.clone()).ok())
            .collect(),
        None => Vec::new(),
    };
    Ok(ModelResponse { parts })
}

/// 429s carrying a `RetryInfo` delay become `RateLimited`; everything else
/// is an API error.
fn classify_failure(status: StatusCode, body: &str) -> ProviderError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v["error"]["message"].as_str())
        .unwrap_or(body)
        .to_string();

    if status == StatusCode::TOO_MANY_REQUESTS {
        if let Some(retry_after) = parsed.as_ref().and_then(retry_delay) {
            return ProviderError::RateLimited { retry_after, message };
        }
    }
    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

fn retry_delay(error: &Value) -> Option<Duration> {
    error["error"]["details"]
        .as_array()?
        .iter()
        .filter(|detail| {
            detail["@type"]
                .as_str()
                .map(|t| t.ends_with("RetryInfo"))
                .unwrap_or(false)
        })
        .find_map(|detail| parse_duration(detail["retryDelay"].as_str()?))
}

/// Protobuf JSON duration, e.g. `"5s"` or `"1.5s"`.
fn parse_duration(raw: &str) -> Option<Duration> {
    let seconds: f64 = raw.strip_suffix('s')?.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}
