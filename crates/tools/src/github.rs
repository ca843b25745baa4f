use crate::traits::{str_arg, Tool, ToolContext, ToolError};
use aussie_os_policy::Capability;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GithubOperation {
    PrCreate,
    IssueCreate,
}

impl GithubOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            GithubOperation::PrCreate => "pr_create",
            GithubOperation::IssueCreate => "issue_create",
        }
    }
}

impl FromStr for GithubOperation {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pr_create" => Ok(GithubOperation::PrCreate),
            "issue_create" => Ok(GithubOperation::IssueCreate),
            other => Err(ToolError::Validation(format!("unknown operation '{}'", other))),
        }
    }
}

/// The few GitHub REST calls the agent may make. `data` carries `repo`
/// (`owner/name`), `title` and optionally `body`, `head`, `base`.
#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn execute(&self, operation: GithubOperation, data: &Value) -> Result<Value, ToolError>;
}

fn repo_and_title(data: &Value) -> Result<(&str, &str), ToolError> {
    let repo = str_arg(data, "repo")?;
    if repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
        return Err(ToolError::Validation(format!(
            "repo must look like owner/name, got '{}'",
            repo
        )));
    }
    Ok((repo, str_arg(data, "title")?))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedOperation {
    pub operation: GithubOperation,
    pub repo: String,
    pub number: u64,
    pub title: String,
}

/// Keeps operations in memory and answers with plausible GitHub URLs.
#[derive(Default)]
pub struct OfflineGithub {
    log: Mutex<Vec<RecordedOperation>>,
}

impl OfflineGithub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> Vec<RecordedOperation> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl GithubClient for OfflineGithub {
    async fn execute(&self, operation: GithubOperation, data: &Value) -> Result<Value, ToolError> {
        let (repo, title) = repo_and_title(data)?;
        let mut log = self.log.lock();
        let number = log.len() as u64 + 1;
        log.push(RecordedOperation {
            operation,
            repo: repo.to_string(),
            number,
            title: title.to_string(),
        });

        let kind = match operation {
            GithubOperation::PrCreate => "pull",
            GithubOperation::IssueCreate => "issues",
        };
        Ok(json!({
            "status": "created",
            "number": number,
            "url": format!("https://github.com/{}/{}/{}", repo, kind, number),
        }))
    }
}

/// Token-authenticated client for the GitHub REST API.
pub struct HttpGithub {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGithub {
    pub fn new(token: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
            token,
        }
    }

    /// `None` when the variable is unset or empty.
    pub fn from_env(env_var: &str) -> Option<Self> {
        std::env::var(env_var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl GithubClient for HttpGithub {
    async fn execute(&self, operation: GithubOperation, data: &Value) -> Result<Value, ToolError> {
        let (repo, title) = repo_and_title(data)?;
        let body = data["body"].as_str().unwrap_or_default();
        let (url, payload) = match operation {
            GithubOperation::PrCreate => (
                format!("{}/repos/{}/pulls", self.base_url, repo),
                json!({
                    "title": title,
                    "body": body,
                    "head": str_arg(data, "head")?,
                    "base": data["base"].as_str().unwrap_or("main"),
                }),
            ),
            GithubOperation::IssueCreate => (
                format!("{}/repos/{}/issues", self.base_url, repo),
                json!({ "title": title, "body": body }),
            ),
        };

        info!("GitHub {} on {}", operation.as_str(), repo);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "aussie-os")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("GitHub request failed: {}", e)))?;

        let status = response.status();
        let reply: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("GitHub response unreadable: {}", e)))?;
        if !status.is_success() {
            let message = reply["message"].as_str().unwrap_or("unknown error");
            return Err(ToolError::Execution(format!(
                "GitHub API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        Ok(json!({
            "status": "created",
            "number": reply["number"],
            "url": reply["html_url"],
        }))
    }
}

pub struct GithubOpsTool {
    github: Arc<dyn GithubClient>,
}

impl GithubOpsTool {
    pub fn new(github: Arc<dyn GithubClient>) -> Self {
        Self { github }
    }
}

#[async_trait]
impl Tool for GithubOpsTool {
    fn name(&self) -> &str {
        "github_ops"
    }

    fn description(&self) -> &str {
        "Perform GitHub operations."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": { "type": "string", "enum": ["pr_create", "issue_create"] },
                "data": {
                    "type": "object",
                    "description": "repo (owner/name), title, body; pr_create also needs head and takes base"
                }
            },
            "required": ["operation", "data"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::Network
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let operation: GithubOperation = str_arg(&args, "operation")?.parse()?;
        self.github.execute(operation, &args["data"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_numbers_operations() {
        let github = OfflineGithub::new();
        let data = json!({"repo": "aussie/site", "title": "Fix header"});

        let first = github.execute(GithubOperation::IssueCreate, &data).await.unwrap();
        let second = github.execute(GithubOperation::PrCreate, &data).await.unwrap();

        assert_eq!(first["url"], "https://github.com/aussie/site/issues/1");
        assert_eq!(second["url"], "https://github.com/aussie/site/pull/2");
        assert_eq!(github.operations().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_repo_rejected() {
        let github = OfflineGithub::new();
        let data = json!({"repo": "site", "title": "x"});
        assert!(matches!(
            github.execute(GithubOperation::IssueCreate, &data).await,
            Err(ToolError::Validation(_))
        ));
    }
}
