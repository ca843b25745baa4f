use crate::traits::{opt_str_arg, str_arg, Tool, ToolContext, ToolError};
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_policy::Capability;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeployProvider {
    #[default]
    Render,
    Vercel,
    Replit,
    Netlify,
}

impl DeployProvider {
    pub const ALL: [DeployProvider; 4] = [
        DeployProvider::Render,
        DeployProvider::Vercel,
        DeployProvider::Replit,
        DeployProvider::Netlify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployProvider::Render => "render",
            DeployProvider::Vercel => "vercel",
            DeployProvider::Replit => "replit",
            DeployProvider::Netlify => "netlify",
        }
    }

    fn domain(&self) -> &'static str {
        match self {
            DeployProvider::Render => "onrender.com",
            DeployProvider::Vercel => "vercel.app",
            DeployProvider::Replit => "replit.app",
            DeployProvider::Netlify => "netlify.app",
        }
    }
}

impl fmt::Display for DeployProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployProvider {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeployProvider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ToolError::Validation(format!("unknown provider '{}'", s)))
    }
}

/// `pending -> build_started -> live | failed`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    Pending,
    BuildStarted,
    Live,
    Failed,
}

impl DeployStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStatus::Pending => "pending",
            DeployStatus::BuildStarted => "build_started",
            DeployStatus::Live => "live",
            DeployStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployStatus::Live | DeployStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployLog {
    pub timestamp: i64,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeployState {
    pub id: String,
    pub provider: DeployProvider,
    pub repo_url: String,
    pub status: DeployStatus,
    pub logs: Vec<DeployLog>,
    pub url: Option<String>,
}

/// Hosting back end for `deploy_app`.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Start a deployment and return its id; progress is reported through
    /// [`SystemEvent::DeployUpdate`].
    async fn deploy(&self, provider: DeployProvider, repo_url: &str) -> Result<String, ToolError>;

    fn state(&self, id: &str) -> Option<DeployState>;
}

/// `(owner, repo)` of a GitHub repository URL.
pub fn parse_repo_url(repo_url: &str) -> Result<(String, String), ToolError> {
    let invalid = || ToolError::Validation(format!("not a GitHub repository URL: {}", repo_url));
    let url = Url::parse(repo_url.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "https" | "http") || url.host_str() != Some("github.com") {
        return Err(invalid());
    }
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    match segments.as_slice() {
        [owner, repo] => Ok((
            owner.to_string(),
            repo.trim_end_matches(".git").to_string(),
        )),
        _ => Err(invalid()),
    }
}

#[derive(Default)]
struct Deployments {
    all: HashMap<String, DeployState>,
    running: Option<String>,
}

/// Offline deployer that walks the status machine on a timer. One
/// deployment at a time.
pub struct SimulatedDeployer {
    deployments: Arc<Mutex<Deployments>>,
    bus: EventBus,
    step: Duration,
    fail_builds: bool,
}

impl SimulatedDeployer {
    pub fn new(bus: EventBus, step: Duration) -> Self {
        Self {
            deployments: Arc::new(Mutex::new(Deployments::default())),
            bus,
            step,
            fail_builds: false,
        }
    }

    /// Every build ends in `failed`.
    pub fn failing(bus: EventBus, step: Duration) -> Self {
        Self {
            fail_builds: true,
            ..Self::new(bus, step)
        }
    }

    pub fn is_busy(&self) -> bool {
        self.deployments.lock().running.is_some()
    }
}

fn advance(
    deployments: &Mutex<Deployments>,
    bus: &EventBus,
    id: &str,
    status: Option<DeployStatus>,
    line: String,
) {
    let current = {
        let mut deployments = deployments.lock();
        let Some(state) = deployments.all.get_mut(id) else {
            return;
        };
        if let Some(status) = status {
            state.status = status;
        }
        state.logs.push(DeployLog {
            timestamp: chrono::Utc::now().timestamp_millis(),
            line: line.clone(),
        });
        let current = state.status;
        if current.is_terminal() && deployments.running.as_deref() == Some(id) {
            deployments.running = None;
        }
        current
    };
    bus.emit(SystemEvent::DeployUpdate {
        deployment_id: id.to_string(),
        status: current.as_str().to_string(),
        line: Some(line),
    });
}

#[async_trait]
impl Deployer for SimulatedDeployer {
    async fn deploy(&self, provider: DeployProvider, repo_url: &str) -> Result<String, ToolError> {
        let (owner, repo) = parse_repo_url(repo_url)?;
        let id = format!("dpl-{}", &uuid::Uuid::new_v4().simple().to_string()[..9]);

        {
            let mut deployments = self.deployments.lock();
            if deployments.running.is_some() {
                return Err(ToolError::Execution(
                    "A deployment is already in progress.".to_string(),
                ));
            }
            deployments.running = Some(id.clone());
            deployments.all.insert(
                id.clone(),
                DeployState {
                    id: id.clone(),
                    provider,
                    repo_url: repo_url.to_string(),
                    status: DeployStatus::Pending,
                    logs: Vec::new(),
                    url: None,
                },
            );
        }

        info!("Deployment {} of {}/{} to {}", id, owner, repo, provider);
        advance(
            &self.deployments,
            &self.bus,
            &id,
            None,
            format!("[{}] Starting deployment for {}", provider.as_str().to_uppercase(), repo_url),
        );

        let deployments = Arc::clone(&self.deployments);
        let bus = self.bus.clone();
        let step = self.step;
        let fail = self.fail_builds;
        let deployment_id = id.clone();
        tokio::spawn(async move {
            let id = deployment_id;
            tokio::time::sleep(step).await;
            advance(
                &deployments,
                &bus,
                &id,
                Some(DeployStatus::BuildStarted),
                format!("Cloning {}/{} and installing dependencies...", owner, repo),
            );

            tokio::time::sleep(step).await;
            if fail {
                warn!("Deployment {} failed", id);
                advance(
                    &deployments,
                    &bus,
                    &id,
                    Some(DeployStatus::Failed),
                    "Deployment failed: build exited with a non-zero status".to_string(),
                );
                return;
            }

            let url = format!("https://{}.{}", repo.to_lowercase(), provider.domain());
            if let Some(state) = deployments.lock().all.get_mut(&id) {
                state.url = Some(url.clone());
            }
            advance(
                &deployments,
                &bus,
                &id,
                Some(DeployStatus::Live),
                format!("Service is live at {}", url),
            );
        });

        Ok(id)
    }

    fn state(&self, id: &str) -> Option<DeployState> {
        self.deployments.lock().all.get(id).cloned()
    }
}

pub struct DeployAppTool {
    deployer: Arc<dyn Deployer>,
}

impl DeployAppTool {
    pub fn new(deployer: Arc<dyn Deployer>) -> Self {
        Self { deployer }
    }
}

#[async_trait]
impl Tool for DeployAppTool {
    fn name(&self) -> &str {
        "deploy_app"
    }

    fn description(&self) -> &str {
        "Deploy a GitHub repository to a cloud provider."
    }

    fn schema(&self) -> Value {
        let providers: Vec<&str> = DeployProvider::ALL.iter().map(DeployProvider::as_str).collect();
        json!({
            "type": "object",
            "properties": {
                "repoUrl": {
                    "type": "string",
                    "description": "The full URL of the GitHub repository to deploy."
                },
                "provider": {
                    "type": "string",
                    "enum": providers,
                    "description": "Cloud provider to deploy to."
                }
            },
            "required": ["repoUrl"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::Network
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let provider = match opt_str_arg(&args, "provider") {
            Some(name) => name.parse()?,
            None => DeployProvider::default(),
        };
        let id = self
            .deployer
            .deploy(provider, str_arg(&args, "repoUrl")?)
            .await?;
        Ok(json!({ "status": "initiated", "deploymentId": id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url() {
        assert_eq!(
            parse_repo_url("https://github.com/aussie/site.git").unwrap(),
            ("aussie".to_string(), "site".to_string())
        );
        assert_eq!(
            parse_repo_url("https://github.com/aussie/site/").unwrap(),
            ("aussie".to_string(), "site".to_string())
        );
        assert!(parse_repo_url("https://gitlab.com/aussie/site").is_err());
        assert!(parse_repo_url("https://github.com/aussie").is_err());
        assert!(parse_repo_url("not a url").is_err());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(DeployStatus::BuildStarted.as_str(), "build_started");
        assert_eq!(
            serde_json::to_value(DeployStatus::BuildStarted).unwrap(),
            json!("build_started")
        );
    }
}
