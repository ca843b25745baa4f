use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid profile: {0}")]
    Invalid(String),
}

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are Jules, the resident developer agent of Aussie OS.

You act on the operating system directly through tools: read and write files \
in the virtual filesystem, run shell commands (git, npm, apm), open views, \
browse the web, generate media, schedule tasks and deploy apps.

- When asked for an app, call create_bot_app right away.
- Keep the user informed with message_notify_user during long tasks.
- When a tool returns an error, read it and try again with corrected arguments.
- Save code with file_write, then switch_view to 'code' so the user can see it.
- Call idle once the request is fully handled.
";

/// Who the agent is and how far it may go in a single turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentProfile {
    pub id: String,
    /// Sender label on model messages.
    pub display_name: String,
    pub system_instruction: String,
    pub model: String,
    pub max_iterations: usize,
    pub max_rate_limit_retries: u32,
    /// Empty means every registered tool.
    pub allowed_tools: Vec<String>,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            id: "jules".to_string(),
            display_name: "Jules".to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            model: "gemini-3-pro-preview".to_string(),
            max_iterations: 10,
            max_rate_limit_retries: 3,
            allowed_tools: Vec::new(),
        }
    }
}

impl AgentProfile {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let content = tokio::fs::read_to_string(&path).await?;
        Self::from_yaml(&content)
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PolicyError> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn from_yaml(content: &str) -> Result<Self, PolicyError> {
        let profile: AgentProfile = serde_yaml::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_iterations == 0 {
            return Err(PolicyError::Invalid("max_iterations must be at least 1".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(PolicyError::Invalid("model must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn is_tool_allowed(&self, name: &str) -> bool {
        self.allowed_tools.is_empty() || self.allowed_tools.iter().any(|t| t == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let profile = AgentProfile::from_yaml("max_iterations: 4\nallowed_tools: [file_read, idle]\n").unwrap();
        assert_eq!(profile.max_iterations, 4);
        assert_eq!(profile.max_rate_limit_retries, 3);
        assert_eq!(profile.display_name, "Jules");
        assert!(profile.is_tool_allowed("idle"));
        assert!(!profile.is_tool_allowed("shell_exec"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = AgentProfile::from_yaml("max_iterations: 0\n");
        assert!(matches!(result, Err(PolicyError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_profile_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jules.yaml");

        let mut profile = AgentProfile::default();
        profile.model = "gemini-2.5-flash".to_string();
        profile.save(&path).await.unwrap();

        let loaded = AgentProfile::load(&path).await.unwrap();
        assert_eq!(loaded, profile);
    }
}
