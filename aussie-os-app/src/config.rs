use anyhow::{Context, Result};
use aussie_os_policy::KernelPermissions;
use aussie_os_swarm::SwarmConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "aussie-os.yaml";
pub const LOG_ENV: &str = "AUSSIE_OS_LOG";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    /// No model; every turn answers with a fixed notice.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub provider: ProviderKind,
    pub api_key_env: String,
    /// Agent profile YAML; the built-in profile when unset.
    pub profile: Option<PathBuf>,
    pub permissions: KernelPermissions,
    pub swarm: SwarmConfig,
    pub scheduler_tick_ms: u64,
    pub bot_tick_ms: u64,
    pub github_token_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: "info".to_string(),
            provider: ProviderKind::Gemini,
            api_key_env: "GEMINI_API_KEY".to_string(),
            profile: None,
            permissions: KernelPermissions::default(),
            swarm: SwarmConfig::default(),
            scheduler_tick_ms: 1000,
            bot_tick_ms: 2000,
            github_token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("aussie-os")
}

pub fn default_config_path() -> PathBuf {
    default_data_dir().join(CONFIG_FILE)
}

impl AppConfig {
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler_tick_ms == 0 || self.bot_tick_ms == 0 {
            anyhow::bail!("Tick periods must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.swarm.consensus_threshold) {
            anyhow::bail!(
                "Consensus threshold must be between 0 and 1, got {}",
                self.swarm.consensus_threshold
            );
        }
        Ok(())
    }

    /// `AUSSIE_OS_LOG` wins over the configured level.
    pub fn effective_log_level(&self) -> String {
        std::env::var(LOG_ENV)
            .ok()
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| self.log_level.clone())
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aussie_os_policy::{Access, FsAccess};

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.scheduler_tick_ms, 1000);
        assert_eq!(config.bot_tick_ms, 2000);
        assert!(config.profile.is_none());
        assert!(config.data_dir.ends_with("aussie-os"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            r#"
provider: offline
log_level: debug
permissions:
  shell: deny
  fs: read
"#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Offline);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.permissions.shell, Access::Deny);
        assert_eq!(config.permissions.fs, FsAccess::Read);
        assert_eq!(config.permissions.network, Access::Allow);
        assert_eq!(config.bot_tick_ms, 2000);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = AppConfig::from_yaml("swarm:\n  consensus_threshold: 1.5\n").unwrap_err();
        assert!(err.to_string().contains("Consensus threshold"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(AppConfig::from_yaml("provider: openai\n").is_err());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }
}
