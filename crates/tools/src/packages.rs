use crate::traits::ToolError;
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_vfs::VirtualFileSystem;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub const APM_ROOT: &str = "/usr/lib/apm";

/// Installs agent packages into the simulated system.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Install `package`, returning a human-readable summary.
    async fn install(&self, package: &str) -> Result<String, ToolError>;

    fn installed(&self) -> Vec<String>;
}

/// Records each package as `/usr/lib/apm/<name>/manifest.json`.
pub struct ApmPackageManager {
    vfs: Arc<VirtualFileSystem>,
    bus: EventBus,
}

impl ApmPackageManager {
    pub fn new(vfs: Arc<VirtualFileSystem>, bus: EventBus) -> Self {
        Self { vfs, bus }
    }

    fn manifest_path(package: &str) -> String {
        format!("{}/{}/manifest.json", APM_ROOT, package)
    }
}

fn valid_package_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 214
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
}

#[async_trait]
impl PackageManager for ApmPackageManager {
    async fn install(&self, package: &str) -> Result<String, ToolError> {
        let package = package.trim();
        if !valid_package_name(package) {
            return Err(ToolError::Validation(format!(
                "invalid package name '{}'",
                package
            )));
        }

        let manifest = Self::manifest_path(package);
        if self.vfs.exists(&manifest) {
            return Ok(format!("{} is already installed.", package));
        }

        self.bus
            .emit(SystemEvent::ShellOutput(format!("[apm] Resolving {}...", package)));
        let body = json!({
            "name": package,
            "version": "latest",
            "installedAt": chrono::Utc::now().to_rfc3339(),
        });
        self.vfs
            .write_file(&manifest, &serde_json::to_string_pretty(&body).unwrap_or_default(), false)?;

        info!("apm installed {}", package);
        self.bus
            .emit(SystemEvent::ShellOutput(format!("[apm] Installed {}", package)));
        Ok(format!("Package {} installed to {}/{}", package, APM_ROOT, package))
    }

    fn installed(&self) -> Vec<String> {
        self.vfs
            .read_dir(APM_ROOT)
            .map(|entries| entries.into_iter().map(|e| e.name).collect())
            .unwrap_or_default()
    }
}
