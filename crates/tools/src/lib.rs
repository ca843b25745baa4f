pub mod app_tools;
pub mod browser;
pub mod builtin;
pub mod deploy;
pub mod file_tools;
pub mod github;
pub mod media;
pub mod packages;
pub mod process_tools;
pub mod registry;
pub mod schema;
pub mod system_tools;
pub mod task_tools;
pub mod traits;

pub use browser::{Browser, SimulatedBrowser};
pub use builtin::{register_builtin_tools, Services};
pub use deploy::{DeployProvider, DeployState, DeployStatus, Deployer, SimulatedDeployer};
pub use github::{GithubClient, GithubOperation, HttpGithub, OfflineGithub};
pub use media::{MediaGenerator, MediaService, OfflineMediaGenerator};
pub use packages::{ApmPackageManager, PackageManager};
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolContext, ToolEffect, ToolError, ToolResult};
