use crate::app_tools::CreateBotAppTool;
use crate::browser::{
    Browser, BrowserClickTool, BrowserNavigateTool, BrowserScrapeTool, BrowserScreenshotTool,
};
use crate::deploy::{DeployAppTool, Deployer};
use crate::file_tools::{FileListTool, FileReadTool, FileWriteTool};
use crate::github::{GithubClient, GithubOpsTool};
use crate::media::{MediaGenTool, MediaGenerator};
use crate::packages::PackageManager;
use crate::process_tools::{ApmInstallTool, ShellExecTool};
use crate::registry::ToolRegistry;
use crate::system_tools::{IdleTool, MessageNotifyUserTool, SwitchViewTool};
use crate::task_tools::{ScheduleTaskTool, SwarmExecuteTool};
use aussie_os_bots::{AppRegistry, BotManager};
use aussie_os_events::{EventBus, Notifier};
use aussie_os_shell::ShellSimulator;
use aussie_os_storage::KeyValueStore;
use aussie_os_swarm::SwarmOrchestrator;
use aussie_os_tasks::Scheduler;
use aussie_os_vfs::VirtualFileSystem;
use aussie_os_windows::WindowManager;
use std::sync::Arc;
use tracing::info;

/// Everything the built-in tools act on.
#[derive(Clone)]
pub struct Services {
    pub bus: EventBus,
    pub notifier: Notifier,
    pub vfs: Arc<VirtualFileSystem>,
    pub shell: Arc<ShellSimulator>,
    pub windows: Arc<WindowManager>,
    pub apps: Arc<AppRegistry>,
    pub bots: Arc<BotManager>,
    pub scheduler: Arc<Scheduler>,
    pub swarm: Arc<SwarmOrchestrator>,
    pub deployer: Arc<dyn Deployer>,
    pub browser: Arc<dyn Browser>,
    pub github: Arc<dyn GithubClient>,
    pub media: Arc<dyn MediaGenerator>,
    pub packages: Arc<dyn PackageManager>,
    /// Where `switch_view` records the last view.
    pub store: Option<Arc<dyn KeyValueStore>>,
}

pub fn register_builtin_tools(registry: &mut ToolRegistry, services: &Services) {
    let s = services;

    registry.register(Arc::new(MessageNotifyUserTool));
    registry.register(Arc::new(SwitchViewTool::new(s.bus.clone(), s.store.clone())));
    registry.register(Arc::new(IdleTool));

    registry.register(Arc::new(FileReadTool::new(s.vfs.clone())));
    registry.register(Arc::new(FileWriteTool::new(s.vfs.clone())));
    registry.register(Arc::new(FileListTool::new(s.vfs.clone())));

    registry.register(Arc::new(ShellExecTool::new(s.shell.clone())));
    registry.register(Arc::new(ApmInstallTool::new(s.packages.clone())));

    registry.register(Arc::new(CreateBotAppTool::new(
        s.apps.clone(),
        s.bots.clone(),
        s.vfs.clone(),
        s.windows.clone(),
        s.bus.clone(),
    )));

    registry.register(Arc::new(DeployAppTool::new(s.deployer.clone())));
    registry.register(Arc::new(GithubOpsTool::new(s.github.clone())));
    registry.register(Arc::new(MediaGenTool::new(
        s.media.clone(),
        s.vfs.clone(),
        s.bus.clone(),
        s.notifier.clone(),
    )));

    registry.register(Arc::new(BrowserNavigateTool::new(s.browser.clone())));
    registry.register(Arc::new(BrowserClickTool::new(s.browser.clone())));
    registry.register(Arc::new(BrowserScrapeTool::new(s.browser.clone())));
    registry.register(Arc::new(BrowserScreenshotTool::new(s.browser.clone())));

    registry.register(Arc::new(ScheduleTaskTool::new(s.scheduler.clone())));
    registry.register(Arc::new(SwarmExecuteTool::new(s.swarm.clone())));

    info!("Registered {} built-in tools", registry.list().len());
}
