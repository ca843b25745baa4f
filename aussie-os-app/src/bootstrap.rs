//! Composition root: builds every service once and wires them together.

use crate::config::{AppConfig, ProviderKind};
use anyhow::{Context, Result};
use aussie_os_bots::{AppRegistry, BotManager};
use aussie_os_core::{AgentOrchestrator, TerminalLog};
use aussie_os_events::{EventBus, Notifier, Subscription, SystemEvent};
use aussie_os_policy::AgentProfile;
use aussie_os_providers::{ChatProvider, GeminiProvider, OfflineProvider};
use aussie_os_shell::ShellSimulator;
use aussie_os_storage::{FileStore, KeyValueStore};
use aussie_os_swarm::{PlanningExecutor, SwarmOrchestrator};
use aussie_os_tasks::Scheduler;
use aussie_os_tools::{
    register_builtin_tools, ApmPackageManager, GithubClient, HttpGithub, OfflineGithub,
    OfflineMediaGenerator, Services, SimulatedBrowser, SimulatedDeployer, ToolRegistry,
};
use aussie_os_vfs::VirtualFileSystem;
use aussie_os_windows::WindowManager;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEPLOY_STEP: Duration = Duration::from_secs(2);

pub struct Kernel {
    pub config: AppConfig,
    pub bus: EventBus,
    pub notifier: Notifier,
    pub store: Arc<dyn KeyValueStore>,
    pub vfs: Arc<VirtualFileSystem>,
    pub shell: Arc<ShellSimulator>,
    pub windows: Arc<WindowManager>,
    pub apps: Arc<AppRegistry>,
    pub bots: Arc<BotManager>,
    pub scheduler: Arc<Scheduler>,
    pub swarm: Arc<SwarmOrchestrator>,
    pub registry: Arc<ToolRegistry>,
    pub agent: Arc<AgentOrchestrator>,
    pub terminal: TerminalLog,
    permissions_watch: Option<Subscription>,
}

/// Boot with the provider named in `config`.
pub async fn boot(config: AppConfig) -> Result<Kernel> {
    let profile = load_profile(&config).await?;
    let provider: Arc<dyn ChatProvider> = match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiProvider::from_env(
            &config.api_key_env,
            profile.model.clone(),
        )),
        ProviderKind::Offline => Arc::new(OfflineProvider),
    };
    assemble(config, profile, provider)
}

/// Boot with an explicit provider; the profile still comes from `config`.
pub async fn boot_with_provider(config: AppConfig, provider: Arc<dyn ChatProvider>) -> Result<Kernel> {
    let profile = load_profile(&config).await?;
    assemble(config, profile, provider)
}

async fn load_profile(config: &AppConfig) -> Result<AgentProfile> {
    match &config.profile {
        Some(path) => AgentProfile::load(path)
            .await
            .with_context(|| format!("Failed to load agent profile {}", path.display())),
        None => Ok(AgentProfile::default()),
    }
}

fn assemble(config: AppConfig, profile: AgentProfile, provider: Arc<dyn ChatProvider>) -> Result<Kernel> {
    let state_dir = config.state_dir();
    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::new(&state_dir)
            .with_context(|| format!("Failed to open state directory {}", state_dir.display()))?,
    );

    let bus = EventBus::new();
    let notifier = Notifier::new(bus.clone());
    notifier.set_enabled(config.permissions.notifications);

    let vfs = Arc::new(VirtualFileSystem::with_store(bus.clone(), Arc::clone(&store)));
    let shell = Arc::new(ShellSimulator::new(Arc::clone(&vfs), bus.clone()));
    let windows = Arc::new(WindowManager::new(bus.clone()));
    let apps = Arc::new(AppRegistry::with_store(bus.clone(), Arc::clone(&store)));

    let bots = Arc::new(BotManager::new(bus.clone()));
    for app in apps.installed() {
        if let Some(bot_config) = app.bot_config {
            bots.register_bot(&app.id, &app.name, bot_config);
        }
    }
    info!("Restored {} bot(s)", bots.bots().len());

    let swarm = Arc::new(SwarmOrchestrator::new(
        Arc::new(PlanningExecutor::new(Arc::clone(&provider))),
        config.swarm.clone(),
        bus.clone(),
    ));
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&vfs),
        Arc::clone(&shell),
        Arc::clone(&swarm),
        bus.clone(),
        notifier.clone(),
    ));

    let github: Arc<dyn GithubClient> = match HttpGithub::from_env(&config.github_token_env) {
        Some(client) => Arc::new(client),
        None => {
            info!("{} not set, GitHub operations stay offline", config.github_token_env);
            Arc::new(OfflineGithub::new())
        }
    };

    let services = Services {
        bus: bus.clone(),
        notifier: notifier.clone(),
        vfs: Arc::clone(&vfs),
        shell: Arc::clone(&shell),
        windows: Arc::clone(&windows),
        apps: Arc::clone(&apps),
        bots: Arc::clone(&bots),
        scheduler: Arc::clone(&scheduler),
        swarm: Arc::clone(&swarm),
        deployer: Arc::new(SimulatedDeployer::new(bus.clone(), DEPLOY_STEP)),
        browser: Arc::new(SimulatedBrowser::new(bus.clone())),
        github,
        media: Arc::new(OfflineMediaGenerator),
        packages: Arc::new(ApmPackageManager::new(Arc::clone(&vfs), bus.clone())),
        store: Some(Arc::clone(&store)),
    };
    let mut registry = ToolRegistry::new(bus.clone(), config.permissions.clone());
    register_builtin_tools(&mut registry, &services);
    let registry = Arc::new(registry);

    let weak = Arc::downgrade(&registry);
    let gate = notifier.clone();
    let permissions_watch = bus.subscribe(move |event| {
        if let SystemEvent::PermissionsChanged = event {
            if let Some(registry) = weak.upgrade() {
                gate.set_enabled(registry.permissions().notifications);
            }
        }
    });

    let agent = AgentOrchestrator::new(
        provider,
        Arc::clone(&registry),
        bus.clone(),
        notifier.clone(),
        profile,
    )?;
    let terminal = TerminalLog::attach(&bus);

    info!(
        "Kernel ready: {} tools, agent '{}' on {}",
        registry.list().len(),
        agent.profile().id,
        agent.provider_name()
    );

    Ok(Kernel {
        config,
        bus,
        notifier,
        store,
        vfs,
        shell,
        windows,
        apps,
        bots,
        scheduler,
        swarm,
        registry,
        agent,
        terminal,
        permissions_watch: Some(permissions_watch),
    })
}

impl Kernel {
    /// Start the scheduler and bot timers.
    pub fn start_background(&self) {
        self.scheduler
            .start(Duration::from_millis(self.config.scheduler_tick_ms));
        self.bots.start(Duration::from_millis(self.config.bot_tick_ms));
    }

    /// Stop timers and in-flight work, then flush state to disk.
    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        self.bots.stop();
        self.agent.stop();
        self.vfs.flush();
        self.terminal.detach();
        if let Some(watch) = self.permissions_watch.take() {
            if !watch.unsubscribe() {
                warn!("Permission watcher was already removed");
            }
        }
        info!("Kernel shut down");
    }
}
