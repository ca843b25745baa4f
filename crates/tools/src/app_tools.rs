use crate::traits::{opt_str_arg, str_arg, Tool, ToolContext, ToolError};
use aussie_os_bots::{AppRegistry, BotManager, NewBotApp};
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_policy::Capability;
use aussie_os_storage::MainView;
use aussie_os_vfs::VirtualFileSystem;
use aussie_os_windows::WindowManager;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const DESKTOP: &str = "/home/aussie/Desktop";

/// Creates a bot app end to end: catalogue entry, bot instance, desktop
/// shortcut and an open window.
pub struct CreateBotAppTool {
    apps: Arc<AppRegistry>,
    bots: Arc<BotManager>,
    vfs: Arc<VirtualFileSystem>,
    windows: Arc<WindowManager>,
    bus: EventBus,
}

impl CreateBotAppTool {
    pub fn new(
        apps: Arc<AppRegistry>,
        bots: Arc<BotManager>,
        vfs: Arc<VirtualFileSystem>,
        windows: Arc<WindowManager>,
        bus: EventBus,
    ) -> Self {
        Self {
            apps,
            bots,
            vfs,
            windows,
            bus,
        }
    }
}

#[async_trait]
impl Tool for CreateBotAppTool {
    fn name(&self) -> &str {
        "create_bot_app"
    }

    fn description(&self) -> &str {
        "Create and register a new Bot Application in the OS Registry."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "App Name (e.g. 'Cricket Pro')" },
                "description": { "type": "string", "description": "App Description" },
                "sport": { "type": "string", "description": "Sport category key (e.g. 'cricket')" },
                "themeColor": { "type": "string", "description": "Tailwind BG color class (e.g. 'bg-green-600')" }
            },
            "required": ["name", "description", "sport"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::FsWrite
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let app = self.apps.create_bot_app(NewBotApp {
            name: str_arg(&args, "name")?.to_string(),
            description: str_arg(&args, "description")?.to_string(),
            sport: str_arg(&args, "sport")?.to_string(),
            theme_color: opt_str_arg(&args, "themeColor").map(str::to_string),
        })?;

        if let Some(config) = app.bot_config.clone() {
            self.bots.register_bot(&app.id, &app.name, config);
        }

        let shortcut = format!("{}/{}.lnk", DESKTOP, app.name.replace('/', "-"));
        self.vfs
            .write_file(&shortcut, &format!("app-window:{}", app.id), false)?;
        self.windows.open_window(&app.id, &app.name, None);
        self.bus.emit(SystemEvent::SwitchView {
            view: MainView::Dashboard.to_string(),
        });

        info!("Bot app {} installed to {}", app.id, shortcut);
        Ok(json!({
            "status": "created",
            "appId": app.id,
            "message": format!("App \"{}\" created, installed to Desktop, and launched.", app.name),
        }))
    }
}
