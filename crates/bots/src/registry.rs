use crate::bot::BotAppConfig;
use crate::BotError;
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_storage::{keys, load_or_default, save, KeyValueStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppCategory {
    Sports,
    Finance,
    Utility,
    Dev,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: AppCategory,
    pub version: String,
    pub author: String,
    pub installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_config: Option<BotAppConfig>,
}

/// Input for [`AppRegistry::create_bot_app`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBotApp {
    pub name: String,
    pub description: String,
    pub sport: String,
    #[serde(default)]
    pub theme_color: Option<String>,
}

/// Catalogue of desktop apps, built-in and agent-created.
///
/// Only the catalogue is persisted; built-ins are re-seeded at boot and take
/// their `installed` flag from storage.
pub struct AppRegistry {
    apps: Mutex<Vec<AppDefinition>>,
    store: Option<Arc<dyn KeyValueStore>>,
    bus: EventBus,
}

impl AppRegistry {
    pub fn new(bus: EventBus) -> Self {
        Self {
            apps: Mutex::new(default_catalogue()),
            store: None,
            bus,
        }
    }

    pub fn with_store(bus: EventBus, store: Arc<dyn KeyValueStore>) -> Self {
        let mut apps = default_catalogue();
        let stored: Vec<AppDefinition> = load_or_default(store.as_ref(), keys::APP_REGISTRY);
        for app in stored {
            match apps.iter_mut().find(|a| a.id == app.id) {
                Some(existing) => existing.installed = app.installed,
                None => apps.push(app),
            }
        }
        Self {
            apps: Mutex::new(apps),
            store: Some(store),
            bus,
        }
    }

    pub fn apps(&self) -> Vec<AppDefinition> {
        self.apps.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<AppDefinition> {
        self.apps.lock().iter().find(|a| a.id == id).cloned()
    }

    pub fn installed(&self) -> Vec<AppDefinition> {
        self.apps.lock().iter().filter(|a| a.installed).cloned().collect()
    }

    pub fn set_installed(&self, id: &str, installed: bool) -> Result<(), BotError> {
        {
            let mut apps = self.apps.lock();
            let app = apps
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| BotError::AppNotFound(id.to_string()))?;
            app.installed = installed;
        }
        self.persist();
        self.bus.emit(SystemEvent::AppInstalled {
            id: id.to_string(),
            installed,
        });
        Ok(())
    }

    /// Register a custom sports bot app, installed right away.
    pub fn create_bot_app(&self, new: NewBotApp) -> Result<AppDefinition, BotError> {
        let slug = slugify(&new.name);
        if slug.is_empty() {
            return Err(BotError::InvalidApp("name must not be empty".to_string()));
        }
        if new.sport.trim().is_empty() {
            return Err(BotError::InvalidApp("sport must not be empty".to_string()));
        }

        let millis = chrono::Utc::now().timestamp_millis().rem_euclid(10_000);
        let app = AppDefinition {
            id: format!("{}-bot-{:04}", slug, millis),
            name: new.name.clone(),
            description: new.description,
            category: AppCategory::Sports,
            version: "1.0.0".to_string(),
            author: "Jules Agent".to_string(),
            installed: true,
            price: Some("$0.00".to_string()),
            bot_config: Some(BotAppConfig::themed(
                &new.sport,
                &new.name,
                new.theme_color.as_deref(),
            )),
        };

        {
            let mut apps = self.apps.lock();
            apps.retain(|a| a.id != app.id);
            apps.push(app.clone());
        }
        self.persist();
        info!("Created bot app {}", app.id);
        self.bus.emit(SystemEvent::AppCreated {
            id: app.id.clone(),
            name: app.name.clone(),
        });
        Ok(app)
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let apps = self.apps.lock().clone();
        if let Err(e) = save(store.as_ref(), keys::APP_REGISTRY, &apps) {
            warn!("Failed to save app registry: {}", e);
        }
    }
}

/// Lowercase, whitespace runs collapsed to `-`.
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn default_catalogue() -> Vec<AppDefinition> {
    let system = |id: &str, name: &str, description: &str, version: &str| AppDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: AppCategory::Finance,
        version: version.to_string(),
        author: "Jules System".to_string(),
        installed: true,
        price: Some("$0.00".to_string()),
        bot_config: None,
    };
    let sports = |id: &str, name: &str, description: &str, version: &str, sport: &str, title: &str, theme: &str| {
        AppDefinition {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: AppCategory::Sports,
            version: version.to_string(),
            author: "Aussie Sports".to_string(),
            installed: false,
            price: Some("$0.00".to_string()),
            bot_config: Some(BotAppConfig::themed(sport, title, Some(theme))),
        }
    };

    vec![
        system(
            "hyperliquid-terminal",
            "Hyperliquid Terminal",
            "High-frequency trading terminal with backtesting and simulated live execution.",
            "1.2.0",
        ),
        system(
            "bot-dashboard",
            "Command Center",
            "Central hub for managing all active trading bots and P&L.",
            "1.0.0",
        ),
        sports("nba-bot", "NBA Courtside AI", "Real-time NBA prediction and stats engine.", "2.1.0", "nba", "NBA Courtside", "bg-orange-500"),
        sports("soccer-bot", "Global Soccer Scout", "Live match tracking for EPL, La Liga, and MLS.", "1.4.2", "soccer", "Soccer Scout", "bg-green-500"),
        sports("nfl-bot", "Gridiron Analytics", "Advanced NFL stats and play prediction.", "3.0.1", "nfl", "Gridiron AI", "bg-blue-600"),
        sports("tennis-bot", "Ace Tennis Tracker", "Point-by-point analysis for Grand Slams.", "1.0.5", "tennis", "Ace Tracker", "bg-yellow-500"),
        sports("tt-bot", "Ping Pong Pro", "Table tennis live scoring and tournament brackets.", "1.1.0", "tt", "Ping Pong Pro", "bg-purple-500"),
    ]
}
