//! Desktop shell state that survives restarts.
//!
//! Every entry is loaded independently; a missing or corrupt entry falls back
//! to its default and never fails the whole load.

use crate::store::{load_or_default, save, KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub mod keys {
    pub const DASHBOARD_LAYOUT: &str = "dashboard_layout";
    pub const DESKTOP_ICONS: &str = "desktop_icons";
    pub const APP_REGISTRY: &str = "app_registry";
    pub const SIDEBAR_COLLAPSED: &str = "sidebar_collapsed";
    pub const LAST_VIEW: &str = "last_view";
    pub const EXPLORER_EXPANDED: &str = "explorer_expanded";
    pub const VFS_TREE: &str = "vfs.tree";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MainView {
    #[default]
    Dashboard,
    Code,
    Flow,
    Browser,
    Scheduler,
    Github,
    Settings,
    Deploy,
    Projects,
    Marketplace,
}

impl MainView {
    pub const ALL: [MainView; 10] = [
        MainView::Dashboard,
        MainView::Code,
        MainView::Flow,
        MainView::Browser,
        MainView::Scheduler,
        MainView::Github,
        MainView::Settings,
        MainView::Deploy,
        MainView::Projects,
        MainView::Marketplace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MainView::Dashboard => "dashboard",
            MainView::Code => "code",
            MainView::Flow => "flow",
            MainView::Browser => "browser",
            MainView::Scheduler => "scheduler",
            MainView::Github => "github",
            MainView::Settings => "settings",
            MainView::Deploy => "deploy",
            MainView::Projects => "projects",
            MainView::Marketplace => "marketplace",
        }
    }
}

impl fmt::Display for MainView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MainView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MainView::ALL
            .into_iter()
            .find(|view| view.as_str() == s)
            .ok_or_else(|| format!("Unknown view: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Clock,
    System,
    Network,
    Weather,
    Note,
    Todo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesktopIcon {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub dashboard_layout: Vec<Widget>,
    pub desktop_icons: BTreeMap<String, DesktopIcon>,
    pub sidebar_collapsed: bool,
    pub last_view: MainView,
    pub explorer_expanded: BTreeSet<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            dashboard_layout: default_layout(),
            desktop_icons: BTreeMap::new(),
            sidebar_collapsed: false,
            last_view: MainView::Dashboard,
            explorer_expanded: BTreeSet::from(["/workspace".to_string()]),
        }
    }
}

fn default_layout() -> Vec<Widget> {
    [
        ("clock", WidgetType::Clock, 20, 20),
        ("system", WidgetType::System, 20, 220),
        ("network", WidgetType::Network, 340, 20),
    ]
    .into_iter()
    .map(|(id, widget_type, x, y)| Widget {
        id: id.to_string(),
        widget_type,
        x,
        y,
        data: None,
    })
    .collect()
}

impl UiState {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        let dashboard_layout: Option<Vec<Widget>> = load_or_default(store, keys::DASHBOARD_LAYOUT);
        let last_view: Option<MainView> = load_or_default(store, keys::LAST_VIEW);
        let explorer_expanded: Option<BTreeSet<String>> =
            load_or_default(store, keys::EXPLORER_EXPANDED);

        Self {
            dashboard_layout: dashboard_layout.unwrap_or(defaults.dashboard_layout),
            desktop_icons: load_or_default(store, keys::DESKTOP_ICONS),
            sidebar_collapsed: load_or_default(store, keys::SIDEBAR_COLLAPSED),
            last_view: last_view.unwrap_or(defaults.last_view),
            explorer_expanded: explorer_expanded.unwrap_or(defaults.explorer_expanded),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        save(store, keys::DASHBOARD_LAYOUT, &self.dashboard_layout)?;
        save(store, keys::DESKTOP_ICONS, &self.desktop_icons)?;
        save(store, keys::SIDEBAR_COLLAPSED, &self.sidebar_collapsed)?;
        save(store, keys::LAST_VIEW, &self.last_view)?;
        save(store, keys::EXPLORER_EXPANDED, &self.explorer_expanded)?;
        Ok(())
    }

    pub fn record_view(store: &dyn KeyValueStore, view: MainView) -> Result<(), StorageError> {
        save(store, keys::LAST_VIEW, &view)
    }
}
