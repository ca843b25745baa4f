use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 500;
pub const MIN_WIDTH: u32 = 200;
pub const MIN_HEIGHT: u32 = 150;
pub const CASCADE_ORIGIN: i32 = 50;
pub const CASCADE_STEP: i32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OSWindow {
    pub id: String,
    pub app_id: String,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_minimized: bool,
    pub is_maximized: bool,
    pub z_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
}

impl OSWindow {
    /// Minimized wins over maximized: a maximized window that is minimized
    /// shows as minimized and comes back maximized.
    pub fn state(&self) -> WindowState {
        if self.is_minimized {
            WindowState::Minimized
        } else if self.is_maximized {
            WindowState::Maximized
        } else {
            WindowState::Normal
        }
    }
}
