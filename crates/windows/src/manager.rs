use crate::window::*;
use aussie_os_events::{EventBus, SystemEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Window not found: {0}")]
    NotFound(String),
}

type SnapshotListener = Arc<dyn Fn(&[OSWindow]) + Send + Sync>;

const FIRST_Z_INDEX: u64 = 100;

struct State {
    windows: Vec<OSWindow>,
    top_z_index: u64,
}

/// Registry of open windows. Every mutation broadcasts the full window list
/// to subscribers; there are no partial updates.
pub struct WindowManager {
    state: Mutex<State>,
    listeners: Mutex<Vec<(u64, SnapshotListener)>>,
    next_listener: Mutex<u64>,
    bus: EventBus,
}

impl WindowManager {
    pub fn new(bus: EventBus) -> Self {
        Self {
            state: Mutex::new(State {
                windows: Vec::new(),
                top_z_index: FIRST_Z_INDEX,
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: Mutex::new(0),
            bus,
        }
    }

    /// Register a listener. It is called right away with the current
    /// windows, then after every change. Returns an id for `unsubscribe`.
    pub fn subscribe<F>(&self, listener: F) -> u64
    where
        F: Fn(&[OSWindow]) + Send + Sync + 'static,
    {
        let listener: SnapshotListener = Arc::new(listener);
        let id = {
            let mut next = self.next_listener.lock();
            *next += 1;
            *next
        };
        self.listeners.lock().push((id, Arc::clone(&listener)));
        let current = self.windows();
        listener(&current);
        id
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn windows(&self) -> Vec<OSWindow> {
        self.state.lock().windows.clone()
    }

    pub fn get(&self, id: &str) -> Option<OSWindow> {
        self.state.lock().windows.iter().find(|w| w.id == id).cloned()
    }

    pub fn find_by_app(&self, app_id: &str) -> Option<OSWindow> {
        self.state
            .lock()
            .windows
            .iter()
            .find(|w| w.app_id == app_id)
            .cloned()
    }

    /// Highest visible window.
    pub fn topmost(&self) -> Option<OSWindow> {
        self.state
            .lock()
            .windows
            .iter()
            .filter(|w| !w.is_minimized)
            .max_by_key(|w| w.z_index)
            .cloned()
    }

    /// Open a window for `app_id`, or focus and restore the one already open.
    /// Returns the window id.
    pub fn open_window(&self, app_id: &str, title: &str, props: Option<serde_json::Value>) -> String {
        let (id, created) = {
            let mut state = self.state.lock();
            state.top_z_index += 1;
            let z_index = state.top_z_index;

            if let Some(existing) = state.windows.iter_mut().find(|w| w.app_id == app_id) {
                existing.z_index = z_index;
                existing.is_minimized = false;
                (existing.id.clone(), false)
            } else {
                let offset = CASCADE_ORIGIN + CASCADE_STEP * state.windows.len() as i32;
                let id = uuid::Uuid::new_v4().simple().to_string()[..9].to_string();
                state.windows.push(OSWindow {
                    id: id.clone(),
                    app_id: app_id.to_string(),
                    title: title.to_string(),
                    x: offset,
                    y: offset,
                    width: DEFAULT_WIDTH,
                    height: DEFAULT_HEIGHT,
                    is_minimized: false,
                    is_maximized: false,
                    z_index,
                    props,
                });
                (id, true)
            }
        };

        debug!("Window {} for {} ({})", id, app_id, if created { "opened" } else { "focused" });
        if created {
            self.bus.emit(SystemEvent::OpenWindow {
                window_id: id.clone(),
                app_id: app_id.to_string(),
            });
        }
        self.notify();
        id
    }

    pub fn close_window(&self, id: &str) -> Result<(), WindowError> {
        {
            let mut state = self.state.lock();
            let before = state.windows.len();
            state.windows.retain(|w| w.id != id);
            if state.windows.len() == before {
                return Err(WindowError::NotFound(id.to_string()));
            }
        }
        self.notify();
        Ok(())
    }

    pub fn focus_window(&self, id: &str) -> Result<(), WindowError> {
        self.update(id, |window, z_index| window.z_index = z_index)
    }

    pub fn move_window(&self, id: &str, x: i32, y: i32) -> Result<(), WindowError> {
        self.update(id, |window, _| {
            window.x = x;
            window.y = y;
        })
    }

    /// Resize, clamped to the minimum window size.
    pub fn resize_window(&self, id: &str, width: u32, height: u32) -> Result<(), WindowError> {
        self.update(id, |window, _| {
            window.width = width.max(MIN_WIDTH);
            window.height = height.max(MIN_HEIGHT);
        })
    }

    pub fn minimize_window(&self, id: &str, minimized: bool) -> Result<(), WindowError> {
        self.update(id, |window, _| window.is_minimized = minimized)
    }

    /// Toggle maximized.
    pub fn maximize_window(&self, id: &str) -> Result<(), WindowError> {
        self.update(id, |window, _| window.is_maximized = !window.is_maximized)
    }

    /// Apply `change` to one window. Only `focus_window` consumes the fresh
    /// z-index it is handed; the counter is bumped for focus alone.
    fn update<F>(&self, id: &str, change: F) -> Result<(), WindowError>
    where
        F: FnOnce(&mut OSWindow, u64),
    {
        {
            let mut state = self.state.lock();
            let next_z = state.top_z_index + 1;
            let window = state
                .windows
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or_else(|| WindowError::NotFound(id.to_string()))?;
            let before = window.z_index;
            change(window, next_z);
            if window.z_index != before {
                state.top_z_index = next_z;
            }
        }
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        let snapshot = self.windows();
        let listeners: Vec<SnapshotListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_window_defaults() {
        let wm = WindowManager::new(EventBus::new());
        let id = wm.open_window("terminal", "Terminal", None);
        let window = wm.get(&id).unwrap();
        assert_eq!(window.z_index, 101);
        assert_eq!((window.x, window.y), (50, 50));
        assert_eq!((window.width, window.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(window.state(), WindowState::Normal);
    }

    #[test]
    fn test_move_does_not_touch_z_index() {
        let wm = WindowManager::new(EventBus::new());
        let id = wm.open_window("terminal", "Terminal", None);
        wm.move_window(&id, 10, 20).unwrap();
        let next = wm.open_window("browser", "Browser", None);
        assert_eq!(wm.get(&next).unwrap().z_index, 102);
    }
}
