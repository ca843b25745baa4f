use crate::bus::EventBus;
use crate::event::{Notification, NotificationLevel, SystemEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Emits [`SystemEvent::Notification`] toasts unless notifications are muted.
#[derive(Clone)]
pub struct Notifier {
    bus: EventBus,
    enabled: Arc<AtomicBool>,
}

impl Notifier {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn info(&self, title: &str, message: &str) {
        self.send(NotificationLevel::Info, title, message);
    }

    pub fn success(&self, title: &str, message: &str) {
        self.send(NotificationLevel::Success, title, message);
    }

    pub fn warning(&self, title: &str, message: &str) {
        self.send(NotificationLevel::Warning, title, message);
    }

    pub fn error(&self, title: &str, message: &str) {
        self.send(NotificationLevel::Error, title, message);
    }

    fn send(&self, level: NotificationLevel, title: &str, message: &str) {
        if !self.is_enabled() {
            return;
        }
        let now = chrono::Utc::now();
        self.bus.emit(SystemEvent::Notification(Notification {
            id: format!("ntf-{}", now.timestamp_nanos_opt().unwrap_or_default()),
            level,
            title: title.to_string(),
            message: message.to_string(),
            timestamp: now.timestamp_millis(),
        }));
    }
}
