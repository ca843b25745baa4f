//! Process-wide publish/subscribe hub for the simulated desktop.
//!
//! Services never hold references to each other's observers; they emit
//! [`SystemEvent`]s on a shared [`EventBus`] and whoever cares subscribes.

pub mod bus;
pub mod event;
pub mod notify;

pub use bus::{EventBus, ListenerId, Subscription};
pub use event::{EventKind, FileChangeKind, Notification, NotificationLevel, SystemEvent};
pub use notify::Notifier;
