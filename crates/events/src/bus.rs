use crate::event::{EventKind, SystemEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::error;

type Listener = Arc<dyn Fn(&SystemEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    global: Vec<(ListenerId, Listener)>,
    typed: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
}

impl Registry {
    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

/// Synchronous, in-process publish/subscribe hub.
///
/// Cloning is cheap and every clone shares the same listener registry.
/// Delivery order for one `emit`: global listeners in registration order,
/// then typed listeners for the event's kind in registration order.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

/// Handle returned by [`EventBus::subscribe`].
pub struct Subscription {
    id: ListenerId,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.lock();
        let before = registry.global.len();
        registry.global.retain(|(id, _)| *id != self.id);
        registry.global.len() != before
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SystemEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry.global.push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a listener for one event kind only.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&SystemEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.allocate();
        registry
            .typed
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    pub fn off(&self, kind: EventKind, id: ListenerId) {
        let mut registry = self.registry.lock();
        if let Some(listeners) = registry.typed.get_mut(&kind) {
            listeners.retain(|(listener_id, _)| *listener_id != id);
        }
    }

    pub fn clear_kind(&self, kind: EventKind) {
        self.registry.lock().typed.remove(&kind);
    }

    pub fn clear_all(&self) {
        let mut registry = self.registry.lock();
        registry.global.clear();
        registry.typed.clear();
    }

    pub fn listener_count(&self) -> usize {
        let registry = self.registry.lock();
        registry.global.len() + registry.typed.values().map(Vec::len).sum::<usize>()
    }

    /// Deliver `event` to every interested listener.
    ///
    /// Listeners run outside the registry lock, so they may emit or
    /// (un)subscribe themselves. A panicking listener is logged and skipped.
    pub fn emit(&self, event: SystemEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = {
            let registry = self.registry.lock();
            registry
                .global
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .chain(
                    registry
                        .typed
                        .get(&kind)
                        .into_iter()
                        .flatten()
                        .map(|(_, listener)| Arc::clone(listener)),
                )
                .collect()
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                error!("Event listener panicked while handling {:?}", kind);
            }
        }
    }
}
