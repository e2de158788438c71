//! In-process notification bus.
//!
//! Listeners run synchronously, in registration order, on the thread that
//! mutated the engine. `emit` dispatches over a copy of the listener list, so
//! a listener may subscribe or unsubscribe (itself or others) while running.
//! Changes made during a dispatch take effect from the next event.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::events::Event;

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

fn lock(inner: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<Mutex<Listeners>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    pub fn emit(&self, event: &Event) {
        let snapshot: Vec<Listener> = lock(&self.inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.inner).entries.clear();
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle returned by [`NotificationBus::subscribe`].
///
/// Dropping it does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(inner) = self.bus.upgrade() else {
            return false;
        };
        let mut listeners = lock(&inner);
        let before = listeners.entries.len();
        listeners.entries.retain(|(id, _)| *id != self.id);
        listeners.entries.len() != before
    }
}
