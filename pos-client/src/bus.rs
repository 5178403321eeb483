//! Typed pub/sub event bus
//!
//! Maps an [`EventKind`] to an ordered list of handlers. `publish`
//! invokes all handlers for the event's kind synchronously, in
//! subscription order. Kept separate from the network object so
//! dispatch logic is testable without a socket.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use shared::event::{EventKind, SyncEvent};

type Handler = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// In-process publish/subscribe registry
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind; handlers for the same
    /// kind run in registration order
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler; returns whether it was registered
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock().unwrap();
        if let Some(list) = handlers.get_mut(&kind) {
            let before = list.len();
            list.retain(|(sub_id, _)| *sub_id != id);
            return list.len() != before;
        }
        false
    }

    /// Invoke every handler registered for the event's kind,
    /// synchronously, in registration order
    pub fn publish(&self, event: &SyncEvent) {
        let handlers: Vec<Handler> = {
            let map = self.handlers.lock().unwrap();
            map.get(&event.kind())
                .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };

        for handler in handlers {
            handler(event);
        }
    }

    /// Drop every handler (teardown)
    pub fn clear(&self) {
        self.handlers.lock().unwrap().clear();
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .lock()
            .unwrap()
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
