//! Structural change events
//!
//! The controller emits one [`NodeEvent`] per successful edit, after the new
//! library version has been committed. Listeners are held weakly: dropping
//! the last strong reference to a listener detaches it, though
//! [`ListenerRegistry::remove`] is the normal way to stop listening.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;

use crate::node::Connection;

/// Events emitted by the structural controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeEvent {
    /// A node was added under `parent`
    #[serde(rename_all = "camelCase")]
    NodeAdded {
        parent: String,
        node: String,
        version: u64,
    },

    /// A node (and its connections) was removed
    #[serde(rename_all = "camelCase")]
    NodeRemoved {
        parent: String,
        node: String,
        version: u64,
    },

    #[serde(rename_all = "camelCase")]
    NodeRenamed {
        parent: String,
        old_name: String,
        new_name: String,
        version: u64,
    },

    #[serde(rename_all = "camelCase")]
    ConnectionAdded {
        parent: String,
        connection: Connection,
        version: u64,
    },

    #[serde(rename_all = "camelCase")]
    ConnectionRemoved {
        parent: String,
        connection: Connection,
        version: u64,
    },

    /// The stored value of an input port changed
    #[serde(rename_all = "camelCase")]
    PortValueChanged {
        node: String,
        port: String,
        version: u64,
    },

    #[serde(rename_all = "camelCase")]
    RenderedChildChanged {
        parent: String,
        rendered_child: Option<String>,
        version: u64,
    },

    /// Undo or redo replaced the whole library
    #[serde(rename_all = "camelCase")]
    LibraryRestored { version: u64 },
}

impl NodeEvent {
    /// Library version the event occurred in
    pub fn version(&self) -> u64 {
        match self {
            NodeEvent::NodeAdded { version, .. }
            | NodeEvent::NodeRemoved { version, .. }
            | NodeEvent::NodeRenamed { version, .. }
            | NodeEvent::ConnectionAdded { version, .. }
            | NodeEvent::ConnectionRemoved { version, .. }
            | NodeEvent::PortValueChanged { version, .. }
            | NodeEvent::RenderedChildChanged { version, .. }
            | NodeEvent::LibraryRestored { version } => *version,
        }
    }
}

/// Observer of structural changes
pub trait NodeEventListener: Send + Sync {
    fn on_event(&self, event: &NodeEvent);
}

/// Handle returned when registering a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of weakly held listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<(ListenerId, Weak<dyn NodeEventListener>)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener without taking ownership of it
    pub fn add<L: NodeEventListener + 'static>(&self, listener: &Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let listener: Arc<dyn NodeEventListener> = Arc::clone(listener) as Arc<dyn NodeEventListener>;
        self.listeners.lock().push((id, Arc::downgrade(&listener)));
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners that are still alive
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every live listener, pruning dropped ones.
    pub fn dispatch(&self, event: &NodeEvent) {
        // Upgrade under the lock, call outside it so listeners may re-enter.
        let live: Vec<Arc<dyn NodeEventListener>> = {
            let mut listeners = self.listeners.lock();
            listeners.retain(|(id, weak)| {
                let alive = weak.strong_count() > 0;
                if !alive {
                    log::warn!("Listener {:?} was dropped without unregistering", id);
                }
                alive
            });
            listeners.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        for listener in live {
            listener.on_event(event);
        }
    }
}

/// A listener that records every event
///
/// Useful for tests and for logging edit history.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<NodeEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<NodeEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl NodeEventListener for EventLog {
    fn on_event(&self, event: &NodeEvent) {
        self.events.lock().push(event.clone());
    }
}
