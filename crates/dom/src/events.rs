//! Event listeners - per-node registry with identity-based removal
//!
//! Listener identity is `Rc` pointer identity: `remove` only succeeds with a
//! clone of the very `Rc` that was added, mirroring how
//! `removeEventListener` needs the same function object.

use std::rc::Rc;

use ahash::AHashMap;

use crate::types::NodeId;

/// Event delivered to a listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub event_type: String,
    /// Node the event was dispatched on
    pub target: NodeId,
    /// Node whose listener is running (differs from `target` while bubbling)
    pub current_target: NodeId,
}

/// Shared event handler
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// One-shot callback run when the document becomes ready
pub type ReadyCallback = Box<dyn FnOnce()>;

/// Wrap a closure as a [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&DomEvent) + 'static,
{
    Rc::new(f)
}

struct Registration {
    event_type: String,
    listener: Listener,
}

/// Listeners per node, in registration order
#[derive(Default)]
pub struct ListenerRegistry {
    by_node: AHashMap<NodeId, Vec<Registration>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns false if this exact pair is already present
    pub fn add(&mut self, node: NodeId, event_type: &str, listener: &Listener) -> bool {
        if self.contains(node, event_type, listener) {
            return false;
        }
        self.by_node.entry(node).or_default().push(Registration {
            event_type: event_type.to_string(),
            listener: Rc::clone(listener),
        });
        true
    }

    /// Unregister a listener; returns whether anything was removed
    pub fn remove(&mut self, node: NodeId, event_type: &str, listener: &Listener) -> bool {
        let Some(registrations) = self.by_node.get_mut(&node) else {
            return false;
        };
        let before = registrations.len();
        registrations
            .retain(|r| !(r.event_type == event_type && Rc::ptr_eq(&r.listener, listener)));
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }

    pub fn contains(&self, node: NodeId, event_type: &str, listener: &Listener) -> bool {
        self.by_node
            .get(&node)
            .map(|registrations| {
                registrations
                    .iter()
                    .any(|r| r.event_type == event_type && Rc::ptr_eq(&r.listener, listener))
            })
            .unwrap_or(false)
    }

    /// Snapshot of the listeners for one node and event type
    pub fn listeners_for(&self, node: NodeId, event_type: &str) -> Vec<Listener> {
        self.by_node
            .get(&node)
            .map(|registrations| {
                registrations
                    .iter()
                    .filter(|r| r.event_type == event_type)
                    .map(|r| Rc::clone(&r.listener))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, node: NodeId, event_type: &str) -> usize {
        self.by_node
            .get(&node)
            .map(|registrations| {
                registrations
                    .iter()
                    .filter(|r| r.event_type == event_type)
                    .count()
            })
            .unwrap_or(0)
    }
}
