//! Chain mutation events and listener registration.

use crate::core::instance::{FilterInstance, InstanceId};

/// A single mutation of a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    /// An instance was added at the end.
    Appended { index: usize, id: InstanceId },
    /// An instance was removed; later entries shifted down by one.
    Removed { index: usize, id: InstanceId },
    /// An instance moved from one position to another.
    Moved { from: usize, to: usize },
    /// A parameter of the instance at `index` was replaced.
    ParameterChanged { index: usize, name: String },
    /// Every instance was removed.
    Cleared { removed: usize },
}

impl ChainEvent {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            ChainEvent::Appended { .. } => "appended",
            ChainEvent::Removed { .. } => "removed",
            ChainEvent::Moved { .. } => "moved",
            ChainEvent::ParameterChanged { .. } => "parameter changed",
            ChainEvent::Cleared { .. } => "cleared",
        }
    }
}

/// Callback invoked after each mutation with the chain's new contents.
pub type ChainListener = Box<dyn Fn(&ChainEvent, &[FilterInstance]) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registered listeners, notified in subscription order.
#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: u64,
    listeners: Vec<(SubscriptionId, ChainListener)>,
}

impl ListenerSet {
    pub(crate) fn subscribe(&mut self, listener: ChainListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn notify(&self, event: &ChainEvent, instances: &[FilterInstance]) {
        for (_, listener) in &self.listeners {
            listener(event, instances);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}
