//! The ordered filter chain.
//!
//! Insertion order is application order. Indices are always `0..len`
//! with no gaps, and a failed mutation leaves the chain untouched.
//! Every successful mutation bumps the revision and synchronously notifies
//! each subscribed listener before returning.

use crate::chain::observer::{ChainEvent, ChainListener, ListenerSet, SubscriptionId};
use crate::core::error::{ChainError, ChainResult};
use crate::core::instance::{FilterInstance, InstanceId};
use crate::core::types::Value;

/// An ordered, exclusively owned sequence of filter instances.
#[derive(Default)]
pub struct FilterChain {
    instances: Vec<FilterInstance>,
    listeners: ListenerSet,
    revision: u64,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field(
                "instances",
                &self.instances.iter().map(|i| i.kind_id()).collect::<Vec<_>>(),
            )
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl FilterChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of successful mutations so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Instances in application order.
    pub fn instances(&self) -> &[FilterInstance] {
        &self.instances
    }

    /// Look up an instance by chain index.
    pub fn get(&self, index: usize) -> ChainResult<&FilterInstance> {
        self.instances.get(index).ok_or(ChainError::IndexOutOfRange {
            index,
            len: self.instances.len(),
        })
    }

    /// Current index of an instance.
    pub fn position(&self, id: InstanceId) -> Option<usize> {
        self.instances.iter().position(|i| i.id() == id)
    }

    /// Add an instance at the end and return its index.
    pub fn append(&mut self, instance: FilterInstance) -> usize {
        let index = self.instances.len();
        let id = instance.id();
        self.instances.push(instance);
        self.commit(ChainEvent::Appended { index, id });
        index
    }

    /// Remove the instance at `index`, shifting later entries down.
    pub fn remove_at(&mut self, index: usize) -> ChainResult<FilterInstance> {
        self.check_index(index)?;
        let removed = self.instances.remove(index);
        self.commit(ChainEvent::Removed {
            index,
            id: removed.id(),
        });
        Ok(removed)
    }

    /// Move the instance at `from` so that it ends up at `to`.
    ///
    /// Both indices must be in range. Moving an entry onto itself is not a
    /// mutation and notifies nobody.
    pub fn reorder(&mut self, from: usize, to: usize) -> ChainResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let instance = self.instances.remove(from);
        self.instances.insert(to, instance);
        self.commit(ChainEvent::Moved { from, to });
        Ok(())
    }

    /// Edit a parameter of the instance at `index`.
    ///
    /// Validation belongs to the instance; the chain only routes the edit
    /// and reports it.
    pub fn set_parameter(&mut self, index: usize, name: &str, value: Value) -> ChainResult<()> {
        self.check_index(index)?;
        self.instances[index]
            .set_parameter(name, value)
            .map_err(|source| ChainError::Parameter { index, source })?;
        self.commit(ChainEvent::ParameterChanged {
            index,
            name: name.to_string(),
        });
        Ok(())
    }

    /// Remove every instance, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.instances.len();
        if removed > 0 {
            self.instances.clear();
            self.commit(ChainEvent::Cleared { removed });
        }
        removed
    }

    /// Copy of the instances and their values, for work that must not
    /// observe later edits.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            instances: self.instances.clone(),
            revision: self.revision,
        }
    }

    /// Register a listener called after every mutation.
    pub fn subscribe(&mut self, listener: ChainListener) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn check_index(&self, index: usize) -> ChainResult<()> {
        if index < self.instances.len() {
            Ok(())
        } else {
            Err(ChainError::IndexOutOfRange {
                index,
                len: self.instances.len(),
            })
        }
    }

    fn commit(&mut self, event: ChainEvent) {
        self.revision += 1;
        log::debug!(
            "Chain {} (revision {}, length {})",
            event.label(),
            self.revision,
            self.instances.len()
        );
        self.listeners.notify(&event, &self.instances);
    }
}

/// Immutable copy of a chain taken at one revision.
#[derive(Debug, Clone, Default)]
pub struct ChainSnapshot {
    instances: Vec<FilterInstance>,
    revision: u64,
}

impl ChainSnapshot {
    /// Build a snapshot directly from instances.
    pub fn from_instances(instances: Vec<FilterInstance>) -> Self {
        Self {
            instances,
            revision: 0,
        }
    }

    pub fn instances(&self) -> &[FilterInstance] {
        &self.instances
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kind::{Category, FilterKind};
    use crate::core::parameter::ParameterSpec;
    use crate::core::types::ParameterType;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn kind(id: &str) -> Arc<FilterKind> {
        Arc::new(
            FilterKind::builder(id, id)
                .category(Category::Blur)
                .parameter(ParameterSpec::new("radius", ParameterType::Scalar, Value::Number(10.0)))
                .build(),
        )
    }

    fn chain_of(ids: &[&str]) -> FilterChain {
        let mut chain = FilterChain::new();
        for id in ids {
            chain.append(FilterInstance::create(kind(id)));
        }
        chain
    }

    fn kinds(chain: &FilterChain) -> Vec<&str> {
        chain.instances().iter().map(|i| i.kind_id()).collect()
    }

    #[test]
    fn test_append_returns_index() {
        let mut chain = FilterChain::new();
        assert_eq!(chain.append(FilterInstance::create(kind("A"))), 0);
        assert_eq!(chain.append(FilterInstance::create(kind("B"))), 1);
        assert_eq!(kinds(&chain), vec!["A", "B"]);
        assert_eq!(chain.revision(), 2);
    }

    #[test]
    fn test_remove_shifts_down() {
        let mut chain = chain_of(&["A", "B", "C"]);
        let removed = chain.remove_at(1).unwrap();
        assert_eq!(removed.kind_id(), "B");
        assert_eq!(kinds(&chain), vec!["A", "C"]);
        assert_eq!(chain.get(1).unwrap().kind_id(), "C");
    }

    #[test]
    fn test_remove_out_of_range_leaves_chain_unchanged() {
        let mut chain = chain_of(&["A", "B"]);
        let revision = chain.revision();

        let err = chain.remove_at(2).unwrap_err();
        assert_eq!(err, ChainError::IndexOutOfRange { index: 2, len: 2 });
        assert_eq!(kinds(&chain), vec!["A", "B"]);
        assert_eq!(chain.revision(), revision);
    }

    #[test]
    fn test_reorder() {
        let mut chain = chain_of(&["A", "B", "C"]);
        chain.reorder(0, 2).unwrap();
        assert_eq!(kinds(&chain), vec!["B", "C", "A"]);
        chain.reorder(2, 0).unwrap();
        assert_eq!(kinds(&chain), vec!["A", "B", "C"]);
        assert!(chain.reorder(0, 3).is_err());
        assert_eq!(kinds(&chain), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_set_parameter_routes_to_instance() {
        let mut chain = chain_of(&["A", "B"]);
        chain.set_parameter(1, "radius", Value::Number(2.0)).unwrap();
        assert_eq!(
            chain.get(1).unwrap().parameter_value("radius"),
            Some(&Value::Number(2.0))
        );
        assert_eq!(
            chain.get(0).unwrap().parameter_value("radius"),
            Some(&Value::Number(10.0))
        );

        let err = chain.set_parameter(0, "sigma", Value::Number(1.0)).unwrap_err();
        assert!(matches!(err, ChainError::Parameter { index: 0, .. }));
    }

    #[test]
    fn test_every_mutation_notifies_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut chain = FilterChain::new();
        let sink = Arc::clone(&events);
        chain.subscribe(Box::new(move |event, instances| {
            sink.lock().push((event.clone(), instances.len()));
        }));

        chain.append(FilterInstance::create(kind("A")));
        chain.append(FilterInstance::create(kind("B")));
        chain.set_parameter(0, "radius", Value::Number(1.0)).unwrap();
        chain.reorder(0, 1).unwrap();
        chain.remove_at(0).unwrap();
        let _ = chain.remove_at(5);
        chain.clear();

        let events = events.lock();
        let labels: Vec<_> = events.iter().map(|(e, _)| e.label()).collect();
        assert_eq!(
            labels,
            vec!["appended", "appended", "parameter changed", "moved", "removed", "cleared"]
        );
        let lengths: Vec<_> = events.iter().map(|(_, len)| *len).collect();
        assert_eq!(lengths, vec![1, 2, 2, 2, 1, 0]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Arc::new(Mutex::new(0));
        let mut chain = FilterChain::new();
        let sink = Arc::clone(&count);
        let id = chain.subscribe(Box::new(move |_, _| *sink.lock() += 1));

        chain.append(FilterInstance::create(kind("A")));
        assert!(chain.unsubscribe(id));
        assert!(!chain.unsubscribe(id));
        chain.append(FilterInstance::create(kind("B")));

        assert_eq!(*count.lock(), 1);
        assert_eq!(chain.listener_count(), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut chain = chain_of(&["A"]);
        let snapshot = chain.snapshot();
        chain.set_parameter(0, "radius", Value::Number(99.0)).unwrap();
        chain.append(FilterInstance::create(kind("B")));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.instances()[0].parameter_value("radius"),
            Some(&Value::Number(10.0))
        );
        assert_eq!(snapshot.revision(), 1);
    }

    #[test]
    fn test_position_lookup() {
        let chain = chain_of(&["A", "B"]);
        let id = chain.get(1).unwrap().id();
        assert_eq!(chain.position(id), Some(1));
        assert_eq!(chain.position(InstanceId::new()), None);
    }
}
