//! One snapshot store per monitored target.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::SnapshotStore;

/// A store per target, created on first use.
///
/// Each store sits behind its own lock, so cycles of different targets
/// run in parallel while cycles of one target are serialized.
#[derive(Debug)]
pub struct TargetStores<T> {
    stores: RwLock<BTreeMap<String, Arc<Mutex<SnapshotStore<T>>>>>,
}

impl<T> Default for TargetStores<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TargetStores<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get or create the store for a target.
    pub fn store(&self, target: &str) -> Arc<Mutex<SnapshotStore<T>>> {
        // Fast path: already registered
        {
            let stores = self.stores.read();
            if let Some(store) = stores.get(target) {
                return Arc::clone(store);
            }
        }

        // Slow path: need to register
        let mut stores = self.stores.write();
        Arc::clone(
            stores
                .entry(target.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(SnapshotStore::new()))),
        )
    }

    /// True if the target has a store.
    pub fn contains(&self, target: &str) -> bool {
        self.stores.read().contains_key(target)
    }

    /// Forget a target's history but keep its store registered.
    ///
    /// Returns false if the target was unknown.
    pub fn reset(&self, target: &str) -> bool {
        let store = self.stores.read().get(target).cloned();
        match store {
            Some(store) => {
                store.lock().reset();
                true
            }
            None => false,
        }
    }

    /// Drop a target entirely.
    pub fn remove(&self, target: &str) -> bool {
        self.stores.write().remove(target).is_some()
    }

    /// Registered target names, sorted.
    pub fn targets(&self) -> Vec<String> {
        self.stores.read().keys().cloned().collect()
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    /// True if no target is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratewatch_types::Millis;

    #[test]
    fn store_is_created_once() {
        let targets: TargetStores<u64> = TargetStores::new();

        let first = targets.store("cluster-a");
        let again = targets.store("cluster-a");

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(targets.len(), 1);
        assert!(targets.contains("cluster-a"));
        assert!(!targets.contains("cluster-b"));
    }

    #[test]
    fn reset_keeps_target_registered() {
        let targets: TargetStores<u64> = TargetStores::new();
        {
            let store = targets.store("cluster-a");
            let mut store = store.lock();
            store.begin_cycle_at(Millis(1_000));
            store.commit(BTreeMap::new());
        }

        assert!(targets.reset("cluster-a"));
        assert!(!targets.reset("cluster-b"));
        assert!(targets.contains("cluster-a"));
        assert!(!targets.store("cluster-a").lock().is_primed());
    }

    #[test]
    fn remove_and_list() {
        let targets: TargetStores<u64> = TargetStores::new();
        targets.store("b");
        targets.store("a");

        assert_eq!(targets.targets(), vec!["a".to_string(), "b".to_string()]);
        assert!(targets.remove("a"));
        assert!(!targets.remove("a"));
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn concurrent_registration() {
        let targets: Arc<TargetStores<u64>> = Arc::new(TargetStores::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let targets = Arc::clone(&targets);
                std::thread::spawn(move || {
                    targets.store(if i % 2 == 0 { "even" } else { "odd" });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(targets.len(), 2);
    }
}
