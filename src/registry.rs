use std::sync::{Arc, PoisonError, RwLock};

/// Well-known request value keys, for use with
/// [`Context::with_value`](crate::context::Context::with_value) and
/// [`FieldRegistry::register`].
pub mod keys {
    pub const TRACE_ID: &str = "traceID";
    pub const ORDER_UID: &str = "orderUID";
    pub const HANDLER: &str = "handler";
    pub const CLIENT_ID: &str = "clientID";
    pub const USER_ID: &str = "userID";
    pub const ITEM_SRID: &str = "itemSRID";
    pub const ITEM_RID: &str = "itemRID";
}

/// Process-wide list of context value keys that are merged into every
/// record when the context carries a non-empty string under them.
///
/// Normally filled before the [`Logger`](crate::logger::Logger) is built.
/// Late registration is allowed: writers swap in a new snapshot and
/// readers only hold the lock long enough to clone it.
#[derive(Debug)]
pub struct FieldRegistry {
    keys: RwLock<Arc<[String]>>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::with_keys(Vec::<String>::new())
    }
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        Self {
            keys: RwLock::new(keys.into()),
        }
    }

    /// Append `key`. Keys are never removed; registering a key twice makes
    /// it appear twice in merged records.
    pub fn register(&self, key: impl Into<String>) {
        let mut guard = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: Vec<String> = guard.iter().cloned().collect();
        next.push(key.into());
        *guard = next.into();
    }

    /// Current keys in registration order.
    pub fn snapshot(&self) -> Arc<[String]> {
        let guard = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_appends_in_order() {
        let registry = FieldRegistry::with_keys([keys::TRACE_ID]);
        registry.register(keys::USER_ID);
        registry.register(keys::CLIENT_ID);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.to_vec(), vec!["traceID", "userID", "clientID"]);
    }

    #[test]
    fn snapshot_is_stable_across_late_registration() {
        let registry = FieldRegistry::new();
        registry.register("a");
        let before = registry.snapshot();
        registry.register("b");

        assert_eq!(before.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let registry = Arc::new(FieldRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        if i == 0 {
                            registry.register(format!("k{j}"));
                        } else {
                            let _ = registry.snapshot();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 50);
    }
}
