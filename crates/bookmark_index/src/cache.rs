use std::{cell::RefCell, collections::HashMap, rc::Rc};

use platform_host::Clock;

/// String-keyed cache whose entries expire a fixed time after insertion.
pub struct TtlCache<V> {
    clock: Rc<dyn Clock>,
    ttl_ms: u64,
    entries: RefCell<HashMap<String, (u64, V)>>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache reading time from `clock`.
    pub fn new(clock: Rc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            clock,
            ttl_ms,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Returns a live entry, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let mut entries = self.entries.borrow_mut();
        let expired = match entries.get(key) {
            Some((stored_at, value)) if now.saturating_sub(*stored_at) < self.ttl_ms => {
                return Some(value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    /// Stores `value`, dropping any expired entries first.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let now = self.clock.now_ms();
        let ttl = self.ttl_ms;
        let mut entries = self.entries.borrow_mut();
        entries.retain(|_, (stored_at, _)| now.saturating_sub(*stored_at) < ttl);
        entries.insert(key.into(), (now, value));
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
