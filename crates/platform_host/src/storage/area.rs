//! Storage-area contracts modeled on extension key/value stores.
//!
//! A homepage talks to two areas: a fast local one with a generous quota and a synced one
//! that is slower and quota-limited. Both may be absent or denied at runtime, so every call
//! reports failure through `Result<_, String>` and callers decide how to degrade.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::Rc,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Object-safe boxed future used by [`StorageArea`] async methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for one JSON key/value storage area.
pub trait StorageArea {
    /// Reads the JSON value stored under `key`.
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<Option<Value>, String>>;

    /// Writes every entry of `entries` in one call.
    fn set<'a>(&'a self, entries: Map<String, Value>) -> StorageFuture<'a, Result<(), String>>;

    /// Deletes the value stored under `key`.
    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), String>>;

    /// Deletes every value in the area.
    fn clear<'a>(&'a self) -> StorageFuture<'a, Result<(), String>>;

    /// Reads several keys, omitting the ones that are absent.
    fn get_many<'a>(
        &'a self,
        keys: &'a [&'a str],
    ) -> StorageFuture<'a, Result<Map<String, Value>, String>> {
        Box::pin(async move {
            let mut found = Map::new();
            for key in keys {
                if let Some(value) = self.get(*key).await? {
                    found.insert((*key).to_string(), value);
                }
            }
            Ok(found)
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op storage area for unsupported targets and baseline tests.
pub struct NoopStorageArea;

impl StorageArea for NoopStorageArea {
    fn get<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Result<Option<Value>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn set<'a>(&'a self, _entries: Map<String, Value>) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn remove<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn clear<'a>(&'a self) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory storage area keyed by string, with a write counter for assertions.
pub struct MemoryStorageArea {
    inner: Rc<RefCell<HashMap<String, Value>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStorageArea {
    /// Seeds a value without counting it as a write.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.inner.borrow_mut().insert(key.into(), value);
    }

    /// Returns a clone of the value stored under `key`.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get(key).cloned()
    }

    /// Returns the sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of successful `set` calls since construction.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl StorageArea for MemoryStorageArea {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<Option<Value>, String>> {
        Box::pin(async move { Ok(self.peek(key)) })
    }

    fn set<'a>(&'a self, entries: Map<String, Value>) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().extend(entries);
            self.writes.set(self.writes.get() + 1);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(key);
            Ok(())
        })
    }

    fn clear<'a>(&'a self) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().clear();
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
/// Storage area whose every call fails, modeling a denied or missing host API.
pub struct UnavailableStorageArea {
    reason: String,
}

impl UnavailableStorageArea {
    /// Creates an area that reports `reason` on every call.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl StorageArea for UnavailableStorageArea {
    fn get<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Result<Option<Value>, String>> {
        Box::pin(async move { Err(self.reason.clone()) })
    }

    fn set<'a>(&'a self, _entries: Map<String, Value>) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move { Err(self.reason.clone()) })
    }

    fn remove<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move { Err(self.reason.clone()) })
    }

    fn clear<'a>(&'a self) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move { Err(self.reason.clone()) })
    }
}

/// Loads and deserializes a typed value through a [`StorageArea`] implementation.
///
/// # Errors
///
/// Returns an error when the area or JSON deserialization fails.
pub async fn load_entry_with<S: StorageArea + ?Sized, T: DeserializeOwned>(
    area: &S,
    key: &str,
) -> Result<Option<T>, String> {
    let Some(raw) = area.get(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_value(raw).map_err(|e| e.to_string())?;
    Ok(Some(value))
}

/// Serializes and saves a typed value through a [`StorageArea`] implementation.
///
/// # Errors
///
/// Returns an error when serialization or the area write fails.
pub async fn save_entry_with<S: StorageArea + ?Sized, T: Serialize>(
    area: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_value(value).map_err(|e| e.to_string())?;
    let mut entries = Map::new();
    entries.insert(key.to_string(), raw);
    area.set(entries).await
}
