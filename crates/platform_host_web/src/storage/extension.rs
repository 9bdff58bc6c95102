//! `chrome.storage` areas.

use platform_host::{StorageArea, StorageFuture};
use serde_json::{Map, Value};

use crate::bridge::{self, ExtensionArea};

#[derive(Debug, Clone, Copy)]
/// Storage area backed by `chrome.storage.local` or `chrome.storage.sync`.
pub struct ExtensionStorageArea {
    area: ExtensionArea,
}

impl ExtensionStorageArea {
    /// Area over `chrome.storage.sync`, quota-limited and shared across the user's browsers.
    pub const fn sync() -> Self {
        Self {
            area: ExtensionArea::Sync,
        }
    }

    /// Area over `chrome.storage.local`.
    pub const fn local() -> Self {
        Self {
            area: ExtensionArea::Local,
        }
    }

    /// Whether the underlying `chrome.storage` area exists in this context.
    pub fn is_available(self) -> bool {
        bridge::storage_available(self.area)
    }
}

impl StorageArea for ExtensionStorageArea {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<Option<Value>, String>> {
        Box::pin(bridge::storage_get(self.area, key))
    }

    fn set<'a>(&'a self, entries: Map<String, Value>) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move { bridge::storage_set(self.area, &entries).await })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(bridge::storage_remove(self.area, key))
    }

    fn clear<'a>(&'a self) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(bridge::storage_clear(self.area))
    }
}
