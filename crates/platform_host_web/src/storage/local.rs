//! `localStorage`-backed storage area.
//!
//! Values are kept as JSON text, one item per key. Items written by older page versions as
//! bare strings (for example a theme name) read back as JSON strings.

use platform_host::{StorageArea, StorageFuture};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default)]
/// Storage area backed by `window.localStorage`.
pub struct WebLocalStorageArea;

impl WebLocalStorageArea {
    /// Whether `localStorage` can be reached from this context.
    pub fn is_available() -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage().is_ok()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    /// Loads the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when localStorage is unavailable or the read fails.
    pub fn load_raw(self, key: &str) -> Result<Option<String>, String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .get_item(key)
                .map_err(|e| format!("localStorage get_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Err(unavailable())
        }
    }

    /// Stores raw text under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when localStorage is unavailable or the write fails (quota).
    pub fn save_raw(self, key: &str, raw: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .set_item(key, raw)
                .map_err(|e| format!("localStorage set_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw);
            Err(unavailable())
        }
    }

    fn delete(self, key: Option<&str>) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = local_storage()?;
            match key {
                Some(key) => storage
                    .remove_item(key)
                    .map_err(|e| format!("localStorage remove_item failed: {e:?}")),
                None => storage
                    .clear()
                    .map_err(|e| format!("localStorage clear failed: {e:?}")),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Err(unavailable())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, String> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| "localStorage unavailable".to_string())
}

#[cfg(not(target_arch = "wasm32"))]
fn unavailable() -> String {
    "localStorage is only available when compiled for wasm32".to_string()
}

/// Parses stored text, keeping non-JSON text as a plain string.
pub(crate) fn decode_item(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Text form written for a value.
pub(crate) fn encode_item(value: &Value) -> String {
    value.to_string()
}

impl StorageArea for WebLocalStorageArea {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<Option<Value>, String>> {
        let area = *self;
        Box::pin(async move { Ok(area.load_raw(key)?.map(decode_item)) })
    }

    fn set<'a>(&'a self, entries: Map<String, Value>) -> StorageFuture<'a, Result<(), String>> {
        let area = *self;
        Box::pin(async move {
            for (key, value) in &entries {
                area.save_raw(key, &encode_item(value))?;
            }
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), String>> {
        let area = *self;
        Box::pin(async move { area.delete(Some(key)) })
    }

    fn clear<'a>(&'a self) -> StorageFuture<'a, Result<(), String>> {
        let area = *self;
        Box::pin(async move { area.delete(None) })
    }
}
