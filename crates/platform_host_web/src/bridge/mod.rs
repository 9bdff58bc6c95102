//! Browser capability bridge for the `chrome.*` extension APIs.
//!
//! Calls route to a `wasm32` implementation backed by inline JS glue, or to a non-wasm shim
//! that reports the APIs as missing so native builds and tests compile.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use platform_host::BookmarkTreeNode;
use serde_json::{Map, Value};

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

/// Answers one `chrome.runtime` message with a JSON reply.
pub type MessageHandler = Rc<dyn Fn(Value) -> LocalBoxFuture<'static, Value>>;

/// `chrome.storage` area names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionArea {
    /// `chrome.storage.local`.
    Local,
    /// `chrome.storage.sync`.
    Sync,
}

impl ExtensionArea {
    /// Property name under `chrome.storage`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sync => "sync",
        }
    }
}

pub fn storage_available(area: ExtensionArea) -> bool {
    imp::storage_available(area.as_str())
}

pub fn bookmarks_available() -> bool {
    imp::bookmarks_available()
}

pub async fn storage_get(area: ExtensionArea, key: &str) -> Result<Option<Value>, String> {
    imp::storage_get(area.as_str(), key).await
}

pub async fn storage_set(area: ExtensionArea, entries: &Map<String, Value>) -> Result<(), String> {
    imp::storage_set(area.as_str(), entries).await
}

pub async fn storage_remove(area: ExtensionArea, key: &str) -> Result<(), String> {
    imp::storage_remove(area.as_str(), key).await
}

pub async fn storage_clear(area: ExtensionArea) -> Result<(), String> {
    imp::storage_clear(area.as_str()).await
}

pub async fn bookmarks_get_tree() -> Result<Vec<BookmarkTreeNode>, String> {
    imp::bookmarks_get_tree().await
}

/// Registers `handler` for `chrome.runtime.onMessage`. Returns `false` when the page has
/// no messaging channel.
pub fn listen_messages(handler: MessageHandler) -> bool {
    imp::listen_messages(handler)
}

/// Resolves after `ms` milliseconds.
pub async fn sleep_ms(ms: u32) {
    imp::sleep_ms(ms).await;
}
