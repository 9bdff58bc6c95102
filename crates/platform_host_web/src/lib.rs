//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! Provides the `localStorage` and `chrome.storage` areas, the `chrome.bookmarks` tree
//! source, Web Notifications, and the runtime selection of which of them a page gets.
//! Native builds compile to adapters that report the browser APIs as unavailable.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Runtime host-strategy detection and host bundle assembly.
pub mod adapters;
pub mod bookmarks;
mod bridge;
pub mod notifications;
pub mod storage;

pub use adapters::{build_host_services, detect_host_strategy};
pub use bookmarks::{ExtensionBookmarkSource, BOOKMARK_FETCH_TIMEOUT_MS};
pub use bridge::{listen_messages, sleep_ms, MessageHandler};
pub use notifications::WebNotificationService;
pub use storage::extension::ExtensionStorageArea;
pub use storage::local::WebLocalStorageArea;
