//! `chrome.bookmarks` tree source.

use futures::future::{self, Either};
use platform_host::{BookmarkSource, BookmarkSourceFuture, BookmarkTreeNode};

use crate::bridge;

/// How long a tree fetch may take before it is reported as timed out.
pub const BOOKMARK_FETCH_TIMEOUT_MS: u32 = 5_000;

#[derive(Debug, Clone, Copy)]
/// Bookmark source backed by `chrome.bookmarks.getTree`.
pub struct ExtensionBookmarkSource {
    timeout_ms: u32,
}

impl Default for ExtensionBookmarkSource {
    fn default() -> Self {
        Self {
            timeout_ms: BOOKMARK_FETCH_TIMEOUT_MS,
        }
    }
}

impl ExtensionBookmarkSource {
    /// Source with a custom fetch timeout.
    pub const fn with_timeout(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }

    /// Whether the bookmarks API exists in this context.
    pub fn is_available() -> bool {
        bridge::bookmarks_available()
    }
}

impl BookmarkSource for ExtensionBookmarkSource {
    fn fetch_tree<'a>(&'a self) -> BookmarkSourceFuture<'a, Result<Vec<BookmarkTreeNode>, String>> {
        let timeout_ms = self.timeout_ms;
        Box::pin(async move {
            let fetch = Box::pin(bridge::bookmarks_get_tree());
            let timer = Box::pin(bridge::sleep_ms(timeout_ms));
            match future::select(fetch, timer).await {
                Either::Left((tree, _)) => tree,
                Either::Right(((), _)) => {
                    Err(format!("bookmark fetch timeout after {timeout_ms} ms"))
                }
            }
        })
    }
}
