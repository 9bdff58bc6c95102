//! Bookmark tree source contract and adapters.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`BookmarkSource`].
pub type BookmarkSourceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// One node of a hierarchical bookmark tree as delivered by the browser.
///
/// A node with a `url` is a leaf; a node with `children` is a folder. Every field is
/// optional because real trees carry partial records.
pub struct BookmarkTreeNode {
    /// Host-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display title (folder name for folders).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Target address for leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Nested nodes for folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkTreeNode>>,
}

impl BookmarkTreeNode {
    /// Builds a folder node.
    pub fn folder(title: impl Into<String>, children: Vec<BookmarkTreeNode>) -> Self {
        Self {
            title: Some(title.into()),
            children: Some(children),
            ..Self::default()
        }
    }

    /// Builds a leaf node.
    pub fn leaf(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Returns the node with `id` set.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Host service that yields the user's bookmark tree.
pub trait BookmarkSource {
    /// Fetches the root nodes of the bookmark tree.
    fn fetch_tree<'a>(&'a self) -> BookmarkSourceFuture<'a, Result<Vec<BookmarkTreeNode>, String>>;
}

#[derive(Debug, Clone, Default)]
/// In-memory bookmark source returning a fixed tree.
pub struct MemoryBookmarkSource {
    tree: Rc<RefCell<Vec<BookmarkTreeNode>>>,
}

impl MemoryBookmarkSource {
    /// Creates a source that yields `tree`.
    pub fn new(tree: Vec<BookmarkTreeNode>) -> Self {
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    /// Replaces the tree returned by subsequent fetches.
    pub fn replace(&self, tree: Vec<BookmarkTreeNode>) {
        *self.tree.borrow_mut() = tree;
    }
}

impl BookmarkSource for MemoryBookmarkSource {
    fn fetch_tree<'a>(&'a self) -> BookmarkSourceFuture<'a, Result<Vec<BookmarkTreeNode>, String>> {
        Box::pin(async move { Ok(self.tree.borrow().clone()) })
    }
}

#[derive(Debug, Clone)]
/// Bookmark source that always fails, modeling a missing permission or API.
pub struct UnavailableBookmarkSource {
    reason: String,
}

impl UnavailableBookmarkSource {
    /// Creates a source that reports `reason` on every fetch.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableBookmarkSource {
    fn default() -> Self {
        Self::new("bookmarks API not available")
    }
}

impl BookmarkSource for UnavailableBookmarkSource {
    fn fetch_tree<'a>(&'a self) -> BookmarkSourceFuture<'a, Result<Vec<BookmarkTreeNode>, String>> {
        Box::pin(async move { Err(self.reason.clone()) })
    }
}
