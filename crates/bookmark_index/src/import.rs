use std::rc::Rc;

use log::{info, warn};
use platform_host::{BookmarkSource, Clock};

use crate::{default_bookmarks, flatten, Bookmark, ImportError, TtlCache};

/// Lifetime of a cached filter result.
pub const FILTER_CACHE_TTL_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of a bookmark import. `bookmarks` is never empty.
pub struct BookmarkLoad {
    /// Imported bookmarks, or the built-in defaults.
    pub bookmarks: Vec<Bookmark>,
    /// Set when the source failed.
    pub error: Option<ImportError>,
    /// Whether `bookmarks` holds the built-in defaults.
    pub used_defaults: bool,
}

/// Bookmark importer and search front-end with a shared filter cache.
pub struct BookmarkIndex {
    filter_cache: TtlCache<Vec<Bookmark>>,
}

impl BookmarkIndex {
    /// Creates an index whose filter cache reads time from `clock`.
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            filter_cache: TtlCache::new(clock, FILTER_CACHE_TTL_MS),
        }
    }

    /// Fetches and flattens the host tree.
    ///
    /// Source failures are classified and logged, and the built-in defaults are returned in
    /// their place. A tree with no valid leaves also yields the defaults.
    pub async fn load(&self, source: &dyn BookmarkSource) -> BookmarkLoad {
        match source.fetch_tree().await {
            Ok(tree) => {
                let bookmarks = flatten(&tree);
                if bookmarks.is_empty() {
                    info!("bookmark tree has no valid entries; using built-in defaults");
                    return BookmarkLoad {
                        bookmarks: default_bookmarks(),
                        error: None,
                        used_defaults: true,
                    };
                }
                info!("imported {} bookmarks", bookmarks.len());
                BookmarkLoad {
                    bookmarks,
                    error: None,
                    used_defaults: false,
                }
            }
            Err(raw) => {
                let error = ImportError::classify(raw);
                warn!("{error}; using built-in defaults");
                BookmarkLoad {
                    bookmarks: default_bookmarks(),
                    error: Some(error),
                    used_defaults: true,
                }
            }
        }
    }

    /// Case-insensitive substring match on title or address.
    ///
    /// Results are cached under the list's ids plus the term for [`FILTER_CACHE_TTL_MS`].
    /// A blank term returns the list unchanged.
    pub fn filter(&self, list: &[Bookmark], term: &str) -> Vec<Bookmark> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return list.to_vec();
        }
        let key = cache_key(list, &needle);
        if let Some(hit) = self.filter_cache.get(&key) {
            return hit;
        }
        let matches: Vec<Bookmark> = list
            .iter()
            .filter(|bookmark| bookmark.matches_lowercase(&needle))
            .cloned()
            .collect();
        self.filter_cache.insert(key, matches.clone());
        matches
    }

    /// Drops every cached filter result.
    pub fn clear_cache(&self) {
        self.filter_cache.clear();
    }

    /// Number of cached filter results.
    pub fn cached_results(&self) -> usize {
        self.filter_cache.len()
    }
}

fn cache_key(list: &[Bookmark], needle: &str) -> String {
    let ids: Vec<&str> = list.iter().map(|bookmark| bookmark.id.as_str()).collect();
    format!("{}|{needle}", ids.join(","))
}
