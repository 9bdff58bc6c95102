use serde::{Deserialize, Serialize};

/// Folder label for leaves that have no folder ancestor.
pub const DEFAULT_FOLDER: &str = "Favorites";
/// Title given to leaves imported without one.
pub const UNTITLED: &str = "Untitled";
/// Group label for bookmarks whose folder name is blank.
pub const UNCATEGORIZED_FOLDER: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A validated, folder-tagged bookmark.
pub struct Bookmark {
    /// Stable identifier from the bookmark source.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Absolute target address.
    pub url: String,
    /// Name of the nearest ancestor folder.
    pub folder: String,
}

impl Bookmark {
    /// Builds a bookmark from its parts.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            folder: folder.into(),
        }
    }

    /// Case-insensitive match against title or address. `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.url.to_lowercase().contains(needle)
    }
}
