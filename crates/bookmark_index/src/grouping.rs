use crate::{Bookmark, UNCATEGORIZED_FOLDER};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Bookmarks grouped by folder, folders in first-seen order.
pub struct FolderGroups {
    groups: Vec<(String, Vec<Bookmark>)>,
}

impl FolderGroups {
    /// Bookmarks in `folder`, in their original relative order.
    pub fn get(&self, folder: &str) -> Option<&[Bookmark]> {
        self.groups
            .iter()
            .find(|(name, _)| name == folder)
            .map(|(_, items)| items.as_slice())
    }

    /// Folder names in first-seen order.
    pub fn folders(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates `(folder, bookmarks)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Bookmark])> {
        self.groups
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    /// Number of folders.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no folders.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total bookmarks across all folders.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }
}

/// Groups bookmarks by folder. Blank folder names go to [`UNCATEGORIZED_FOLDER`].
pub fn group_by_folder(list: &[Bookmark]) -> FolderGroups {
    let mut groups: Vec<(String, Vec<Bookmark>)> = Vec::new();
    for bookmark in list {
        let folder = if bookmark.folder.trim().is_empty() {
            UNCATEGORIZED_FOLDER
        } else {
            bookmark.folder.as_str()
        };
        match groups.iter_mut().find(|(name, _)| name == folder) {
            Some((_, items)) => items.push(bookmark.clone()),
            None => groups.push((folder.to_string(), vec![bookmark.clone()])),
        }
    }
    FolderGroups { groups }
}

/// Distinct non-blank folder names, in first-seen order.
pub fn unique_folders(list: &[Bookmark]) -> Vec<String> {
    let mut folders: Vec<String> = Vec::new();
    for bookmark in list {
        if bookmark.folder.trim().is_empty() || folders.contains(&bookmark.folder) {
            continue;
        }
        folders.push(bookmark.folder.clone());
    }
    folders
}
