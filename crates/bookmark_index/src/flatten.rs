use log::warn;
use platform_host::BookmarkTreeNode;

use crate::{validate_bookmark, Bookmark, DEFAULT_FOLDER, UNTITLED};

/// Flattens a bookmark tree depth-first into validated, folder-tagged bookmarks.
///
/// A node with a URL becomes a leaf tagged with the title of its nearest titled ancestor
/// folder, or [`DEFAULT_FOLDER`] when there is none. Leaves without an id receive
/// `auto-<n>`, where `n` counts leaves in traversal order. Invalid leaves are logged and
/// dropped.
pub fn flatten(tree: &[BookmarkTreeNode]) -> Vec<Bookmark> {
    let mut out = Vec::new();
    let mut leaf_ordinal = 0usize;
    for node in tree {
        visit(node, None, &mut leaf_ordinal, &mut out);
    }
    out
}

fn visit(
    node: &BookmarkTreeNode,
    folder: Option<&str>,
    leaf_ordinal: &mut usize,
    out: &mut Vec<Bookmark>,
) {
    if let Some(url) = node.url.as_deref() {
        *leaf_ordinal += 1;
        let bookmark = Bookmark {
            id: node
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("auto-{leaf_ordinal}")),
            title: node
                .title
                .clone()
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            url: url.to_string(),
            folder: folder.unwrap_or(DEFAULT_FOLDER).to_string(),
        };
        match validate_bookmark(&bookmark) {
            Ok(()) => out.push(bookmark),
            Err(err) => warn!("dropping bookmark `{}`: {err}", bookmark.title),
        }
        return;
    }

    let Some(children) = node.children.as_deref() else {
        return;
    };
    let child_folder = node
        .title
        .as_deref()
        .filter(|title| !title.is_empty())
        .or(folder);
    for child in children {
        visit(child, child_folder, leaf_ordinal, out);
    }
}
