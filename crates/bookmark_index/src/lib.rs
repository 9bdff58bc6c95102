//! Bookmark import, validation, grouping, and search for the homepage.
//!
//! The index turns the browser's hierarchical bookmark tree into a flat list of validated
//! [`Bookmark`] entries tagged with their nearest folder, groups them by folder for window
//! assignment, and answers per-window search queries through a short-lived cache.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod cache;
mod defaults;
mod error;
mod flatten;
mod grouping;
mod import;
mod model;
mod sanitize;
mod validate;

pub use cache::TtlCache;
pub use defaults::default_bookmarks;
pub use error::{BookmarkValidationError, ImportError};
pub use flatten::flatten;
pub use grouping::{group_by_folder, unique_folders, FolderGroups};
pub use import::{BookmarkIndex, BookmarkLoad, FILTER_CACHE_TTL_MS};
pub use model::{Bookmark, DEFAULT_FOLDER, UNCATEGORIZED_FOLDER, UNTITLED};
pub use sanitize::{decode_html_entities, sanitize_text, sanitize_url};
pub use validate::{validate_bookmark, ALLOWED_SCHEMES};
