//! Typed host-domain contracts shared by the homepage runtime and browser adapters.
//!
//! This crate is the API-first boundary for extension services. It exposes storage areas,
//! the bookmark tree source, notifications, host messaging commands, and clocks, while the
//! concrete browser adapters live in `platform_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod bookmarks;
pub mod host;
pub mod messaging;
pub mod notifications;
pub mod storage;
pub mod time;

pub use bookmarks::{
    BookmarkSource, BookmarkSourceFuture, BookmarkTreeNode, MemoryBookmarkSource,
    UnavailableBookmarkSource,
};
pub use host::{HostServices, HostStrategy};
pub use messaging::{HostCommand, HostReply};
pub use notifications::{
    MemoryNotificationService, NoopNotificationService, NotificationFuture, NotificationService,
};
pub use storage::{
    load_entry_with, save_entry_with, MemoryStorageArea, NoopStorageArea, StorageArea,
    StorageFuture, UnavailableStorageArea,
};
pub use time::{iso8601_from_unix_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};
