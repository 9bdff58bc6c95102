//! Shared host-bundle model for browser and headless runtime composition.

use std::rc::Rc;

use crate::{
    BookmarkSource, Clock, MemoryBookmarkSource, MemoryNotificationService, MemoryStorageArea,
    NotificationService, StorageArea, SystemClock,
};

/// Host strategy selected for the current build/runtime composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Running inside the extension with `chrome.*` APIs present.
    Extension,
    /// Running as a plain page: local storage only.
    PlainPage,
    /// Headless composition with in-memory adapters.
    Headless,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::PlainPage => "plain-page",
            Self::Headless => "headless",
        }
    }
}

#[derive(Clone)]
/// Bundle of host services injected into the homepage runtime.
pub struct HostServices {
    /// Composition path the bundle was built for.
    pub strategy: HostStrategy,
    /// Fast local storage area holding the full snapshot.
    pub local: Rc<dyn StorageArea>,
    /// Quota-limited synced storage area holding the light snapshot.
    pub sync: Rc<dyn StorageArea>,
    /// Bookmark tree source.
    pub bookmarks: Rc<dyn BookmarkSource>,
    /// User-visible notifications.
    pub notifications: Rc<dyn NotificationService>,
    /// Time source.
    pub clock: Rc<dyn Clock>,
}

impl HostServices {
    /// Builds a headless bundle from in-memory adapters and the wall clock.
    pub fn in_memory() -> Self {
        Self {
            strategy: HostStrategy::Headless,
            local: Rc::new(MemoryStorageArea::default()),
            sync: Rc::new(MemoryStorageArea::default()),
            bookmarks: Rc::new(MemoryBookmarkSource::default()),
            notifications: Rc::new(MemoryNotificationService::default()),
            clock: Rc::new(SystemClock),
        }
    }

    /// Returns the bundle with its clock replaced.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
