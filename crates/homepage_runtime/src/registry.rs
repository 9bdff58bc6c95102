//! Window lifecycle: creation with collision-free ids, updates, exclusive removal, colors.
//!
//! The registry never keeps its own copy of the window list. Every operation reads the
//! current list from the [`Store`], builds a new list, and writes it back whole, so
//! subscribers always see complete old and new lists.

use std::{cell::RefCell, rc::Rc};

use log::{info, warn};
use platform_host::Clock;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    error::RegistryError,
    events::{EventBus, Notice, NoticeLevel, RegistryEvent},
    gate::BusyGate,
    model::{
        AsWindowId, StateValue, WindowConfig, WindowId, WindowKind, WindowPatch, WindowRecord,
        DEFAULT_HEADER_COLOR, NEW_WINDOW_FOLDER,
    },
    palette::{color_for_folder, is_header_color, next_window_color},
    store::Store,
};

/// Attempts at a clock-derived id before falling back to `max + 1`.
pub const MAX_ID_ATTEMPTS: usize = 64;
const ID_JITTER_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedWindow {
    pub id: WindowId,
    pub folder: String,
    pub remaining: usize,
}

pub struct WindowRegistry {
    store: Store,
    clock: Rc<dyn Clock>,
    rng: RefCell<SmallRng>,
    events: EventBus<RegistryEvent>,
    removal: BusyGate,
}

impl WindowRegistry {
    pub fn new(store: Store, clock: Rc<dyn Clock>) -> Self {
        let seed = clock.now_ms();
        Self {
            store,
            clock,
            rng: RefCell::new(SmallRng::seed_from_u64(seed)),
            events: EventBus::default(),
            removal: BusyGate::default(),
        }
    }

    pub fn events(&self) -> &EventBus<RegistryEvent> {
        &self.events
    }

    pub fn windows(&self) -> Rc<Vec<WindowRecord>> {
        self.store.windows()
    }

    pub fn get(&self, id: impl AsWindowId) -> Option<WindowRecord> {
        let id = id.as_window_id()?;
        self.store.windows().iter().find(|w| w.id == id).cloned()
    }

    pub fn find_bookmark_window(&self, folder: &str) -> Option<WindowRecord> {
        self.store
            .windows()
            .iter()
            .find(|w| w.is_bookmark_window_for(folder))
            .cloned()
    }

    pub fn find_by_kind(&self, kind: WindowKind) -> Option<WindowRecord> {
        self.store.windows().iter().find(|w| w.kind == kind).cloned()
    }

    /// Folders from `all_folders` not yet backed by a bookmark window, in input order.
    pub fn available_folders(&self, all_folders: &[String]) -> Vec<String> {
        let windows = self.store.windows();
        all_folders
            .iter()
            .filter(|folder| !windows.iter().any(|w| w.is_bookmark_window_for(folder)))
            .cloned()
            .collect()
    }

    pub fn is_removal_in_progress(&self) -> bool {
        self.removal.is_busy()
    }

    /// Merges `config` over defaults and appends the new window.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateFolder`] and posts a notice when a bookmark window
    /// already holds the folder. The window list is not touched in that case.
    pub fn create_window(&self, config: WindowConfig) -> Result<WindowId, RegistryError> {
        let windows = self.store.windows();
        let folder = config
            .folder
            .unwrap_or_else(|| NEW_WINDOW_FOLDER.to_string());

        if config.kind == WindowKind::Bookmark
            && windows.iter().any(|w| w.is_bookmark_window_for(&folder))
        {
            warn!("refusing duplicate window for folder `{folder}`");
            self.notice(
                NoticeLevel::Warning,
                format!("A window for \"{folder}\" is already open."),
            );
            return Err(RegistryError::DuplicateFolder(folder));
        }

        let id = self.generate_id(&windows);
        let header_color = config.header_color.unwrap_or_else(|| match config.kind {
            WindowKind::Bookmark => color_for_folder(&folder).to_string(),
            WindowKind::Search | WindowKind::Translation => DEFAULT_HEADER_COLOR.to_string(),
        });
        let color_class = config
            .color_class
            .unwrap_or_else(|| next_window_color(&windows).to_string());

        let record = WindowRecord {
            id,
            kind: config.kind,
            folder: folder.clone(),
            position: config.position.unwrap_or(crate::layout::NEW_WINDOW_POSITION),
            size: config.size.unwrap_or_default(),
            minimized: config.minimized,
            color_class: Some(color_class),
            header_color: Some(header_color),
            bookmarks: config.bookmarks,
        };

        let mut next = Vec::with_capacity(windows.len() + 1);
        next.extend(windows.iter().cloned());
        next.push(record);
        self.store.set(StateValue::windows(next), true);

        info!("created {} window {id} for `{folder}`", config.kind.as_str());
        self.events.emit(&RegistryEvent::Created {
            id,
            kind: config.kind,
            folder,
        });
        Ok(id)
    }

    /// Shallow-merges `patch` into a window and arms a debounced persist.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::WindowNotFound`] for unknown ids, and
    /// [`RegistryError::DuplicateFolder`] when the patch would move a bookmark window onto a
    /// folder another bookmark window already holds.
    pub fn update_window(
        &self,
        id: impl AsWindowId,
        patch: WindowPatch,
    ) -> Result<(), RegistryError> {
        self.update_window_with(id, patch, true)
    }

    /// Like [`WindowRegistry::update_window`], with control over persistence. Drag moves
    /// pass `persist = false` and persist once when the gesture ends.
    ///
    /// # Errors
    ///
    /// Same as [`WindowRegistry::update_window`].
    pub fn update_window_with(
        &self,
        id: impl AsWindowId,
        patch: WindowPatch,
        persist: bool,
    ) -> Result<(), RegistryError> {
        let id = self.resolve(&id)?;
        let windows = self.store.windows();
        if let Some(index) = windows.iter().position(|w| w.id == id) {
            if let Some(folder) = folder_conflict(&windows, index, &patch) {
                warn!("refusing to move window {id} onto folder `{folder}`");
                self.notice(
                    NoticeLevel::Warning,
                    format!("A window for \"{folder}\" is already open."),
                );
                return Err(RegistryError::DuplicateFolder(folder.to_string()));
            }
        }
        self.replace_window(id, persist, |record| patch.apply_to(record))?;
        self.events.emit(&RegistryEvent::Updated { id });
        Ok(())
    }

    /// Applies many patches as one list replacement, without arming a flush.
    ///
    /// Unknown ids are skipped, as are patches that would move a bookmark window onto an
    /// occupied folder. Returns how many patches were applied.
    pub fn apply_patches(&self, patches: &[(WindowId, WindowPatch)]) -> usize {
        let mut next = self.store.windows().to_vec();
        let mut changed = 0;
        for (id, patch) in patches {
            let Some(index) = next.iter().position(|w| w.id == *id) else {
                continue;
            };
            if let Some(folder) = folder_conflict(&next, index, patch) {
                warn!("skipping patch for window {id}: folder `{folder}` already has a window");
                continue;
            }
            patch.clone().apply_to(&mut next[index]);
            changed += 1;
        }
        if changed > 0 {
            self.store.set(StateValue::windows(next), false);
        }
        changed
    }

    /// Removes a window and flushes state immediately.
    ///
    /// Only one removal runs at a time: a call made while another is in flight is dropped
    /// with a warning. On success a [`RegistryEvent::Removed`] is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RemovalInProgress`] while busy, or
    /// [`RegistryError::WindowNotFound`]/[`RegistryError::InvalidId`] for stale ids.
    pub async fn remove_window(&self, id: impl AsWindowId) -> Result<RemovedWindow, RegistryError> {
        let Some(_guard) = self.removal.try_acquire() else {
            warn!("window removal already in progress; ignoring request");
            return Err(RegistryError::RemovalInProgress);
        };
        let id = self.resolve(&id)?;

        let windows = self.store.windows();
        let Some(target) = windows.iter().find(|w| w.id == id) else {
            warn!("cannot remove window {id}: not found");
            self.notice(NoticeLevel::Warning, "That window no longer exists.");
            return Err(RegistryError::WindowNotFound(id));
        };
        let folder = target.folder.clone();
        let next: Vec<WindowRecord> = windows.iter().filter(|w| w.id != id).cloned().collect();
        let remaining = next.len();

        self.store.set(StateValue::windows(next), false);
        self.store.flush_now().await;

        info!("removed window {id} (`{folder}`), {remaining} remaining");
        let removed = RemovedWindow {
            id,
            folder,
            remaining,
        };
        self.events.emit(&RegistryEvent::Removed {
            id: removed.id,
            folder: removed.folder.clone(),
            remaining,
        });
        Ok(removed)
    }

    /// Replaces a window's header color. Accepts ids as numbers or DOM strings.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownColor`] for classes outside the palette, and
    /// not-found errors for stale ids. Stale ids also post a notice.
    pub fn change_header_color(
        &self,
        id: impl AsWindowId,
        color_class: &str,
    ) -> Result<(), RegistryError> {
        if !is_header_color(color_class) {
            warn!("rejecting unknown header color `{color_class}`");
            return Err(RegistryError::UnknownColor(color_class.to_string()));
        }
        let id = self.resolve(&id)?;
        let class = color_class.to_string();
        self.replace_window(id, true, |record| record.header_color = Some(class))
            .inspect_err(|_| {
                self.notice(NoticeLevel::Warning, "That window no longer exists.");
            })?;
        self.events.emit(&RegistryEvent::Updated { id });
        Ok(())
    }

    /// Flips `minimized`, persists, and requests a full re-render. Returns the new flag.
    ///
    /// # Errors
    ///
    /// Returns not-found errors for stale ids.
    pub fn toggle_minimize(&self, id: impl AsWindowId) -> Result<bool, RegistryError> {
        let id = self.resolve(&id)?;
        let mut minimized = false;
        self.replace_window(id, true, |record| {
            record.minimized = !record.minimized;
            minimized = record.minimized;
        })?;
        self.events.emit(&RegistryEvent::Updated { id });
        self.events.emit(&RegistryEvent::RenderRequested);
        Ok(minimized)
    }

    pub fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.events
            .emit(&RegistryEvent::Notice(Notice::new(level, message)));
    }

    fn resolve(&self, id: &impl AsWindowId) -> Result<WindowId, RegistryError> {
        id.as_window_id().ok_or_else(|| {
            let raw = id.raw_id();
            warn!("`{raw}` is not a window id");
            RegistryError::InvalidId(raw)
        })
    }

    fn replace_window(
        &self,
        id: WindowId,
        persist: bool,
        edit: impl FnOnce(&mut WindowRecord),
    ) -> Result<(), RegistryError> {
        let windows = self.store.windows();
        let Some(index) = windows.iter().position(|w| w.id == id) else {
            warn!("window {id} not found");
            return Err(RegistryError::WindowNotFound(id));
        };
        let mut next = windows.to_vec();
        edit(&mut next[index]);
        self.store.set(StateValue::windows(next), persist);
        Ok(())
    }

    fn generate_id(&self, windows: &[WindowRecord]) -> WindowId {
        let taken = |candidate: u64| windows.iter().any(|w| w.id.0 == candidate);
        let now = self.clock.now_ms();
        let mut candidate = now;
        let mut rng = self.rng.borrow_mut();
        for _ in 0..MAX_ID_ATTEMPTS {
            if !taken(candidate) {
                return WindowId(candidate);
            }
            candidate = now.saturating_add(rng.random_range(0..ID_JITTER_MS));
        }
        let fallback = windows.iter().map(|w| w.id.0).max().unwrap_or(now) + 1;
        warn!("id generation kept colliding; using {fallback}");
        WindowId(fallback)
    }
}

/// Folder named by `patch` when applying it to `windows[index]` would give that folder a
/// second bookmark window.
fn folder_conflict<'a>(
    windows: &[WindowRecord],
    index: usize,
    patch: &'a WindowPatch,
) -> Option<&'a str> {
    let folder = patch.folder.as_deref()?;
    let moves_bookmark_window = windows[index].kind == WindowKind::Bookmark;
    let occupied = windows
        .iter()
        .enumerate()
        .any(|(i, w)| i != index && w.is_bookmark_window_for(folder));
    (moves_bookmark_window && occupied).then_some(folder)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use futures::executor::block_on;
    use platform_host::{ManualClock, MemoryStorageArea};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        model::{Position, DEFAULT_HEADER_COLOR},
        palette::HASH_HEADER_COLORS,
        store::StoreConfig,
    };

    struct Harness {
        registry: WindowRegistry,
        store: Store,
        local: MemoryStorageArea,
        events: Rc<RefCell<Vec<RegistryEvent>>>,
    }

    fn harness() -> Harness {
        let clock = ManualClock::new(1_700_000_000_000);
        let local = MemoryStorageArea::default();
        let store = Store::new(
            Rc::new(local.clone()),
            Rc::new(MemoryStorageArea::default()),
            Rc::new(clock.clone()),
            StoreConfig::default(),
        );
        let registry = WindowRegistry::new(store.clone(), Rc::new(clock));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        registry
            .events()
            .subscribe(move |event: &RegistryEvent| sink.borrow_mut().push(event.clone()));
        Harness {
            registry,
            store,
            local,
            events,
        }
    }

    #[test]
    fn ids_stay_unique_under_a_frozen_clock() {
        let h = harness();
        for index in 0..200 {
            h.registry
                .create_window(WindowConfig::bookmark(format!("Folder {index}")))
                .expect("create");
        }
        let ids: HashSet<WindowId> = h.registry.windows().iter().map(|w| w.id).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn id_generation_falls_back_past_the_maximum() {
        let h = harness();
        let now = 1_700_000_000_000u64;
        let crowded: Vec<WindowRecord> = (0..ID_JITTER_MS)
            .map(|offset| WindowRecord {
                id: WindowId(now + offset),
                kind: WindowKind::Search,
                folder: String::new(),
                position: Position::default(),
                size: Default::default(),
                minimized: false,
                color_class: None,
                header_color: None,
                bookmarks: Vec::new(),
            })
            .collect();
        let id = h.registry.generate_id(&crowded);
        assert_eq!(id, WindowId(now + ID_JITTER_MS));
    }

    #[test]
    fn duplicate_bookmark_folder_is_rejected_without_mutation() {
        let h = harness();
        h.registry
            .create_window(WindowConfig::bookmark("Work"))
            .expect("first");
        let before = h.registry.windows();

        let second = h.registry.create_window(WindowConfig::bookmark("Work"));

        assert_eq!(second, Err(RegistryError::DuplicateFolder("Work".to_string())));
        assert_eq!(h.registry.windows(), before);
        assert!(h
            .events
            .borrow()
            .iter()
            .any(|e| matches!(e, RegistryEvent::Notice(n) if n.level == NoticeLevel::Warning)));
    }

    #[test]
    fn new_windows_get_keyword_or_default_colors() {
        let h = harness();
        let dev = h
            .registry
            .create_window(WindowConfig::bookmark("Development"))
            .expect("dev");
        let misc = h
            .registry
            .create_window(WindowConfig::bookmark("Qwxyz"))
            .expect("misc");
        let search = h
            .registry
            .create_window(WindowConfig::new(WindowKind::Search))
            .expect("search");

        let header = |id| h.registry.get(id).and_then(|w| w.header_color);
        assert_eq!(header(dev).as_deref(), Some("header-color-development"));
        assert!(HASH_HEADER_COLORS.contains(&header(misc).as_deref().unwrap_or_default()));
        assert_eq!(header(search).as_deref(), Some(DEFAULT_HEADER_COLOR));

        let classes: Vec<Option<String>> = h
            .registry
            .windows()
            .iter()
            .map(|w| w.color_class.clone())
            .collect();
        assert_eq!(
            classes,
            vec![
                Some("window-color-1".to_string()),
                Some("window-color-2".to_string()),
                Some("window-color-3".to_string()),
            ]
        );
    }

    #[test]
    fn update_replaces_the_list_instead_of_editing_it() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev"))
            .expect("create");
        let before = h.registry.windows();

        h.registry
            .update_window(id, WindowPatch::position(Position::new(120, 240)))
            .expect("update");

        assert_eq!(before[0].position, crate::layout::NEW_WINDOW_POSITION);
        assert_eq!(
            h.registry.get(id).map(|w| w.position),
            Some(Position::new(120, 240))
        );
        assert_eq!(
            h.registry.update_window(WindowId(1), WindowPatch::default()),
            Err(RegistryError::WindowNotFound(WindowId(1)))
        );
    }

    #[test]
    fn moving_a_window_onto_an_occupied_folder_is_rejected() {
        let h = harness();
        h.registry
            .create_window(WindowConfig::bookmark("Work"))
            .expect("work");
        let home = h
            .registry
            .create_window(WindowConfig::bookmark("Home"))
            .expect("home");
        let before = h.registry.windows();
        let rename = WindowPatch {
            folder: Some("Work".to_string()),
            ..WindowPatch::default()
        };

        let result = h.registry.update_window(home, rename.clone());

        assert_eq!(result, Err(RegistryError::DuplicateFolder("Work".to_string())));
        assert_eq!(h.registry.windows(), before);
        assert!(h
            .events
            .borrow()
            .iter()
            .any(|e| matches!(e, RegistryEvent::Notice(n) if n.level == NoticeLevel::Warning)));

        assert_eq!(h.registry.apply_patches(&[(home, rename)]), 0);
        let work_windows = h
            .registry
            .windows()
            .iter()
            .filter(|w| w.is_bookmark_window_for("Work"))
            .count();
        assert_eq!(work_windows, 1);
        assert_eq!(h.registry.get(home).map(|w| w.folder), Some("Home".to_string()));
    }

    #[test]
    fn header_color_lookup_accepts_string_ids() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev"))
            .expect("create");

        h.registry
            .change_header_color(id.dom_id().as_str(), "header-color-news")
            .expect("recolor via dom id");
        h.registry
            .change_header_color(id.to_string(), "header-color-tools")
            .expect("recolor via string");

        assert_eq!(
            h.registry.get(id).and_then(|w| w.header_color).as_deref(),
            Some("header-color-tools")
        );
        assert_eq!(
            h.registry.change_header_color(id, "header-color-evil"),
            Err(RegistryError::UnknownColor("header-color-evil".to_string()))
        );
    }

    #[test]
    fn toggle_minimize_flips_and_requests_render() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::new(WindowKind::Translation))
            .expect("create");
        assert_eq!(h.registry.toggle_minimize(id), Ok(true));
        assert_eq!(h.registry.toggle_minimize(id), Ok(false));
        assert_eq!(
            h.events
                .borrow()
                .iter()
                .filter(|e| **e == RegistryEvent::RenderRequested)
                .count(),
            2
        );
    }

    #[test]
    fn remove_flushes_immediately_and_reports_remaining() {
        let h = harness();
        let dev = h
            .registry
            .create_window(WindowConfig::bookmark("Dev"))
            .expect("dev");
        h.registry
            .create_window(WindowConfig::bookmark("News"))
            .expect("news");

        let removed = block_on(h.registry.remove_window(dev)).expect("remove");

        assert_eq!(
            removed,
            RemovedWindow {
                id: dev,
                folder: "Dev".to_string(),
                remaining: 1
            }
        );
        assert_eq!(h.local.write_count(), 1);
        assert_eq!(h.store.pending_flush_deadline(), None);
        assert!(!h.registry.is_removal_in_progress());
        assert_eq!(
            block_on(h.registry.remove_window(dev)),
            Err(RegistryError::WindowNotFound(dev))
        );
    }

    #[test]
    fn available_folders_skip_open_ones() {
        let h = harness();
        h.registry
            .create_window(WindowConfig::bookmark("Dev"))
            .expect("dev");
        let all = vec!["Dev".to_string(), "News".to_string()];
        assert_eq!(h.registry.available_folders(&all), vec!["News".to_string()]);
    }
}
