//! Homepage application pipeline: wires store, index, registry, layout, and bridge together
//! and exposes the operations the page and the extension shell call.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use bookmark_index::{group_by_folder, unique_folders, BookmarkIndex, ImportError};
use log::{debug, error, info, warn};
use platform_host::{HostCommand, HostReply, HostServices};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::Serialize;

use crate::{
    background::validate_background,
    bridge::{BridgeEffect, RenderBridge, UiEvent, WindowView},
    error::HomepageError,
    events::{Notice, NoticeLevel, RegistryEvent},
    gate::BusyGate,
    layout::{self, default_window_slots, plan_startup_layout, LayoutConfig},
    model::{
        AsWindowId, Position, StateValue, Theme, Viewport, WindowConfig, WindowId,
        WindowKind, WindowPatch, DEFAULT_BACKGROUND, DEFAULT_HEADER_COLOR, SEARCH_WINDOW_TITLE,
        TRANSLATION_WINDOW_TITLE,
    },
    registry::{RemovedWindow, WindowRegistry},
    store::{FlushReport, LoadSource, Store, StoreConfig, StoreDebugInfo},
};

const DEFAULT_WINDOW_COLOR: &str = "window-color-1";
const NOTIFICATION_TITLE: &str = "Bookmark homepage";
/// New windows from the add dialog land at a random spot in this square.
const ADD_WINDOW_ORIGIN: i32 = 100;
const ADD_WINDOW_SPREAD: i32 = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub layout: LayoutConfig,
    pub viewport: Viewport,
}

/// Outcome of a completed [`HomepageApp::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub restored_from: Option<LoadSource>,
    pub import_error: Option<ImportError>,
    pub used_default_bookmarks: bool,
    pub views: Vec<WindowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddWindowOptions {
    NoFolders,
    AllFoldersHaveWindows,
    Available(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub flushed: Option<FlushReport>,
    pub effects: Vec<BridgeEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDebugInfo {
    pub host: &'static str,
    pub initialized: bool,
    pub settings_open: bool,
    pub windows: usize,
    pub bookmarks: usize,
    pub theme: &'static str,
    pub cached_filters: usize,
    pub store: StoreDebugInfo,
}

pub struct HomepageApp {
    host: HostServices,
    config: AppConfig,
    store: Store,
    index: Rc<BookmarkIndex>,
    registry: Rc<WindowRegistry>,
    bridge: RenderBridge,
    initializing: BusyGate,
    initialized: Cell<bool>,
    settings_open: Cell<bool>,
    notices: Rc<RefCell<VecDeque<Notice>>>,
    rng: RefCell<SmallRng>,
}

impl HomepageApp {
    pub fn new(host: HostServices, config: AppConfig) -> Self {
        let store = Store::from_host(&host, config.store);
        let index = Rc::new(BookmarkIndex::new(Rc::clone(&host.clock)));
        let registry = Rc::new(WindowRegistry::new(store.clone(), Rc::clone(&host.clock)));
        let bridge = RenderBridge::new(
            Rc::clone(&registry),
            store.clone(),
            Rc::clone(&index),
            Rc::clone(&host.clock),
            config.viewport,
        );

        let notices = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&notices);
        registry.events().subscribe(move |event: &RegistryEvent| {
            if let RegistryEvent::Notice(notice) = event {
                sink.borrow_mut().push_back(notice.clone());
            }
        });

        let seed = host.clock.now_ms().rotate_left(17);
        Self {
            host,
            config,
            store,
            index,
            registry,
            bridge,
            initializing: BusyGate::default(),
            initialized: Cell::new(false),
            settings_open: Cell::new(false),
            notices,
            rng: RefCell::new(SmallRng::seed_from_u64(seed)),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn bridge(&self) -> &RenderBridge {
        &self.bridge
    }

    pub fn index(&self) -> &BookmarkIndex {
        &self.index
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub fn is_settings_open(&self) -> bool {
        self.settings_open.get()
    }

    /// Runs the startup pipeline in order: hydrate state, ensure the default windows, import
    /// bookmarks, assign them to windows, check appearance, then produce the first render.
    ///
    /// Import and storage failures do not fail startup; they surface as notices and the
    /// page keeps running on defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HomepageError::InitInProgress`] when another `init` has not finished.
    pub async fn init(&self) -> Result<InitReport, HomepageError> {
        let Some(_guard) = self.initializing.try_acquire() else {
            warn!("initialization already in progress; ignoring duplicate request");
            return Err(HomepageError::InitInProgress);
        };
        Ok(self.run_init().await)
    }

    /// Startup body. The caller holds the `initializing` gate.
    async fn run_init(&self) -> InitReport {
        info!("starting homepage ({})", self.host.strategy.as_str());

        if self.initialized.get() {
            self.cleanup();
        }

        let loaded = self.store.load().await;
        debug!("state restored from {:?}", loaded.source);

        self.setup_default_windows();

        let import = self.index.load(self.host.bookmarks.as_ref()).await;
        if let Some(error) = &import.error {
            let message = error.user_message();
            self.registry.notice(NoticeLevel::Warning, message);
            if let Err(err) = self
                .host
                .notifications
                .notify(NOTIFICATION_TITLE, message)
                .await
            {
                debug!("notification not shown: {err}");
            }
        }
        self.store.set(StateValue::bookmarks(import.bookmarks), true);

        self.assign_bookmarks_to_windows();
        self.check_appearance();

        self.initialized.set(true);
        let views = self.bridge.views();
        info!(
            "homepage ready: {} windows, {} bookmarks",
            views.len(),
            self.store.bookmarks().len()
        );
        InitReport {
            restored_from: loaded.source,
            import_error: import.error,
            used_default_bookmarks: import.used_defaults,
            views,
        }
    }

    /// Ensures exactly one search and one translation window exist. Existing ones keep
    /// their position but get the default header color back.
    pub fn setup_default_windows(&self) {
        let (left, right) = default_window_slots(self.bridge.viewport(), &self.config.layout);
        let defaults = [
            (WindowKind::Search, SEARCH_WINDOW_TITLE, left),
            (WindowKind::Translation, TRANSLATION_WINDOW_TITLE, right),
        ];

        let mut recolor = Vec::new();
        for (kind, title, position) in defaults {
            match self.registry.find_by_kind(kind) {
                Some(existing) => recolor.push((
                    existing.id,
                    WindowPatch {
                        header_color: Some(DEFAULT_HEADER_COLOR.to_string()),
                        ..WindowPatch::default()
                    },
                )),
                None => {
                    let config = WindowConfig::new(kind)
                        .folder(title)
                        .at(position)
                        .sized(self.config.layout.window_size)
                        .header_color(DEFAULT_HEADER_COLOR)
                        .color_class(DEFAULT_WINDOW_COLOR);
                    if let Err(err) = self.registry.create_window(config) {
                        error!("could not create the {} window: {err}", kind.as_str());
                    }
                }
            }
        }
        if !recolor.is_empty() {
            self.registry.apply_patches(&recolor);
        }
    }

    /// Gives every bookmark window its folder's bookmarks.
    ///
    /// On a first run, with no bookmark windows at all, one window per folder is created in
    /// grid order. Afterwards only the existing windows are refreshed; folders without a
    /// window stay available through [`HomepageApp::add_window`].
    pub fn assign_bookmarks_to_windows(&self) {
        let bookmarks = self.store.bookmarks();
        if bookmarks.is_empty() {
            return;
        }
        let groups = group_by_folder(&bookmarks);
        let windows = self.registry.windows();
        let has_bookmark_windows = windows.iter().any(|w| w.kind == WindowKind::Bookmark);

        if !has_bookmark_windows {
            let folders: Vec<String> = groups.folders().map(str::to_string).collect();
            let plan = plan_startup_layout(
                &folders,
                &windows,
                self.bridge.viewport(),
                &self.config.layout,
            );
            info!("creating {} folder windows", plan.len());
            for placement in plan {
                let list = groups.get(&placement.folder).unwrap_or_default().to_vec();
                let config = WindowConfig::bookmark(placement.folder)
                    .at(placement.position)
                    .sized(placement.size)
                    .bookmarks(list);
                if let Err(err) = self.registry.create_window(config) {
                    warn!("skipping folder window: {err}");
                }
            }
            return;
        }

        let patches: Vec<(WindowId, WindowPatch)> = windows
            .iter()
            .filter(|w| w.kind == WindowKind::Bookmark)
            .map(|w| {
                let list = groups.get(&w.folder).unwrap_or_default().to_vec();
                (
                    w.id,
                    WindowPatch {
                        bookmarks: Some(list),
                        ..WindowPatch::default()
                    },
                )
            })
            .collect();
        let refreshed = self.registry.apply_patches(&patches);
        debug!("refreshed bookmarks of {refreshed} windows");
    }

    /// Folders the add-window dialog may offer. Empty outcomes also post a notice.
    pub fn add_window_options(&self) -> AddWindowOptions {
        let folders = unique_folders(&self.store.bookmarks());
        if folders.is_empty() {
            self.registry
                .notice(NoticeLevel::Error, "No bookmark folders are available.");
            return AddWindowOptions::NoFolders;
        }
        let available = self.registry.available_folders(&folders);
        if available.is_empty() {
            self.registry.notice(
                NoticeLevel::Error,
                "Every folder already has a window. Close one to add another.",
            );
            return AddWindowOptions::AllFoldersHaveWindows;
        }
        AddWindowOptions::Available(available)
    }

    /// Opens a window for `folder` at a random spot near the top left.
    ///
    /// # Errors
    ///
    /// Returns a [`HomepageError::StateConflict`] when the folder already has a window.
    pub fn add_window(&self, folder: &str) -> Result<WindowId, HomepageError> {
        let groups = group_by_folder(&self.store.bookmarks());
        let list = groups.get(folder).unwrap_or_default().to_vec();
        let position = {
            let mut rng = self.rng.borrow_mut();
            Position::new(
                ADD_WINDOW_ORIGIN + rng.random_range(0..ADD_WINDOW_SPREAD),
                ADD_WINDOW_ORIGIN + rng.random_range(0..ADD_WINDOW_SPREAD),
            )
        };
        let id = self
            .registry
            .create_window(WindowConfig::bookmark(folder).at(position).bookmarks(list))?;
        self.registry.notice(
            NoticeLevel::Success,
            format!("Window \"{folder}\" added."),
        );
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns a [`HomepageError::StateConflict`] for stale ids or a removal in flight.
    pub async fn close_window(&self, id: impl AsWindowId) -> Result<RemovedWindow, HomepageError> {
        let removed = self.registry.remove_window(id).await?;
        self.bridge.forget(removed.id);
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns a [`HomepageError::StateConflict`] for stale ids.
    pub fn toggle_minimize(&self, id: impl AsWindowId) -> Result<bool, HomepageError> {
        Ok(self.registry.toggle_minimize(id)?)
    }

    /// # Errors
    ///
    /// Returns a [`HomepageError::StateConflict`] for stale ids or unknown color classes.
    pub fn change_header_color(
        &self,
        id: impl AsWindowId,
        color_class: &str,
    ) -> Result<(), HomepageError> {
        Ok(self.registry.change_header_color(id, color_class)?)
    }

    /// Records the geometry the painter measured for each window and persists immediately.
    pub async fn save_current_layout(&self, measured: &[(WindowId, WindowPatch)]) -> FlushReport {
        let changed = self.registry.apply_patches(measured);
        let report = self.store.flush_now().await;
        debug!("layout saved ({changed} windows measured)");
        self.registry
            .notice(NoticeLevel::Success, "Layout saved.");
        report
    }

    /// Re-flows every window into the grid and persists. Returns how many windows moved.
    pub async fn auto_align(&self) -> usize {
        let windows = self.registry.windows();
        let plan = layout::auto_align(&windows, self.bridge.viewport(), &self.config.layout);
        let patches: Vec<(WindowId, WindowPatch)> = plan
            .placements
            .iter()
            .map(|(id, position)| {
                (
                    *id,
                    WindowPatch {
                        position: Some(*position),
                        size: Some(plan.size),
                        ..WindowPatch::default()
                    },
                )
            })
            .collect();
        let aligned = self.registry.apply_patches(&patches);
        self.store.flush_now().await;
        self.registry.notice(
            NoticeLevel::Success,
            format!(
                "{aligned} windows aligned in a {}x{} grid.",
                plan.shape.columns, plan.shape.rows
            ),
        );
        aligned
    }

    /// # Errors
    ///
    /// Returns [`HomepageError::Validation`] for unsafe values; the background is unchanged.
    pub fn set_background(&self, value: &str) -> Result<(), HomepageError> {
        if let Err(err) = validate_background(value) {
            warn!("rejected background: {err}");
            self.registry
                .notice(NoticeLevel::Error, "That background value is not allowed.");
            return Err(err.into());
        }
        self.store
            .set(StateValue::BackgroundImage(value.trim().to_string()), true);
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) {
        self.store.set(StateValue::Theme(theme), true);
    }

    pub fn toggle_theme(&self) -> Theme {
        let next = self.store.theme().toggled();
        self.set_theme(next);
        next
    }

    pub fn toggle_settings(&self) -> bool {
        let open = !self.settings_open.get();
        self.settings_open.set(open);
        open
    }

    /// Wipes both storage areas and all in-memory state, then starts over.
    ///
    /// # Errors
    ///
    /// Returns [`HomepageError::InitInProgress`] without touching anything while an `init`
    /// is running.
    pub async fn reset_settings(&self) -> Result<InitReport, HomepageError> {
        let Some(_guard) = self.initializing.try_acquire() else {
            warn!("initialization in progress; ignoring reset request");
            return Err(HomepageError::InitInProgress);
        };
        for (name, area) in [("local", &self.host.local), ("sync", &self.host.sync)] {
            if let Err(err) = area.clear().await {
                warn!("could not clear {name} storage: {err}");
            }
        }
        self.store.clear();
        self.cleanup();
        self.settings_open.set(false);
        info!("settings reset; restarting");
        Ok(self.run_init().await)
    }

    /// Answers a command from the extension shell. `OpenSettings` fails until the page has
    /// initialized; the caller retries.
    pub fn handle_host_command(&self, command: &HostCommand) -> HostReply {
        match command {
            HostCommand::OpenSettings if self.initialized.get() => {
                self.toggle_settings();
                HostReply::ok("Settings opened")
            }
            HostCommand::OpenSettings => HostReply::failed(HomepageError::NotReady.to_string()),
            HostCommand::GetStatus => HostReply {
                initialized: Some(self.initialized.get()),
                ..HostReply::ok("ready")
            },
            HostCommand::Unknown(action) => {
                debug!("unrecognized host action `{action}`");
                HostReply::failed(format!("unrecognized action: {action}"))
            }
        }
    }

    /// # Errors
    ///
    /// See [`RenderBridge::dispatch`].
    pub async fn dispatch(&self, event: UiEvent) -> Result<Vec<BridgeEffect>, HomepageError> {
        self.bridge.dispatch(event).await
    }

    /// Timer pump: runs a due debounced flush and releases throttled searches.
    pub async fn tick(&self) -> TickReport {
        let flushed = self.store.flush_if_due().await;
        TickReport {
            flushed,
            effects: self.bridge.poll_throttled(),
        }
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.bridge.set_viewport(viewport);
    }

    /// Notices posted since the last call, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow_mut().drain(..).collect()
    }

    pub fn debug_info(&self) -> AppDebugInfo {
        AppDebugInfo {
            host: self.host.strategy.as_str(),
            initialized: self.initialized.get(),
            settings_open: self.settings_open.get(),
            windows: self.registry.windows().len(),
            bookmarks: self.store.bookmarks().len(),
            theme: self.store.theme().as_str(),
            cached_filters: self.index.cached_results(),
            store: self.store.debug_info(),
        }
    }

    fn check_appearance(&self) {
        let background = self.store.background_image();
        if validate_background(&background).is_err() {
            warn!("stored background is not allowed; restoring the default");
            self.store.set(
                StateValue::BackgroundImage(DEFAULT_BACKGROUND.to_string()),
                true,
            );
        }
        debug!("theme: {}", self.store.theme().as_str());
    }

    fn cleanup(&self) {
        self.bridge.reset();
        self.index.clear_cache();
        self.initialized.set(false);
    }
}
