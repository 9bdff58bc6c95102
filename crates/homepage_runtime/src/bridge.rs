//! Projection of window records into view models, and translation of UI events back into
//! registry calls.
//!
//! The bridge holds no window state of its own. A view is always derived from the current
//! [`WindowRecord`] list; the painter on the host side turns [`WindowView`]s into DOM and
//! feeds [`UiEvent`]s back in. Events carry the ancestor path of the node that received them,
//! and the acting window is resolved from the nearest ancestor that names one.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use bookmark_index::{decode_html_entities, sanitize_url, Bookmark, BookmarkIndex};
use log::{debug, info, warn};
use platform_host::Clock;
use serde::Serialize;

use crate::{
    error::HomepageError,
    layout::clamp_drag_position,
    model::{
        AsWindowId, Position, Size, StateValue, Viewport, WindowId, WindowKind, WindowPatch,
        WindowRecord, DEFAULT_HEADER_COLOR, SEARCH_WINDOW_TITLE, TRANSLATION_WINDOW_TITLE,
    },
    palette::{color_options, folder_icon, ColorOption},
    registry::WindowRegistry,
    scheduler::Throttle,
    store::Store,
};

/// Bookmark rows rendered before a "load more" control is shown.
pub const LAZY_LOAD_THRESHOLD: usize = 50;
/// Minimum spacing between two bookmark searches in the same window.
pub const SEARCH_THROTTLE_MS: u64 = 200;

const DOM_ID_PREFIX: &str = "window-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Engine {
    pub name: &'static str,
    pub base_url: &'static str,
}

pub const SEARCH_ENGINES: [Engine; 4] = [
    Engine {
        name: "Google",
        base_url: "https://www.google.com/search?q=",
    },
    Engine {
        name: "Brave",
        base_url: "https://search.brave.com/search?q=",
    },
    Engine {
        name: "DuckDuckGo",
        base_url: "https://duckduckgo.com/?q=",
    },
    Engine {
        name: "Ecosia",
        base_url: "https://www.ecosia.org/search?q=",
    },
];

pub const TRANSLATION_ENGINES: [Engine; 3] = [
    Engine {
        name: "Google Translate",
        base_url: "https://translate.google.com/?sl=auto&tl=es&text=",
    },
    Engine {
        name: "DeepL",
        base_url: "https://www.deepl.com/translator#en/es/",
    },
    Engine {
        name: "Reverso Context",
        base_url: "https://context.reverso.net/traduccion/ingles-espanol/",
    },
];

fn engines_for(kind: WindowKind) -> &'static [Engine] {
    match kind {
        WindowKind::Search => &SEARCH_ENGINES,
        WindowKind::Translation => &TRANSLATION_ENGINES,
        WindowKind::Bookmark => &[],
    }
}

/// Navigation target for `text` on the named engine. Unknown names use the first engine.
/// Returns `None` for blank text or when the built address fails sanitation.
pub fn engine_url(engines: &[Engine], selected: &str, text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let engine = engines
        .iter()
        .find(|engine| engine.name == selected)
        .or_else(|| engines.first())?;
    sanitize_url(&format!("{}{}", engine.base_url, urlencoding::encode(text)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Control {
    ColorPicker,
    Minimize,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkItem {
    pub id: String,
    pub title: String,
    /// Sanitized address; `None` renders an inert row.
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineOption {
    pub name: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WindowBody {
    Bookmarks {
        items: Vec<BookmarkItem>,
        remaining: usize,
    },
    Search {
        engines: Vec<EngineOption>,
    },
    Translation {
        engines: Vec<EngineOption>,
    },
}

/// Everything a painter needs to draw one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    pub id: WindowId,
    pub dom_id: String,
    pub classes: Vec<String>,
    pub header_class: String,
    pub icon: String,
    pub title: String,
    pub position: Position,
    pub size: Size,
    pub z_index: u32,
    pub controls: Vec<Control>,
    pub body: WindowBody,
}

/// Rows to render from `list`, capped at `limit`, plus how many were held back.
pub fn bookmark_items(list: &[Bookmark], limit: Option<usize>) -> (Vec<BookmarkItem>, usize) {
    let shown = limit.map_or(list.len(), |limit| limit.min(list.len()));
    let items = list[..shown]
        .iter()
        .map(|bookmark| BookmarkItem {
            id: bookmark.id.clone(),
            title: decode_html_entities(&bookmark.title),
            href: sanitize_url(&bookmark.url),
        })
        .collect();
    (items, list.len() - shown)
}

fn lazy_limit(len: usize, expanded: bool) -> Option<usize> {
    (!expanded && len > LAZY_LOAD_THRESHOLD).then_some(LAZY_LOAD_THRESHOLD)
}

/// One node on the path from an event target up to the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRef {
    pub id: Option<String>,
    /// Value of the node's `data-window-id` attribute.
    pub window_id: Option<String>,
}

impl NodeRef {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            window_id: None,
        }
    }

    pub fn with_window_id(window_id: impl Into<String>) -> Self {
        Self {
            id: None,
            window_id: Some(window_id.into()),
        }
    }

    fn window_ref(&self) -> Option<&str> {
        self.window_id.as_deref().or_else(|| {
            self.id
                .as_deref()
                .filter(|id| id.starts_with(DOM_ID_PREFIX))
        })
    }
}

/// Window id named by the nearest node on `path` (target first).
pub fn resolve_window_id(path: &[NodeRef]) -> Option<WindowId> {
    path.iter()
        .find_map(NodeRef::window_ref)
        .and_then(|raw| raw.as_window_id())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEventKind {
    PointerDown { x: i32, y: i32 },
    PointerMove { x: i32, y: i32 },
    PointerUp,
    CloseClick,
    ColorPickClick,
    ColorChosen(String),
    MinimizeClick,
    BookmarkSearch(String),
    QuerySubmit(String),
    EngineSelect(String),
    BookmarkClick(String),
    LoadMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    pub kind: UiEventKind,
    /// Target first, root last.
    pub path: Vec<NodeRef>,
}

impl UiEvent {
    pub fn new(kind: UiEventKind, path: Vec<NodeRef>) -> Self {
        Self { kind, path }
    }

    /// An event whose target sits directly inside the window's root node.
    pub fn on_window(kind: UiEventKind, id: WindowId) -> Self {
        Self::new(
            kind,
            vec![NodeRef::default(), NodeRef::with_window_id(id.to_string())],
        )
    }
}

/// Instructions for the painter produced while handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEffect {
    Render(WindowId),
    RenderAll,
    Raise { id: WindowId, z_index: u32 },
    Move { id: WindowId, position: Position },
    Unmount(WindowId),
    ShowColorPicker {
        id: WindowId,
        options: &'static [ColorOption],
    },
    ShowBookmarks {
        id: WindowId,
        items: Vec<BookmarkItem>,
        remaining: usize,
    },
    Navigate(String),
    ClearInput(WindowId),
}

/// What a painter reports as mounted, for drift checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedWindow {
    pub dom_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    /// In state but not mounted.
    Missing(WindowId),
    /// Mounted but not in state.
    Orphan(String),
    TitleMismatch {
        id: WindowId,
        expected: String,
        found: String,
    },
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    id: WindowId,
    pointer_start: Position,
    origin: Position,
    size: Size,
}

pub struct RenderBridge {
    registry: Rc<WindowRegistry>,
    store: Store,
    index: Rc<BookmarkIndex>,
    clock: Rc<dyn Clock>,
    viewport: Cell<Viewport>,
    drag: RefCell<Option<DragSession>>,
    searches: RefCell<BTreeMap<WindowId, Throttle<String>>>,
    expanded: RefCell<BTreeSet<WindowId>>,
    stacking: RefCell<BTreeMap<WindowId, u32>>,
    next_z: Cell<u32>,
}

impl RenderBridge {
    pub fn new(
        registry: Rc<WindowRegistry>,
        store: Store,
        index: Rc<BookmarkIndex>,
        clock: Rc<dyn Clock>,
        viewport: Viewport,
    ) -> Self {
        Self {
            registry,
            store,
            index,
            clock,
            viewport: Cell::new(viewport),
            drag: RefCell::new(None),
            searches: RefCell::new(BTreeMap::new()),
            expanded: RefCell::new(BTreeSet::new()),
            stacking: RefCell::new(BTreeMap::new()),
            next_z: Cell::new(1),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.borrow().is_some()
    }

    /// Views for every window, in registry order.
    pub fn views(&self) -> Vec<WindowView> {
        self.registry
            .windows()
            .iter()
            .map(|record| self.project(record))
            .collect()
    }

    pub fn view(&self, id: impl AsWindowId) -> Option<WindowView> {
        self.registry.get(id).map(|record| self.project(&record))
    }

    pub fn project(&self, record: &WindowRecord) -> WindowView {
        let mut classes = vec!["window".to_string(), format!("{}-window", record.kind.as_str())];
        if let Some(color) = &record.color_class {
            classes.push(color.clone());
        }
        if record.minimized {
            classes.push("minimized".to_string());
        }

        let (icon, title, controls, body) = match record.kind {
            WindowKind::Bookmark => {
                let expanded = self.expanded.borrow().contains(&record.id);
                let (items, remaining) = bookmark_items(
                    &record.bookmarks,
                    lazy_limit(record.bookmarks.len(), expanded),
                );
                (
                    folder_icon(&record.folder),
                    decode_html_entities(&record.folder),
                    vec![Control::ColorPicker, Control::Close],
                    WindowBody::Bookmarks { items, remaining },
                )
            }
            WindowKind::Search => (
                "🔍".to_string(),
                SEARCH_WINDOW_TITLE.to_string(),
                vec![Control::Minimize],
                WindowBody::Search {
                    engines: engine_options(&SEARCH_ENGINES, &self.store.default_search_engine()),
                },
            ),
            WindowKind::Translation => (
                "🌐".to_string(),
                TRANSLATION_WINDOW_TITLE.to_string(),
                vec![Control::Minimize],
                WindowBody::Translation {
                    engines: engine_options(
                        &TRANSLATION_ENGINES,
                        &self.store.default_translation_engine(),
                    ),
                },
            ),
        };

        WindowView {
            id: record.id,
            dom_id: record.id.dom_id(),
            classes,
            header_class: record
                .header_color
                .clone()
                .unwrap_or_else(|| DEFAULT_HEADER_COLOR.to_string()),
            icon,
            title,
            position: record.position,
            size: record.size,
            z_index: self.stacking.borrow().get(&record.id).copied().unwrap_or(0),
            controls,
            body,
        }
    }

    /// Applies one UI event. Events that name no known window are ignored.
    ///
    /// # Errors
    ///
    /// Registry rejections (stale ids, busy removal, unknown colors) are returned as
    /// [`HomepageError::StateConflict`]; the window list is unchanged in that case.
    pub async fn dispatch(&self, event: UiEvent) -> Result<Vec<BridgeEffect>, HomepageError> {
        match event.kind {
            UiEventKind::PointerMove { x, y } => return Ok(self.drag_to(Position::new(x, y))),
            UiEventKind::PointerUp => return Ok(self.end_drag()),
            _ => {}
        }

        let Some(id) = resolve_window_id(&event.path) else {
            debug!("ignoring {:?}: no window on the event path", event.kind);
            return Ok(Vec::new());
        };

        let effects = match event.kind {
            UiEventKind::PointerDown { x, y } => self.begin_drag(id, Position::new(x, y)),
            UiEventKind::CloseClick => {
                let removed = self.registry.remove_window(id).await?;
                self.forget(removed.id);
                vec![BridgeEffect::Unmount(removed.id)]
            }
            UiEventKind::ColorPickClick => vec![BridgeEffect::ShowColorPicker {
                id,
                options: color_options(),
            }],
            UiEventKind::ColorChosen(class) => {
                self.registry.change_header_color(id, &class)?;
                vec![BridgeEffect::Render(id)]
            }
            UiEventKind::MinimizeClick => {
                self.registry.toggle_minimize(id)?;
                vec![BridgeEffect::RenderAll]
            }
            UiEventKind::BookmarkSearch(term) => self.search(id, term),
            UiEventKind::QuerySubmit(text) => self.submit_query(id, &text),
            UiEventKind::EngineSelect(name) => self.select_engine(id, name),
            UiEventKind::BookmarkClick(url) => match sanitize_url(&url) {
                Some(href) => vec![BridgeEffect::Navigate(href)],
                None => {
                    warn!("blocked navigation to unsafe bookmark address");
                    Vec::new()
                }
            },
            UiEventKind::LoadMore => {
                self.expanded.borrow_mut().insert(id);
                vec![BridgeEffect::Render(id)]
            }
            UiEventKind::PointerMove { .. } | UiEventKind::PointerUp => Vec::new(),
        };
        Ok(effects)
    }

    /// Releases bookmark searches held back by the throttle.
    pub fn poll_throttled(&self) -> Vec<BridgeEffect> {
        let now = self.clock.now_ms();
        let due: Vec<(WindowId, String)> = self
            .searches
            .borrow_mut()
            .iter_mut()
            .filter_map(|(id, throttle)| throttle.poll(now).map(|term| (*id, term)))
            .collect();
        due.into_iter()
            .filter_map(|(id, term)| self.search_results(id, &term))
            .collect()
    }

    pub fn has_pending_searches(&self) -> bool {
        self.searches.borrow().values().any(Throttle::has_pending)
    }

    /// Compares what the painter has mounted against registry state. State is never changed;
    /// mismatches are logged and returned.
    pub fn detect_drift(&self, mounted: &[MountedWindow]) -> Vec<Drift> {
        let views = self.views();
        let mut drift = Vec::new();
        for view in &views {
            match mounted.iter().find(|m| m.dom_id == view.dom_id) {
                None => drift.push(Drift::Missing(view.id)),
                Some(found) if found.title.trim() != view.title => {
                    drift.push(Drift::TitleMismatch {
                        id: view.id,
                        expected: view.title.clone(),
                        found: found.title.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        for found in mounted {
            if !views.iter().any(|view| view.dom_id == found.dom_id) {
                drift.push(Drift::Orphan(found.dom_id.clone()));
            }
        }
        for entry in &drift {
            warn!("render drift: {entry:?}");
        }
        drift
    }

    fn begin_drag(&self, id: WindowId, pointer: Position) -> Vec<BridgeEffect> {
        let Some(record) = self.registry.get(id) else {
            warn!("drag started on unknown window {id}");
            return Vec::new();
        };
        *self.drag.borrow_mut() = Some(DragSession {
            id,
            pointer_start: pointer,
            origin: record.position,
            size: record.size,
        });
        let z_index = self.next_z.get();
        self.next_z.set(z_index + 1);
        self.stacking.borrow_mut().insert(id, z_index);
        vec![BridgeEffect::Raise { id, z_index }]
    }

    fn drag_to(&self, pointer: Position) -> Vec<BridgeEffect> {
        let Some(session) = *self.drag.borrow() else {
            return Vec::new();
        };
        let target = session.origin.offset(
            pointer.x - session.pointer_start.x,
            pointer.y - session.pointer_start.y,
        );
        let position = clamp_drag_position(target, session.size, self.viewport.get());
        match self
            .registry
            .update_window_with(session.id, WindowPatch::position(position), false)
        {
            Ok(()) => vec![BridgeEffect::Move {
                id: session.id,
                position,
            }],
            Err(error) => {
                warn!("dropping drag: {error}");
                self.drag.borrow_mut().take();
                Vec::new()
            }
        }
    }

    fn end_drag(&self) -> Vec<BridgeEffect> {
        if let Some(session) = self.drag.borrow_mut().take() {
            debug!("drag of window {} finished", session.id);
            self.store.request_flush();
        }
        Vec::new()
    }

    fn search(&self, id: WindowId, term: String) -> Vec<BridgeEffect> {
        let now = self.clock.now_ms();
        let released = self
            .searches
            .borrow_mut()
            .entry(id)
            .or_insert_with(|| Throttle::new(SEARCH_THROTTLE_MS))
            .offer(now, term);
        released
            .and_then(|term| self.search_results(id, &term))
            .into_iter()
            .collect()
    }

    fn search_results(&self, id: WindowId, term: &str) -> Option<BridgeEffect> {
        let record = self.registry.get(id)?;
        if record.kind != WindowKind::Bookmark {
            return None;
        }
        let matches = self.index.filter(&record.bookmarks, term);
        let (items, remaining) = bookmark_items(&matches, lazy_limit(matches.len(), false));
        Some(BridgeEffect::ShowBookmarks {
            id,
            items,
            remaining,
        })
    }

    fn submit_query(&self, id: WindowId, text: &str) -> Vec<BridgeEffect> {
        let Some(record) = self.registry.get(id) else {
            return Vec::new();
        };
        let selected = match record.kind {
            WindowKind::Search => self.store.default_search_engine(),
            WindowKind::Translation => self.store.default_translation_engine(),
            WindowKind::Bookmark => return Vec::new(),
        };
        match engine_url(engines_for(record.kind), &selected, text) {
            Some(url) => {
                info!("navigating via {selected}");
                vec![BridgeEffect::Navigate(url), BridgeEffect::ClearInput(id)]
            }
            None => Vec::new(),
        }
    }

    fn select_engine(&self, id: WindowId, name: String) -> Vec<BridgeEffect> {
        let Some(record) = self.registry.get(id) else {
            return Vec::new();
        };
        if !engines_for(record.kind).iter().any(|engine| engine.name == name) {
            warn!("ignoring unknown engine `{name}`");
            return Vec::new();
        }
        let value = match record.kind {
            WindowKind::Search => StateValue::DefaultSearchEngine(name),
            WindowKind::Translation => StateValue::DefaultTranslationEngine(name),
            WindowKind::Bookmark => return Vec::new(),
        };
        self.store.set(value, true);
        vec![BridgeEffect::Render(id)]
    }

    /// Drops drag, search, and paging state. Window records are untouched.
    pub fn reset(&self) {
        self.drag.borrow_mut().take();
        self.searches.borrow_mut().clear();
        self.expanded.borrow_mut().clear();
        self.stacking.borrow_mut().clear();
        self.next_z.set(1);
    }

    pub(crate) fn forget(&self, id: WindowId) {
        self.searches.borrow_mut().remove(&id);
        self.expanded.borrow_mut().remove(&id);
        self.stacking.borrow_mut().remove(&id);
        let dragging_removed = self.drag.borrow().is_some_and(|session| session.id == id);
        if dragging_removed {
            self.drag.borrow_mut().take();
        }
    }
}

fn engine_options(engines: &[Engine], selected: &str) -> Vec<EngineOption> {
    let known = engines.iter().any(|engine| engine.name == selected);
    engines
        .iter()
        .enumerate()
        .map(|(index, engine)| EngineOption {
            name: engine.name,
            selected: engine.name == selected || (!known && index == 0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{ManualClock, MemoryStorageArea};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{model::WindowConfig, store::StoreConfig};

    struct Harness {
        bridge: RenderBridge,
        registry: Rc<WindowRegistry>,
        store: Store,
        local: MemoryStorageArea,
        clock: ManualClock,
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
        let registry = Rc::new(WindowRegistry::new(store.clone(), Rc::new(clock.clone())));
        let index = Rc::new(BookmarkIndex::new(Rc::new(clock.clone())));
        let bridge = RenderBridge::new(
            Rc::clone(&registry),
            store.clone(),
            index,
            Rc::new(clock.clone()),
            Viewport::new(1280, 800),
        );
        Harness {
            bridge,
            registry,
            store,
            local,
            clock,
        }
    }

    fn many_bookmarks(count: usize) -> Vec<Bookmark> {
        (0..count)
            .map(|n| {
                Bookmark::new(
                    format!("b{n}"),
                    format!("Site {n}"),
                    format!("https://site{n}.example/"),
                    "Dev",
                )
            })
            .collect()
    }

    #[test]
    fn resolves_id_from_nearest_ancestor() {
        let path = vec![
            NodeRef::default(),
            NodeRef::with_id("close-icon"),
            NodeRef::with_window_id("42"),
            NodeRef::with_id("window-7"),
        ];
        assert_eq!(resolve_window_id(&path), Some(WindowId(42)));
        assert_eq!(
            resolve_window_id(&[NodeRef::default(), NodeRef::with_id("window-7")]),
            Some(WindowId(7))
        );
        assert_eq!(resolve_window_id(&[NodeRef::with_id("toolbar")]), None);
    }

    #[test]
    fn bookmark_view_is_lazy_until_expanded() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev").bookmarks(many_bookmarks(73)))
            .expect("create");

        let view = h.bridge.view(id).expect("view");
        assert_eq!(view.dom_id, format!("window-{}", id.0));
        assert_eq!(view.controls, vec![Control::ColorPicker, Control::Close]);
        match &view.body {
            WindowBody::Bookmarks { items, remaining } => {
                assert_eq!(items.len(), LAZY_LOAD_THRESHOLD);
                assert_eq!(*remaining, 23);
            }
            other => panic!("unexpected body {other:?}"),
        }

        let effects = block_on(h.bridge.dispatch(UiEvent::on_window(UiEventKind::LoadMore, id)))
            .expect("load more");
        assert_eq!(effects, vec![BridgeEffect::Render(id)]);
        match h.bridge.view(id).expect("view").body {
            WindowBody::Bookmarks { items, remaining } => {
                assert_eq!(items.len(), 73);
                assert_eq!(remaining, 0);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn unsafe_bookmark_rows_render_without_href() {
        let list = vec![
            Bookmark::new("1", "Tom &amp; Jerry", "https://example.com", "Fun"),
            Bookmark::new("2", "Bad", "https://example.com/?x=javascript:1", "Fun"),
        ];
        let (items, remaining) = bookmark_items(&list, None);
        assert_eq!(remaining, 0);
        assert_eq!(items[0].title, "Tom & Jerry");
        assert_eq!(items[0].href.as_deref(), Some("https://example.com/"));
        assert_eq!(items[1].href, None);
    }

    #[test]
    fn drag_moves_continuously_and_persists_once_on_release() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev").at(Position::new(100, 100)))
            .expect("create");
        block_on(h.store.flush_now());
        let writes_before = h.local.write_count();

        let effects = block_on(h.bridge.dispatch(UiEvent::new(
            UiEventKind::PointerDown { x: 110, y: 105 },
            vec![NodeRef::with_id("title-span"), NodeRef::with_window_id(id.to_string())],
        )))
        .expect("down");
        assert!(matches!(effects[0], BridgeEffect::Raise { .. }));

        for step in 1..=10 {
            let moved = block_on(h.bridge.dispatch(UiEvent::new(
                UiEventKind::PointerMove {
                    x: 110 + step * 20,
                    y: 105 + step * 5,
                },
                Vec::new(),
            )))
            .expect("move");
            assert_eq!(moved.len(), 1);
            h.clock.advance(16);
        }
        assert_eq!(
            h.registry.get(id).map(|w| w.position),
            Some(Position::new(300, 150))
        );
        h.clock.advance(5_000);
        assert_eq!(block_on(h.store.flush_if_due()), None);
        assert_eq!(h.local.write_count(), writes_before);

        block_on(h.bridge.dispatch(UiEvent::new(UiEventKind::PointerUp, Vec::new())))
            .expect("up");
        assert!(!h.bridge.is_dragging());
        h.clock.advance(1_000);
        assert!(block_on(h.store.flush_if_due()).is_some());
        assert_eq!(h.local.write_count(), writes_before + 1);
    }

    #[test]
    fn drag_is_clamped_to_viewport() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev").at(Position::new(100, 100)))
            .expect("create");
        block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::PointerDown { x: 0, y: 0 },
            id,
        )))
        .expect("down");
        block_on(h.bridge.dispatch(UiEvent::new(
            UiEventKind::PointerMove { x: 5_000, y: -5_000 },
            Vec::new(),
        )))
        .expect("move");
        assert_eq!(
            h.registry.get(id).map(|w| w.position),
            Some(Position::new(1280 - 350, 0))
        );
    }

    #[test]
    fn bookmark_search_is_throttled_per_window() {
        let h = harness();
        let list = vec![
            Bookmark::new("1", "GitHub", "https://github.com", "Dev"),
            Bookmark::new("2", "Docs", "https://docs.rs", "Dev"),
        ];
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev").bookmarks(list))
            .expect("create");

        let first = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::BookmarkSearch("g".into()),
            id,
        )))
        .expect("search");
        assert_eq!(first.len(), 1);

        h.clock.advance(50);
        let held = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::BookmarkSearch("doc".into()),
            id,
        )))
        .expect("search");
        assert!(held.is_empty());
        assert!(h.bridge.has_pending_searches());
        assert!(h.bridge.poll_throttled().is_empty());

        h.clock.advance(SEARCH_THROTTLE_MS);
        let released = h.bridge.poll_throttled();
        match released.as_slice() {
            [BridgeEffect::ShowBookmarks { items, .. }] => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].title, "Docs");
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn query_submit_uses_selected_engine() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::new(WindowKind::Search))
            .expect("create");

        let effects = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::EngineSelect("DuckDuckGo".into()),
            id,
        )))
        .expect("select");
        assert_eq!(effects, vec![BridgeEffect::Render(id)]);
        assert_eq!(h.store.default_search_engine(), "DuckDuckGo");

        let effects = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::QuerySubmit("  rust lang ".into()),
            id,
        )))
        .expect("submit");
        assert_eq!(
            effects,
            vec![
                BridgeEffect::Navigate("https://duckduckgo.com/?q=rust%20lang".into()),
                BridgeEffect::ClearInput(id),
            ]
        );

        let blank = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::QuerySubmit("   ".into()),
            id,
        )))
        .expect("submit");
        assert!(blank.is_empty());
    }

    #[test]
    fn unknown_engine_is_ignored_and_first_engine_is_selected() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::new(WindowKind::Translation))
            .expect("create");
        h.store
            .set(StateValue::DefaultTranslationEngine("Babelfish".into()), false);
        let effects = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::EngineSelect("Babelfish".into()),
            id,
        )))
        .expect("select");
        assert!(effects.is_empty());
        match h.bridge.view(id).expect("view").body {
            WindowBody::Translation { engines } => {
                assert!(engines[0].selected);
                assert_eq!(engines.iter().filter(|e| e.selected).count(), 1);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn bookmark_click_navigates_only_to_safe_addresses() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev"))
            .expect("create");
        let ok = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::BookmarkClick("https://github.com".into()),
            id,
        )))
        .expect("click");
        assert_eq!(ok, vec![BridgeEffect::Navigate("https://github.com/".into())]);
        let blocked = block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::BookmarkClick("javascript:alert(1)".into()),
            id,
        )))
        .expect("click");
        assert!(blocked.is_empty());
    }

    #[test]
    fn close_click_unmounts_and_stale_close_conflicts() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Dev"))
            .expect("create");
        let effects = block_on(h.bridge.dispatch(UiEvent::on_window(UiEventKind::CloseClick, id)))
            .expect("close");
        assert_eq!(effects, vec![BridgeEffect::Unmount(id)]);
        let stale = block_on(h.bridge.dispatch(UiEvent::on_window(UiEventKind::CloseClick, id)));
        assert!(matches!(stale, Err(HomepageError::StateConflict(_))));
    }

    #[test]
    fn color_events_open_picker_and_apply_choice() {
        let h = harness();
        let id = h
            .registry
            .create_window(WindowConfig::bookmark("Misc"))
            .expect("create");
        let picker = block_on(h.bridge.dispatch(UiEvent::on_window(UiEventKind::ColorPickClick, id)))
            .expect("pick");
        assert!(matches!(
            picker.as_slice(),
            [BridgeEffect::ShowColorPicker { options, .. }] if options.len() == color_options().len()
        ));
        block_on(h.bridge.dispatch(UiEvent::on_window(
            UiEventKind::ColorChosen("header-color-news".into()),
            id,
        )))
        .expect("choose");
        assert_eq!(
            h.bridge.view(id).map(|v| v.header_class),
            Some("header-color-news".to_string())
        );
    }

    #[test]
    fn drift_is_reported_without_touching_state() {
        let h = harness();
        let dev = h
            .registry
            .create_window(WindowConfig::bookmark("Dev"))
            .expect("create");
        let news = h
            .registry
            .create_window(WindowConfig::bookmark("News"))
            .expect("create");
        let mounted = vec![
            MountedWindow {
                dom_id: dev.dom_id(),
                title: "Development".into(),
            },
            MountedWindow {
                dom_id: "window-1".into(),
                title: "Ghost".into(),
            },
        ];
        let drift = h.bridge.detect_drift(&mounted);
        assert_eq!(
            drift,
            vec![
                Drift::TitleMismatch {
                    id: dev,
                    expected: "Dev".into(),
                    found: "Development".into(),
                },
                Drift::Missing(news),
                Drift::Orphan("window-1".into()),
            ]
        );
        assert_eq!(h.registry.windows().len(), 2);
    }
}
