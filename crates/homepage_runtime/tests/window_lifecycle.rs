use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use futures::{executor::block_on, join};
use homepage_runtime::{
    AppConfig, HomepageApp, HomepageError, LoadSource, NodeRef, Position, RegistryError,
    RegistryEvent, Store, StoreConfig, UiEvent, UiEventKind, Viewport, WindowConfig, WindowKind,
    WindowPatch, WindowRegistry,
};
use platform_host::{
    BookmarkTreeNode, HostServices, HostStrategy, ManualClock, MemoryBookmarkSource,
    MemoryStorageArea, NoopNotificationService, StorageArea, StorageFuture,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

/// Completes on the second poll, after waking its task.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Memory area whose every call suspends once before completing.
#[derive(Clone, Default)]
struct SlowArea {
    inner: MemoryStorageArea,
}

impl StorageArea for SlowArea {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<Option<Value>, String>> {
        Box::pin(async move {
            YieldOnce(false).await;
            self.inner.get(key).await
        })
    }

    fn set<'a>(&'a self, entries: Map<String, Value>) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move {
            YieldOnce(false).await;
            self.inner.set(entries).await
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move {
            YieldOnce(false).await;
            self.inner.remove(key).await
        })
    }

    fn clear<'a>(&'a self) -> StorageFuture<'a, Result<(), String>> {
        Box::pin(async move {
            YieldOnce(false).await;
            self.inner.clear().await
        })
    }
}

fn tree() -> Vec<BookmarkTreeNode> {
    vec![BookmarkTreeNode::folder(
        "Bookmarks bar",
        vec![
            BookmarkTreeNode::folder(
                "Dev",
                vec![BookmarkTreeNode::leaf("GH", "https://github.com")],
            ),
            BookmarkTreeNode::folder(
                "Reading",
                vec![BookmarkTreeNode::leaf("LWN", "https://lwn.net")],
            ),
        ],
    )]
}

fn host(local: Rc<dyn StorageArea>, clock: &ManualClock) -> HostServices {
    HostServices {
        strategy: HostStrategy::Headless,
        local,
        sync: Rc::new(MemoryStorageArea::default()),
        bookmarks: Rc::new(MemoryBookmarkSource::new(tree())),
        notifications: Rc::new(NoopNotificationService),
        clock: Rc::new(clock.clone()),
    }
}

fn config() -> AppConfig {
    AppConfig {
        viewport: Viewport::new(1600, 1200),
        ..AppConfig::default()
    }
}

#[test]
fn concurrent_removal_of_one_window_removes_it_once() {
    let clock = ManualClock::new(1_700_000_000_000);
    let local = SlowArea::default();
    let store = Store::new(
        Rc::new(local.clone()),
        Rc::new(MemoryStorageArea::default()),
        Rc::new(clock.clone()),
        StoreConfig::default(),
    );
    let registry = WindowRegistry::new(store.clone(), Rc::new(clock));
    let id = registry
        .create_window(WindowConfig::bookmark("Work"))
        .expect("create");
    let removed_events = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&removed_events);
    registry.events().subscribe(move |event: &RegistryEvent| {
        if matches!(event, RegistryEvent::Removed { .. }) {
            *counter.borrow_mut() += 1;
        }
    });

    let (first, second) = block_on(async {
        join!(registry.remove_window(id), registry.remove_window(id))
    });

    assert_eq!(first.map(|removed| removed.remaining), Ok(0));
    assert_eq!(second, Err(RegistryError::RemovalInProgress));
    assert_eq!(*removed_events.borrow(), 1);
    assert!(registry.windows().is_empty());
    assert!(!registry.is_removal_in_progress());
    assert_eq!(local.inner.write_count(), 1);
}

#[test]
fn duplicate_folder_window_is_rejected() {
    let clock = ManualClock::new(1_700_000_000_000);
    let store = Store::new(
        Rc::new(MemoryStorageArea::default()),
        Rc::new(MemoryStorageArea::default()),
        Rc::new(clock.clone()),
        StoreConfig::default(),
    );
    let registry = WindowRegistry::new(store, Rc::new(clock));
    registry
        .create_window(WindowConfig::bookmark("Work"))
        .expect("first");
    let second = registry.create_window(WindowConfig::bookmark("Work"));

    assert_eq!(second, Err(RegistryError::DuplicateFolder("Work".to_string())));
    let work: Vec<_> = registry
        .windows()
        .iter()
        .filter(|w| w.is_bookmark_window_for("Work"))
        .map(|w| w.id)
        .collect();
    assert_eq!(work.len(), 1);
}

#[test]
fn overlapping_init_is_dropped() {
    let clock = ManualClock::new(1_700_000_000_000);
    let app = HomepageApp::new(host(Rc::new(SlowArea::default()), &clock), config());

    let (first, second) = block_on(async { join!(app.init(), app.init()) });

    assert!(first.is_ok());
    assert_eq!(second.err(), Some(HomepageError::InitInProgress));
    assert!(app.is_initialized());
    assert_eq!(app.registry().windows().len(), 4);
}

#[test]
fn reset_during_init_leaves_storage_alone() {
    let clock = ManualClock::new(1_700_000_000_000);
    let local = SlowArea::default();
    let mut marker = Map::new();
    marker.insert("marker".to_string(), json!(true));
    block_on(local.inner.set(marker)).expect("seed");
    let app = HomepageApp::new(host(Rc::new(local.clone()), &clock), config());

    let (init, reset) = block_on(async { join!(app.init(), app.reset_settings()) });

    assert!(init.is_ok());
    assert_eq!(reset.err(), Some(HomepageError::InitInProgress));
    assert!(app.is_initialized());
    assert_eq!(app.registry().windows().len(), 4);
    assert_eq!(
        block_on(local.inner.get("marker")).expect("read"),
        Some(json!(true))
    );

    let report = block_on(app.reset_settings()).expect("reset after init");
    assert_eq!(report.restored_from, None);
    assert_eq!(block_on(local.inner.get("marker")).expect("read"), None);
    assert_eq!(app.registry().windows().len(), 4);
}

#[test]
fn restored_layout_keeps_one_window_per_folder() {
    let clock = ManualClock::new(1_700_000_000_000);
    let local = MemoryStorageArea::default();
    let mut seed = Map::new();
    seed.insert(
        "bookmarkManager_fullConfig".to_string(),
        json!({
            "windows": [
                {"id": 1, "type": "bookmark", "folder": "Dev", "position": {"x": 0, "y": 0}},
                {"id": 2, "type": "bookmark", "folder": "Dev", "position": {"x": 40, "y": 0}},
                {"id": 3, "type": "search", "folder": "Search", "position": {"x": 0, "y": 0}},
                {"id": 4, "type": "search", "folder": "Search", "position": {"x": 0, "y": 0}},
                {"id": 5, "type": "bookmark", "folder": "Reading", "position": {"x": 400, "y": 0}}
            ],
            "layoutSaved": true
        }),
    );
    block_on(local.set(seed)).expect("seed");
    let app = HomepageApp::new(host(Rc::new(local), &clock), config());

    let report = block_on(app.init()).expect("init");

    assert_eq!(report.restored_from, Some(LoadSource::LocalFull));
    let windows = app.registry().windows();
    let dev: Vec<u64> = windows
        .iter()
        .filter(|w| w.is_bookmark_window_for("Dev"))
        .map(|w| w.id.0)
        .collect();
    assert_eq!(dev, vec![1]);
    let searches = windows.iter().filter(|w| w.kind == WindowKind::Search).count();
    assert_eq!(searches, 1);

    let reading = app
        .registry()
        .find_bookmark_window("Reading")
        .expect("reading window");
    let renamed = app.registry().update_window(
        reading.id,
        WindowPatch {
            folder: Some("Dev".to_string()),
            ..WindowPatch::default()
        },
    );
    assert_eq!(renamed, Err(RegistryError::DuplicateFolder("Dev".to_string())));
    assert_eq!(
        app.registry().get(reading.id).map(|w| w.folder),
        Some("Reading".to_string())
    );
}

#[test]
fn layout_survives_a_restart() {
    let clock = ManualClock::new(1_700_000_000_000);
    let local = MemoryStorageArea::default();

    let first = HomepageApp::new(host(Rc::new(local.clone()), &clock), config());
    block_on(first.init()).expect("init");
    let dev = first
        .registry()
        .find_bookmark_window("Dev")
        .expect("dev window");

    let grab = UiEvent::new(
        UiEventKind::PointerDown { x: 60, y: 210 },
        vec![
            NodeRef::with_id("dev-title"),
            NodeRef::with_window_id(dev.id.to_string()),
        ],
    );
    block_on(first.dispatch(grab)).expect("pointer down");
    block_on(first.dispatch(UiEvent::new(
        UiEventKind::PointerMove { x: 360, y: 510 },
        Vec::new(),
    )))
    .expect("pointer move");
    block_on(first.dispatch(UiEvent::new(UiEventKind::PointerUp, Vec::new())))
        .expect("pointer up");
    clock.advance(1_000);
    assert!(block_on(first.tick()).flushed.is_some());

    let second = HomepageApp::new(host(Rc::new(local), &clock), config());
    let report = block_on(second.init()).expect("restart");

    assert_eq!(report.restored_from, Some(LoadSource::LocalFull));
    let restored = second
        .registry()
        .find_bookmark_window("Dev")
        .expect("dev restored");
    assert_eq!(restored.id, dev.id);
    assert_eq!(restored.position, Position::new(350, 500));
    assert_eq!(restored.bookmarks.len(), 1);
    assert_eq!(second.registry().windows().len(), 4);
    assert!(second
        .registry()
        .find_by_kind(WindowKind::Search)
        .is_some());
}
