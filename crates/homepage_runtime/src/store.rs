//! Key/value application state with subscriptions and debounced two-tier persistence.
//!
//! The in-memory [`AppState`] is the source of truth. Writes notify subscribers
//! synchronously and, when asked to persist, arm a debounce; the host tick then calls
//! [`Store::flush_if_due`]. A flush writes the full snapshot to the local area and the light
//! snapshot to the synced area. Storage failures are logged and otherwise ignored.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::{Rc, Weak},
};

use bookmark_index::Bookmark;
use log::{debug, error, info, warn};
use platform_host::{iso8601_from_unix_ms, Clock, HostServices, StorageArea};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    model::{AppState, StateKey, StateValue, Theme, WindowRecord},
    persistence::{
        config_object, full_snapshot_entries, light_snapshot_entries, state_values_from_config,
        FULL_CONFIG_KEY,
    },
    scheduler::Debouncer,
};

/// Light keys read back from the synced area when no full snapshot exists anywhere.
const HYDRATE_LIGHT_KEYS: [&str; 4] = [
    "theme",
    "backgroundImage",
    "defaultSearchEngine",
    "defaultTranslationEngine",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub debounce_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { debounce_ms: 1_000 }
    }
}

/// Store subscriber. An `Err` is logged and does not stop the remaining subscribers.
type Callback = Rc<dyn Fn(&StateValue, &StateValue, StateKey) -> Result<(), String>>;

struct StoreInner {
    state: RefCell<AppState>,
    subscribers: RefCell<BTreeMap<StateKey, Vec<(u64, Callback)>>>,
    next_subscription: Cell<u64>,
    debouncer: RefCell<Debouncer>,
    local: Rc<dyn StorageArea>,
    sync: Rc<dyn StorageArea>,
    clock: Rc<dyn Clock>,
}

/// Shared handle to the application store. Clones refer to the same state.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    inner: Weak<StoreInner>,
    key: StateKey,
    id: u64,
}

impl Subscription {
    /// Removes the callback. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut subscribers = inner.subscribers.borrow_mut();
        let Some(list) = subscribers.get_mut(&self.key) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != self.id);
        list.len() != before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadSource {
    LocalFull,
    SyncFull,
    SyncLight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: Option<LoadSource>,
    pub applied: Vec<StateKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub local_written: bool,
    pub sync_written: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDebugInfo {
    pub keys: Vec<&'static str>,
    pub subscribers: BTreeMap<&'static str, usize>,
    pub window_count: usize,
    pub bookmark_count: usize,
    pub pending_flush_deadline: Option<u64>,
}

impl Store {
    pub fn new(
        local: Rc<dyn StorageArea>,
        sync: Rc<dyn StorageArea>,
        clock: Rc<dyn Clock>,
        config: StoreConfig,
    ) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(AppState::default()),
                subscribers: RefCell::new(BTreeMap::new()),
                next_subscription: Cell::new(1),
                debouncer: RefCell::new(Debouncer::new(config.debounce_ms)),
                local,
                sync,
                clock,
            }),
        }
    }

    pub fn from_host(host: &HostServices, config: StoreConfig) -> Self {
        Self::new(
            Rc::clone(&host.local),
            Rc::clone(&host.sync),
            Rc::clone(&host.clock),
            config,
        )
    }

    pub fn get(&self, key: StateKey) -> StateValue {
        self.inner.state.borrow().get(key)
    }

    /// Whole-state view. Lists are shared, so this is cheap.
    pub fn snapshot(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    pub fn windows(&self) -> Rc<Vec<WindowRecord>> {
        Rc::clone(&self.inner.state.borrow().windows)
    }

    pub fn bookmarks(&self) -> Rc<Vec<Bookmark>> {
        Rc::clone(&self.inner.state.borrow().bookmarks)
    }

    pub fn theme(&self) -> Theme {
        self.inner.state.borrow().theme
    }

    pub fn background_image(&self) -> String {
        self.inner.state.borrow().background_image.clone()
    }

    pub fn default_search_engine(&self) -> String {
        self.inner.state.borrow().default_search_engine.clone()
    }

    pub fn default_translation_engine(&self) -> String {
        self.inner.state.borrow().default_translation_engine.clone()
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    /// Replaces one value, notifies its subscribers, then arms the debounced flush when
    /// `persist` is set.
    pub fn set(&self, value: StateValue, persist: bool) {
        self.update(vec![value], persist);
    }

    /// Applies every value before notifying anyone, and arms at most one flush.
    pub fn update(&self, values: Vec<StateValue>, persist: bool) {
        if values.is_empty() {
            return;
        }
        let changes: Vec<(StateKey, StateValue, StateValue)> = {
            let mut state = self.inner.state.borrow_mut();
            values
                .into_iter()
                .map(|new| {
                    let key = new.key();
                    let old = state.replace(new.clone());
                    (key, new, old)
                })
                .collect()
        };
        for (key, new, old) in &changes {
            self.notify(*key, new, old);
        }
        if persist {
            self.request_flush();
        }
    }

    /// Registers `callback` for changes to `key`. A callback that returns `Err` is logged and
    /// the remaining subscribers still run. Unwinding panics are caught as well on targets
    /// that unwind.
    pub fn subscribe(
        &self,
        key: StateKey,
        callback: impl Fn(&StateValue, &StateValue, StateKey) -> Result<(), String> + 'static,
    ) -> Subscription {
        let id = self.inner.next_subscription.get();
        self.inner.next_subscription.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .entry(key)
            .or_default()
            .push((id, Rc::new(callback)));
        Subscription {
            inner: Rc::downgrade(&self.inner),
            key,
            id,
        }
    }

    pub fn request_flush(&self) {
        let now = self.now_ms();
        self.inner.debouncer.borrow_mut().schedule(now);
    }

    pub fn pending_flush_deadline(&self) -> Option<u64> {
        self.inner.debouncer.borrow().deadline()
    }

    /// Flushes if the debounce deadline has passed. Returns `None` when nothing was due.
    pub async fn flush_if_due(&self) -> Option<FlushReport> {
        let now = self.now_ms();
        let due = self.inner.debouncer.borrow_mut().take_if_due(now);
        if due {
            Some(self.flush_now().await)
        } else {
            None
        }
    }

    /// Writes both snapshots immediately and cancels any pending debounced flush.
    pub async fn flush_now(&self) -> FlushReport {
        self.inner.debouncer.borrow_mut().cancel();
        let state = self.snapshot();
        let last_saved = iso8601_from_unix_ms(self.now_ms());

        let local_written = match self
            .inner
            .local
            .set(full_snapshot_entries(&state, &last_saved))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!("local state write skipped: {err}");
                false
            }
        };
        let sync_written = match self
            .inner
            .sync
            .set(light_snapshot_entries(&state, &last_saved))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!("synced state write skipped: {err}");
                false
            }
        };
        debug!(
            "state flushed (local: {local_written}, sync: {sync_written}, windows: {})",
            state.windows.len()
        );
        FlushReport {
            local_written,
            sync_written,
        }
    }

    /// Hydrates from the local full snapshot, else the synced full snapshot, else the synced
    /// light keys. Values are applied without arming a flush.
    pub async fn load(&self) -> LoadReport {
        let (source, config) = self.read_persisted_config().await;
        let Some(config) = config else {
            info!("no persisted state found; using defaults");
            return LoadReport {
                source: None,
                applied: Vec::new(),
            };
        };

        let values = state_values_from_config(&config);
        let applied: Vec<StateKey> = values.iter().map(StateValue::key).collect();
        self.update(values, false);
        info!(
            "state hydrated from {:?} ({} keys)",
            source,
            applied.len()
        );
        LoadReport { source, applied }
    }

    async fn read_persisted_config(&self) -> (Option<LoadSource>, Option<Map<String, Value>>) {
        if let Some(config) = read_full_config(&*self.inner.local, "local").await {
            return (Some(LoadSource::LocalFull), Some(config));
        }
        if let Some(config) = read_full_config(&*self.inner.sync, "synced").await {
            return (Some(LoadSource::SyncFull), Some(config));
        }
        match self.inner.sync.get_many(&HYDRATE_LIGHT_KEYS).await {
            Ok(found) if !found.is_empty() => (Some(LoadSource::SyncLight), Some(found)),
            Ok(_) => (None, None),
            Err(err) => {
                warn!("synced storage unavailable: {err}");
                (None, None)
            }
        }
    }

    /// Resets state to defaults and drops every subscription and pending flush. Backing
    /// stores are left untouched.
    pub fn clear(&self) {
        *self.inner.state.borrow_mut() = AppState::default();
        self.inner.subscribers.borrow_mut().clear();
        self.inner.debouncer.borrow_mut().cancel();
    }

    pub fn debug_info(&self) -> StoreDebugInfo {
        let state = self.inner.state.borrow();
        StoreDebugInfo {
            keys: StateKey::ALL.iter().map(|key| key.as_str()).collect(),
            subscribers: self
                .inner
                .subscribers
                .borrow()
                .iter()
                .map(|(key, list)| (key.as_str(), list.len()))
                .collect(),
            window_count: state.windows.len(),
            bookmark_count: state.bookmarks.len(),
            pending_flush_deadline: self.pending_flush_deadline(),
        }
    }

    fn notify(&self, key: StateKey, new: &StateValue, old: &StateValue) {
        let callbacks: Vec<Callback> = self
            .inner
            .subscribers
            .borrow()
            .get(&key)
            .map(|list| list.iter().map(|(_, cb)| Rc::clone(cb)).collect())
            .unwrap_or_default();
        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(new, old, key))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("subscriber for `{}` failed: {err}", key.as_str()),
                Err(_) => error!("subscriber for `{}` panicked", key.as_str()),
            }
        }
    }
}

async fn read_full_config(area: &dyn StorageArea, label: &str) -> Option<Map<String, Value>> {
    match area.get(FULL_CONFIG_KEY).await {
        Ok(Some(raw)) => config_object(raw).filter(|config| !config.is_empty()),
        Ok(None) => None,
        Err(err) => {
            warn!("{label} storage read failed: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;
    use platform_host::{ManualClock, MemoryStorageArea, UnavailableStorageArea};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::DEFAULT_BACKGROUND;

    struct Harness {
        store: Store,
        local: MemoryStorageArea,
        sync: MemoryStorageArea,
        clock: ManualClock,
    }

    fn harness() -> Harness {
        let local = MemoryStorageArea::default();
        let sync = MemoryStorageArea::default();
        let clock = ManualClock::new(1_714_557_600_000);
        let store = Store::new(
            Rc::new(local.clone()),
            Rc::new(sync.clone()),
            Rc::new(clock.clone()),
            StoreConfig::default(),
        );
        Harness {
            store,
            local,
            sync,
            clock,
        }
    }

    #[test]
    fn set_is_visible_synchronously_before_flush() {
        let h = harness();
        h.store.set(StateValue::Theme(Theme::Dark), true);
        assert_eq!(h.store.get(StateKey::Theme), StateValue::Theme(Theme::Dark));
        assert_eq!(h.local.write_count(), 0);
        assert!(h.store.pending_flush_deadline().is_some());
    }

    #[test]
    fn subscribers_receive_new_and_old_values() {
        let h = harness();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        h.store.subscribe(StateKey::Theme, move |new, old, key| {
            sink.borrow_mut().push((new.clone(), old.clone(), key));
            Ok(())
        });

        h.store.set(StateValue::Theme(Theme::Dark), false);

        assert_eq!(
            *seen.borrow(),
            vec![(
                StateValue::Theme(Theme::Dark),
                StateValue::Theme(Theme::Light),
                StateKey::Theme
            )]
        );
        assert_eq!(h.store.pending_flush_deadline(), None);
    }

    #[test]
    fn failing_subscriber_does_not_block_others() {
        let h = harness();
        let hits = Rc::new(Cell::new(0));
        h.store.subscribe(StateKey::Theme, |_, _, _| {
            Err("subscriber could not render".to_string())
        });
        let counter = Rc::clone(&hits);
        h.store.subscribe(StateKey::Theme, move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        h.store.set(StateValue::Theme(Theme::Dark), false);
        h.store.set(StateValue::Theme(Theme::Light), false);

        assert_eq!(hits.get(), 2);
        assert_eq!(h.store.theme(), Theme::Light);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let h = harness();
        let hits = Rc::new(Cell::new(0));
        h.store
            .subscribe(StateKey::Theme, |_, _, _| panic!("misbehaving subscriber"));
        let counter = Rc::clone(&hits);
        h.store.subscribe(StateKey::Theme, move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        h.store.set(StateValue::Theme(Theme::Dark), false);

        assert_eq!(hits.get(), 1);
        assert_eq!(h.store.theme(), Theme::Dark);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let h = harness();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = h.store.subscribe(StateKey::Theme, move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        assert!(subscription.unsubscribe());
        h.store.set(StateValue::Theme(Theme::Dark), false);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn debounced_flush_coalesces_bursts() {
        let h = harness();
        h.store.set(StateValue::Theme(Theme::Dark), true);
        h.clock.advance(600);
        h.store
            .set(StateValue::DefaultSearchEngine("Brave".to_string()), true);

        h.clock.advance(600);
        assert_eq!(block_on(h.store.flush_if_due()), None);

        h.clock.advance(400);
        let report = block_on(h.store.flush_if_due()).expect("flush due");
        assert!(report.local_written && report.sync_written);
        assert_eq!(h.local.write_count(), 1);
        assert_eq!(h.sync.write_count(), 1);
        assert_eq!(h.sync.peek("defaultSearchEngine"), Some(json!("Brave")));
        assert_eq!(block_on(h.store.flush_if_due()), None);
    }

    #[test]
    fn update_applies_atomically_and_arms_one_flush() {
        let h = harness();
        let observed = Rc::new(RefCell::new(None));
        let store = h.store.clone();
        let sink = Rc::clone(&observed);
        h.store.subscribe(StateKey::Theme, move |_, _, _| {
            *sink.borrow_mut() = Some(store.default_search_engine());
            Ok(())
        });

        h.store.update(
            vec![
                StateValue::Theme(Theme::Dark),
                StateValue::DefaultSearchEngine("Ecosia".to_string()),
            ],
            true,
        );

        assert_eq!(*observed.borrow(), Some("Ecosia".to_string()));
        h.clock.advance(1_000);
        block_on(h.store.flush_if_due()).expect("flush");
        assert_eq!(h.local.write_count(), 1);
    }

    #[test]
    fn sync_never_receives_data_uri_background() {
        let h = harness();
        h.store.set(
            StateValue::BackgroundImage("url(\"data:image/png;base64,AAAA\")".to_string()),
            false,
        );
        block_on(h.store.flush_now());
        assert_eq!(h.sync.peek("backgroundImage"), Some(json!(DEFAULT_BACKGROUND)));
        assert_eq!(h.sync.peek("windows"), None);
        assert_eq!(
            h.local.peek(FULL_CONFIG_KEY).expect("full config")["backgroundImage"],
            json!("url(\"data:image/png;base64,AAAA\")")
        );
        assert_eq!(
            h.sync.peek("lastSaved"),
            Some(json!("2024-05-01T10:00:00.000Z"))
        );
    }

    #[test]
    fn load_prefers_local_over_sync() {
        let h = harness();
        h.local.insert(FULL_CONFIG_KEY, json!({"theme": "dark"}));
        h.sync.insert(
            FULL_CONFIG_KEY,
            json!({"theme": "light", "defaultSearchEngine": "Brave"}),
        );

        let report = block_on(h.store.load());

        assert_eq!(report.source, Some(LoadSource::LocalFull));
        assert_eq!(h.store.theme(), Theme::Dark);
        assert_eq!(h.store.default_search_engine(), "Google");
        assert_eq!(h.store.pending_flush_deadline(), None);
    }

    #[test]
    fn load_falls_back_to_sync_snapshot_then_light_keys() {
        let h = harness();
        h.sync.insert(
            FULL_CONFIG_KEY,
            json!(r#"{"defaultTranslationEngine":"DeepL"}"#),
        );
        let report = block_on(h.store.load());
        assert_eq!(report.source, Some(LoadSource::SyncFull));
        assert_eq!(h.store.default_translation_engine(), "DeepL");

        let h = harness();
        h.sync.insert("theme", json!("dark"));
        let report = block_on(h.store.load());
        assert_eq!(report.source, Some(LoadSource::SyncLight));
        assert_eq!(report.applied, vec![StateKey::Theme]);
    }

    #[test]
    fn storage_failures_are_not_fatal() {
        let store = Store::new(
            Rc::new(UnavailableStorageArea::new("quota exceeded")),
            Rc::new(UnavailableStorageArea::new("permission denied")),
            Rc::new(ManualClock::new(0)),
            StoreConfig::default(),
        );
        let report = block_on(store.load());
        assert_eq!(report.source, None);

        store.set(StateValue::Theme(Theme::Dark), true);
        let flush = block_on(store.flush_now());
        assert_eq!(
            flush,
            FlushReport {
                local_written: false,
                sync_written: false
            }
        );
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[test]
    fn clear_resets_state_and_drops_subscriptions() {
        let h = harness();
        h.store.subscribe(StateKey::Windows, |_, _, _| Ok(()));
        h.store.set(StateValue::Theme(Theme::Dark), true);

        h.store.clear();

        assert_eq!(h.store.snapshot(), AppState::default());
        let info = h.store.debug_info();
        assert!(info.subscribers.is_empty());
        assert_eq!(info.pending_flush_deadline, None);
    }
}
