//! Persisted layout schema: full and light snapshot projections, and hydration parsing.

use std::collections::HashSet;

use bookmark_index::Bookmark;
use log::warn;
use serde_json::{json, Map, Value};

use crate::{
    background::is_valid_background,
    model::{AppState, StateValue, Theme, WindowKind, WindowRecord, DEFAULT_BACKGROUND},
};

/// Local-area key holding the full snapshot.
pub const FULL_CONFIG_KEY: &str = "bookmarkManager_fullConfig";
pub const LEGACY_THEME_KEY: &str = "bookmarkManager_theme";
pub const LEGACY_SEARCH_ENGINE_KEY: &str = "bookmarkManager_searchEngine";
pub const LEGACY_TRANSLATION_ENGINE_KEY: &str = "bookmarkManager_translationEngine";
pub const LEGACY_WINDOWS_KEY: &str = "bookmarkManager_windows";

/// Keys of the light snapshot written to the synced area.
pub const LIGHT_KEYS: [&str; 6] = [
    "theme",
    "backgroundImage",
    "defaultSearchEngine",
    "defaultTranslationEngine",
    "windowsCount",
    "lastSaved",
];

/// Whether a background embeds its image as a data URI, either bare or inside `url(...)`.
pub fn is_data_uri_background(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    if lower.starts_with("data:") {
        return true;
    }
    lower
        .strip_prefix("url(")
        .map(|rest| rest.trim_start().trim_start_matches(['"', '\'']))
        .is_some_and(|inner| inner.starts_with("data:"))
}

/// Background value safe to send to the quota-limited synced area.
pub fn sync_safe_background(value: &str) -> &str {
    if is_data_uri_background(value) {
        DEFAULT_BACKGROUND
    } else {
        value
    }
}

/// Full projection for the local area, including the mirror keys older builds read.
pub fn full_snapshot_entries(state: &AppState, last_saved: &str) -> Map<String, Value> {
    let windows = serde_json::to_value(&*state.windows).unwrap_or_else(|err| {
        warn!("failed to serialize windows: {err}");
        Value::Array(Vec::new())
    });
    let bookmarks = serde_json::to_value(&*state.bookmarks).unwrap_or_else(|err| {
        warn!("failed to serialize bookmarks: {err}");
        Value::Array(Vec::new())
    });

    let full = json!({
        "windows": windows,
        "backgroundImage": state.background_image,
        "theme": state.theme.as_str(),
        "defaultSearchEngine": state.default_search_engine,
        "defaultTranslationEngine": state.default_translation_engine,
        "bookmarks": bookmarks,
        "layoutSaved": true,
        "lastSaved": last_saved,
    });

    let mut entries = Map::new();
    entries.insert(FULL_CONFIG_KEY.to_string(), full);
    entries.insert(LEGACY_THEME_KEY.to_string(), json!(state.theme.as_str()));
    entries.insert(
        LEGACY_SEARCH_ENGINE_KEY.to_string(),
        json!(state.default_search_engine),
    );
    entries.insert(
        LEGACY_TRANSLATION_ENGINE_KEY.to_string(),
        json!(state.default_translation_engine),
    );
    entries.insert(LEGACY_WINDOWS_KEY.to_string(), windows);
    entries
}

/// Light projection for the synced area. Never carries windows, bookmarks, or data URIs.
pub fn light_snapshot_entries(state: &AppState, last_saved: &str) -> Map<String, Value> {
    let mut entries = Map::new();
    entries.insert("theme".to_string(), json!(state.theme.as_str()));
    entries.insert(
        "backgroundImage".to_string(),
        json!(sync_safe_background(&state.background_image)),
    );
    entries.insert(
        "defaultSearchEngine".to_string(),
        json!(state.default_search_engine),
    );
    entries.insert(
        "defaultTranslationEngine".to_string(),
        json!(state.default_translation_engine),
    );
    entries.insert("windowsCount".to_string(), json!(state.windows.len()));
    entries.insert("lastSaved".to_string(), json!(last_saved));
    entries
}

/// Reads a persisted config object, which may also arrive as JSON text.
pub fn config_object(raw: Value) -> Option<Map<String, Value>> {
    match raw {
        Value::Object(map) => Some(map),
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(err) => {
                warn!("ignoring unreadable persisted config: {err}");
                None
            }
        },
        _ => None,
    }
}

/// Converts a persisted config into state values. Each field is read on its own; a
/// malformed field is skipped without discarding the rest.
pub fn state_values_from_config(config: &Map<String, Value>) -> Vec<StateValue> {
    let mut values = Vec::new();

    if let Some(Value::Array(raw)) = config.get("windows") {
        let windows: Vec<WindowRecord> = raw
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!("skipping malformed persisted window: {err}");
                    None
                }
            })
            .collect();
        values.push(StateValue::windows(dedupe_windows(windows)));
    }

    if let Some(Value::Array(raw)) = config.get("bookmarks") {
        let bookmarks: Vec<Bookmark> = raw
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect();
        values.push(StateValue::bookmarks(bookmarks));
    }

    if let Some(theme) = config.get("theme").and_then(Value::as_str) {
        match Theme::parse(theme) {
            Some(theme) => values.push(StateValue::Theme(theme)),
            None => warn!("ignoring unknown persisted theme `{theme}`"),
        }
    }

    if let Some(image) = config.get("backgroundImage").and_then(Value::as_str) {
        if is_valid_background(image) {
            values.push(StateValue::BackgroundImage(image.to_string()));
        } else {
            warn!("ignoring unsafe persisted background");
        }
    }

    if let Some(name) = config.get("defaultSearchEngine").and_then(Value::as_str) {
        values.push(StateValue::DefaultSearchEngine(name.to_string()));
    }
    if let Some(name) = config
        .get("defaultTranslationEngine")
        .and_then(Value::as_str)
    {
        values.push(StateValue::DefaultTranslationEngine(name.to_string()));
    }

    values
}

/// Keeps the first window per id, per bookmark folder, and per search/translation kind.
fn dedupe_windows(windows: Vec<WindowRecord>) -> Vec<WindowRecord> {
    let mut ids = HashSet::new();
    let mut folders = HashSet::new();
    let mut kinds = HashSet::new();
    windows
        .into_iter()
        .filter(|record| {
            if !ids.insert(record.id) {
                warn!("dropping persisted window with duplicate id {}", record.id);
                return false;
            }
            let fresh = match record.kind {
                WindowKind::Bookmark => folders.insert(record.folder.clone()),
                WindowKind::Search | WindowKind::Translation => kinds.insert(record.kind),
            };
            if !fresh {
                warn!(
                    "dropping persisted {} window {}: `{}` already has one",
                    record.kind.as_str(),
                    record.id,
                    record.folder
                );
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Position, Size, StateKey, WindowId};

    fn state_with_window() -> AppState {
        AppState {
            windows: Rc::new(vec![WindowRecord {
                id: WindowId(1),
                kind: WindowKind::Bookmark,
                folder: "Dev".to_string(),
                position: Position::new(50, 200),
                size: Size::default(),
                minimized: false,
                color_class: None,
                header_color: Some("header-color-development".to_string()),
                bookmarks: vec![Bookmark::new("1", "GH", "https://github.com", "Dev")],
            }]),
            bookmarks: Rc::new(vec![Bookmark::new("1", "GH", "https://github.com", "Dev")]),
            background_image: "url(\"data:image/png;base64,AAAA\")".to_string(),
            ..AppState::default()
        }
    }

    #[test]
    fn detects_data_uri_backgrounds() {
        assert!(is_data_uri_background("data:image/png;base64,AAAA"));
        assert!(is_data_uri_background("url(data:image/png;base64,AAAA)"));
        assert!(is_data_uri_background("URL( 'data:image/png;base64,AAAA')"));
        assert!(!is_data_uri_background("url(https://example.com/a.png)"));
        assert!(!is_data_uri_background(DEFAULT_BACKGROUND));
    }

    #[test]
    fn light_snapshot_omits_heavy_payloads() {
        let entries = light_snapshot_entries(&state_with_window(), "2024-05-01T10:00:00.000Z");
        let mut keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = LIGHT_KEYS.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(entries["backgroundImage"], json!(DEFAULT_BACKGROUND));
        assert_eq!(entries["windowsCount"], json!(1));
    }

    #[test]
    fn full_snapshot_keeps_windows_bookmarks_and_image() {
        let state = state_with_window();
        let entries = full_snapshot_entries(&state, "2024-05-01T10:00:00.000Z");
        let full = &entries[FULL_CONFIG_KEY];
        assert_eq!(full["windows"][0]["bookmarks"][0]["url"], json!("https://github.com"));
        assert_eq!(full["bookmarks"].as_array().map(Vec::len), Some(1));
        assert_eq!(full["backgroundImage"], json!(state.background_image));
        assert_eq!(full["lastSaved"], json!("2024-05-01T10:00:00.000Z"));
        assert_eq!(entries[LEGACY_THEME_KEY], json!("light"));
    }

    #[test]
    fn hydration_round_trips_full_snapshot() {
        let state = state_with_window();
        let entries = full_snapshot_entries(&state, "2024-05-01T10:00:00.000Z");
        let config = config_object(entries[FULL_CONFIG_KEY].clone()).expect("object");

        let mut restored = AppState::default();
        for value in state_values_from_config(&config) {
            restored.replace(value);
        }
        assert_eq!(restored, state);
    }

    #[test]
    fn hydration_skips_malformed_fields_individually() {
        let config = config_object(json!(
            r#"{"theme":"neon","windows":[{"id":1,"type":"search","folder":"S","position":{"x":0,"y":0}},{"id":"x"}],"backgroundImage":"javascript:alert(1)","defaultSearchEngine":"Brave"}"#
        ))
        .expect("config text parses");

        let values = state_values_from_config(&config);
        let keys: Vec<StateKey> = values.iter().map(StateValue::key).collect();
        assert_eq!(keys, vec![StateKey::Windows, StateKey::DefaultSearchEngine]);
        match &values[0] {
            StateValue::Windows(list) => assert_eq!(list.len(), 1),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn duplicate_persisted_ids_are_dropped() {
        let config = config_object(json!({
            "windows": [
                {"id": 5, "type": "search", "folder": "S", "position": {"x": 0, "y": 0}},
                {"id": 5, "type": "translation", "folder": "T", "position": {"x": 0, "y": 0}}
            ]
        }))
        .expect("object");
        match &state_values_from_config(&config)[0] {
            StateValue::Windows(list) => assert_eq!(list.len(), 1),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn persisted_windows_keep_one_per_folder_and_kind() {
        let config = config_object(json!({
            "windows": [
                {"id": 1, "type": "bookmark", "folder": "Work", "position": {"x": 0, "y": 0}},
                {"id": 2, "type": "bookmark", "folder": "Work", "position": {"x": 10, "y": 0}},
                {"id": 3, "type": "search", "folder": "Search", "position": {"x": 0, "y": 0}},
                {"id": 4, "type": "search", "folder": "Search", "position": {"x": 0, "y": 0}},
                {"id": 5, "type": "bookmark", "folder": "Home", "position": {"x": 0, "y": 0}}
            ]
        }))
        .expect("object");
        match &state_values_from_config(&config)[0] {
            StateValue::Windows(list) => {
                let ids: Vec<u64> = list.iter().map(|w| w.id.0).collect();
                assert_eq!(ids, vec![1, 3, 5]);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }
}
