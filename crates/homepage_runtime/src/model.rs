use std::{fmt, rc::Rc};

use bookmark_index::Bookmark;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_WINDOW_WIDTH: i32 = 350;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 400;
pub const DEFAULT_BACKGROUND: &str = "linear-gradient(135deg, #546190 0%, #483874 100%)";
pub const DEFAULT_SEARCH_ENGINE: &str = "Google";
pub const DEFAULT_TRANSLATION_ENGINE: &str = "Google Translate";
pub const DEFAULT_HEADER_COLOR: &str = "header-color-default";
pub const NEW_WINDOW_FOLDER: &str = "New Window";
pub const SEARCH_WINDOW_TITLE: &str = "Web Search";
pub const TRANSLATION_WINDOW_TITLE: &str = "Translator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl WindowId {
    /// Parses ids the way DOM attributes carry them: `"42"`, `" 42 "`, `"window-42"`, or
    /// `"42px"`. Leading digits win; anything without them is rejected.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("window-").unwrap_or(trimmed);
        let digits: &str = {
            let end = trimmed
                .char_indices()
                .find(|(_, ch)| !ch.is_ascii_digit())
                .map_or(trimmed.len(), |(idx, _)| idx);
            &trimmed[..end]
        };
        digits.parse().ok().map(Self)
    }

    pub fn dom_id(self) -> String {
        format!("window-{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for WindowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Float(f64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(id) => Ok(Self(id)),
            RawId::Float(id) if id.is_finite() && id >= 0.0 => Ok(Self(id as u64)),
            RawId::Float(id) => Err(serde::de::Error::custom(format!("invalid window id {id}"))),
            RawId::Text(text) => Self::parse_loose(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid window id `{text}`"))),
        }
    }
}

/// Lookup key accepted by registry operations: typed ids or the loose strings that arrive
/// from DOM attributes.
pub trait AsWindowId {
    fn as_window_id(&self) -> Option<WindowId>;

    /// Original text, for diagnostics.
    fn raw_id(&self) -> String;
}

impl AsWindowId for WindowId {
    fn as_window_id(&self) -> Option<WindowId> {
        Some(*self)
    }

    fn raw_id(&self) -> String {
        self.to_string()
    }
}

impl AsWindowId for u64 {
    fn as_window_id(&self) -> Option<WindowId> {
        Some(WindowId(*self))
    }

    fn raw_id(&self) -> String {
        self.to_string()
    }
}

impl AsWindowId for &str {
    fn as_window_id(&self) -> Option<WindowId> {
        WindowId::parse_loose(self)
    }

    fn raw_id(&self) -> String {
        (*self).to_string()
    }
}

impl AsWindowId for String {
    fn as_window_id(&self) -> Option<WindowId> {
        WindowId::parse_loose(self)
    }

    fn raw_id(&self) -> String {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    #[serde(alias = "bookmarks")]
    Bookmark,
    Search,
    Translation,
}

impl WindowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bookmark => "bookmark",
            Self::Search => "search",
            Self::Translation => "translation",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 800)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    pub id: WindowId,
    #[serde(rename = "type")]
    pub kind: WindowKind,
    pub folder: String,
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_color: Option<String>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl WindowRecord {
    pub fn is_bookmark_window_for(&self, folder: &str) -> bool {
        self.kind == WindowKind::Bookmark && self.folder == folder
    }
}

/// Creation request merged over defaults by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub kind: WindowKind,
    pub folder: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub minimized: bool,
    pub color_class: Option<String>,
    pub header_color: Option<String>,
    pub bookmarks: Vec<Bookmark>,
}

impl WindowConfig {
    pub fn new(kind: WindowKind) -> Self {
        Self {
            kind,
            folder: None,
            position: None,
            size: None,
            minimized: false,
            color_class: None,
            header_color: None,
            bookmarks: Vec::new(),
        }
    }

    pub fn bookmark(folder: impl Into<String>) -> Self {
        Self::new(WindowKind::Bookmark).folder(folder)
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn sized(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn header_color(mut self, class: impl Into<String>) -> Self {
        self.header_color = Some(class.into());
        self
    }

    pub fn color_class(mut self, class: impl Into<String>) -> Self {
        self.color_class = Some(class.into());
        self
    }

    pub fn bookmarks(mut self, bookmarks: Vec<Bookmark>) -> Self {
        self.bookmarks = bookmarks;
        self
    }
}

/// Shallow field overrides for an existing window. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowPatch {
    pub folder: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub minimized: Option<bool>,
    pub color_class: Option<String>,
    pub header_color: Option<String>,
    pub bookmarks: Option<Vec<Bookmark>>,
}

impl WindowPatch {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn apply_to(self, record: &mut WindowRecord) {
        if let Some(folder) = self.folder {
            record.folder = folder;
        }
        if let Some(position) = self.position {
            record.position = position;
        }
        if let Some(size) = self.size {
            record.size = size;
        }
        if let Some(minimized) = self.minimized {
            record.minimized = minimized;
        }
        if let Some(class) = self.color_class {
            record.color_class = Some(class);
        }
        if let Some(class) = self.header_color {
            record.header_color = Some(class);
        }
        if let Some(bookmarks) = self.bookmarks {
            record.bookmarks = bookmarks;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    Windows,
    Bookmarks,
    Theme,
    BackgroundImage,
    DefaultSearchEngine,
    DefaultTranslationEngine,
}

impl StateKey {
    pub const ALL: [StateKey; 6] = [
        Self::Windows,
        Self::Bookmarks,
        Self::Theme,
        Self::BackgroundImage,
        Self::DefaultSearchEngine,
        Self::DefaultTranslationEngine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Bookmarks => "bookmarks",
            Self::Theme => "theme",
            Self::BackgroundImage => "backgroundImage",
            Self::DefaultSearchEngine => "defaultSearchEngine",
            Self::DefaultTranslationEngine => "defaultTranslationEngine",
        }
    }
}

/// A value stored under one [`StateKey`]. Lists are shared and never edited in place, so a
/// subscriber holding the old value keeps a consistent snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Windows(Rc<Vec<WindowRecord>>),
    Bookmarks(Rc<Vec<Bookmark>>),
    Theme(Theme),
    BackgroundImage(String),
    DefaultSearchEngine(String),
    DefaultTranslationEngine(String),
}

impl StateValue {
    pub fn key(&self) -> StateKey {
        match self {
            Self::Windows(_) => StateKey::Windows,
            Self::Bookmarks(_) => StateKey::Bookmarks,
            Self::Theme(_) => StateKey::Theme,
            Self::BackgroundImage(_) => StateKey::BackgroundImage,
            Self::DefaultSearchEngine(_) => StateKey::DefaultSearchEngine,
            Self::DefaultTranslationEngine(_) => StateKey::DefaultTranslationEngine,
        }
    }

    pub fn windows(list: Vec<WindowRecord>) -> Self {
        Self::Windows(Rc::new(list))
    }

    pub fn bookmarks(list: Vec<Bookmark>) -> Self {
        Self::Bookmarks(Rc::new(list))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub windows: Rc<Vec<WindowRecord>>,
    pub bookmarks: Rc<Vec<Bookmark>>,
    pub theme: Theme,
    pub background_image: String,
    pub default_search_engine: String,
    pub default_translation_engine: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            windows: Rc::new(Vec::new()),
            bookmarks: Rc::new(Vec::new()),
            theme: Theme::Light,
            background_image: DEFAULT_BACKGROUND.to_string(),
            default_search_engine: DEFAULT_SEARCH_ENGINE.to_string(),
            default_translation_engine: DEFAULT_TRANSLATION_ENGINE.to_string(),
        }
    }
}

impl AppState {
    pub fn get(&self, key: StateKey) -> StateValue {
        match key {
            StateKey::Windows => StateValue::Windows(Rc::clone(&self.windows)),
            StateKey::Bookmarks => StateValue::Bookmarks(Rc::clone(&self.bookmarks)),
            StateKey::Theme => StateValue::Theme(self.theme),
            StateKey::BackgroundImage => StateValue::BackgroundImage(self.background_image.clone()),
            StateKey::DefaultSearchEngine => {
                StateValue::DefaultSearchEngine(self.default_search_engine.clone())
            }
            StateKey::DefaultTranslationEngine => {
                StateValue::DefaultTranslationEngine(self.default_translation_engine.clone())
            }
        }
    }

    /// Stores `value` and returns the value it replaced.
    pub fn replace(&mut self, value: StateValue) -> StateValue {
        let old = self.get(value.key());
        match value {
            StateValue::Windows(list) => self.windows = list,
            StateValue::Bookmarks(list) => self.bookmarks = list,
            StateValue::Theme(theme) => self.theme = theme,
            StateValue::BackgroundImage(image) => self.background_image = image,
            StateValue::DefaultSearchEngine(name) => self.default_search_engine = name,
            StateValue::DefaultTranslationEngine(name) => self.default_translation_engine = name,
        }
        old
    }
}
