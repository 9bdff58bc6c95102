use super::*;

fn unsupported(api: &str) -> String {
    format!("{api} is only available when compiled for wasm32")
}

pub fn storage_available(_area: &str) -> bool {
    false
}

pub fn bookmarks_available() -> bool {
    false
}

pub async fn storage_get(_area: &str, _key: &str) -> Result<Option<Value>, String> {
    Err(unsupported("chrome.storage"))
}

pub async fn storage_set(_area: &str, _entries: &Map<String, Value>) -> Result<(), String> {
    Err(unsupported("chrome.storage"))
}

pub async fn storage_remove(_area: &str, _key: &str) -> Result<(), String> {
    Err(unsupported("chrome.storage"))
}

pub async fn storage_clear(_area: &str) -> Result<(), String> {
    Err(unsupported("chrome.storage"))
}

pub async fn bookmarks_get_tree() -> Result<Vec<BookmarkTreeNode>, String> {
    Err(unsupported("chrome.bookmarks"))
}

pub fn listen_messages(_handler: MessageHandler) -> bool {
    false
}

pub async fn sleep_ms(_ms: u32) {}
