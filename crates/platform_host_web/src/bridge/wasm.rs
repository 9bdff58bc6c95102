use super::*;
use std::rc::Rc;

use js_sys::Promise;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = r#"
function storageArea(name) {
  if (typeof chrome === 'undefined' || !chrome.storage || !chrome.storage[name]) {
    return null;
  }
  return chrome.storage[name];
}

function requireArea(name) {
  const area = storageArea(name);
  if (!area) {
    throw new Error('chrome.storage.' + name + ' not available');
  }
  return area;
}

function settle(resolve, reject, value) {
  const err = chrome.runtime && chrome.runtime.lastError;
  if (err) {
    reject(new Error(err.message || String(err)));
  } else {
    resolve(value);
  }
}

export function jsStorageAvailable(name) {
  return storageArea(name) !== null;
}

export function jsBookmarksAvailable() {
  return typeof chrome !== 'undefined' && !!chrome.bookmarks && !!chrome.bookmarks.getTree;
}

export function jsStorageGet(name, key) {
  return new Promise((resolve, reject) => {
    const area = requireArea(name);
    area.get([key], (items) => settle(resolve, reject, items ? items[key] : undefined));
  });
}

export function jsStorageSet(name, entries) {
  return new Promise((resolve, reject) => {
    requireArea(name).set(entries, () => settle(resolve, reject, undefined));
  });
}

export function jsStorageRemove(name, key) {
  return new Promise((resolve, reject) => {
    requireArea(name).remove(key, () => settle(resolve, reject, undefined));
  });
}

export function jsStorageClear(name) {
  return new Promise((resolve, reject) => {
    requireArea(name).clear(() => settle(resolve, reject, undefined));
  });
}

export function jsBookmarksGetTree() {
  return new Promise((resolve, reject) => {
    if (!jsBookmarksAvailable()) {
      reject(new Error('chrome.bookmarks API not available'));
      return;
    }
    chrome.bookmarks.getTree((tree) => settle(resolve, reject, tree || []));
  });
}

export function jsListenMessages(handler) {
  if (typeof chrome === 'undefined' || !chrome.runtime || !chrome.runtime.onMessage) {
    return false;
  }
  chrome.runtime.onMessage.addListener((message, _sender, sendResponse) => {
    handler(message).then(sendResponse, (err) => {
      sendResponse({ success: false, error: String(err) });
    });
    return true;
  });
  return true;
}

export function jsSleep(ms) {
  return new Promise((resolve) => setTimeout(resolve, ms));
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = jsStorageAvailable)]
    fn js_storage_available(area: &str) -> bool;
    #[wasm_bindgen(js_name = jsBookmarksAvailable)]
    fn js_bookmarks_available() -> bool;

    #[wasm_bindgen(catch, js_name = jsStorageGet)]
    fn js_storage_get(area: &str, key: &str) -> Result<Promise, JsValue>;
    #[wasm_bindgen(catch, js_name = jsStorageSet)]
    fn js_storage_set(area: &str, entries: JsValue) -> Result<Promise, JsValue>;
    #[wasm_bindgen(catch, js_name = jsStorageRemove)]
    fn js_storage_remove(area: &str, key: &str) -> Result<Promise, JsValue>;
    #[wasm_bindgen(catch, js_name = jsStorageClear)]
    fn js_storage_clear(area: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_name = jsBookmarksGetTree)]
    fn js_bookmarks_get_tree() -> Promise;
    #[wasm_bindgen(js_name = jsListenMessages)]
    fn js_listen_messages(handler: &Closure<dyn FnMut(JsValue) -> Promise>) -> bool;
    #[wasm_bindgen(js_name = jsSleep)]
    fn js_sleep(ms: u32) -> Promise;
}

async fn await_promise(promise: Result<Promise, JsValue>) -> Result<JsValue, String> {
    let promise = promise.map_err(js_error_to_string)?;
    JsFuture::from(promise).await.map_err(js_error_to_string)
}

fn js_error_to_string(err: JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = js_sys::Reflect::get(&err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

pub fn storage_available(area: &str) -> bool {
    js_storage_available(area)
}

pub fn bookmarks_available() -> bool {
    js_bookmarks_available()
}

pub async fn storage_get(area: &str, key: &str) -> Result<Option<Value>, String> {
    let value = await_promise(js_storage_get(area, key)).await?;
    if value.is_null() || value.is_undefined() {
        Ok(None)
    } else {
        from_value(value).map(Some).map_err(|e| e.to_string())
    }
}

pub async fn storage_set(area: &str, entries: &Map<String, Value>) -> Result<(), String> {
    let value = entries
        .serialize(&Serializer::json_compatible())
        .map_err(|e| e.to_string())?;
    await_promise(js_storage_set(area, value)).await?;
    Ok(())
}

pub async fn storage_remove(area: &str, key: &str) -> Result<(), String> {
    await_promise(js_storage_remove(area, key)).await?;
    Ok(())
}

pub async fn storage_clear(area: &str) -> Result<(), String> {
    await_promise(js_storage_clear(area)).await?;
    Ok(())
}

pub async fn bookmarks_get_tree() -> Result<Vec<BookmarkTreeNode>, String> {
    let value = await_promise(Ok(js_bookmarks_get_tree())).await?;
    from_value(value).map_err(|e| e.to_string())
}

pub fn listen_messages(handler: MessageHandler) -> bool {
    let closure = Closure::<dyn FnMut(JsValue) -> Promise>::new(move |message: JsValue| {
        let handler = Rc::clone(&handler);
        wasm_bindgen_futures::future_to_promise(async move {
            let message: Value = from_value(message).unwrap_or(Value::Null);
            let reply = handler(message).await;
            reply
                .serialize(&Serializer::json_compatible())
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    });
    let attached = js_listen_messages(&closure);
    if attached {
        // The listener lives as long as the page.
        closure.forget();
    }
    attached
}

pub async fn sleep_ms(ms: u32) {
    let _ = JsFuture::from(js_sleep(ms)).await;
}
