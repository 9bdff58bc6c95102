//! Web Notifications adapter.

use platform_host::{NotificationFuture, NotificationService};

#[derive(Debug, Clone, Copy, Default)]
/// Notification adapter backed by the Web Notifications API.
///
/// Notifications are only shown once the user has granted permission; otherwise the call
/// reports an error and the page falls back to its in-page notices.
pub struct WebNotificationService;

impl NotificationService for WebNotificationService {
    fn notify<'a>(
        &'a self,
        title: &'a str,
        body: &'a str,
    ) -> NotificationFuture<'a, Result<(), String>> {
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                use wasm_bindgen::JsValue;
                use web_sys::{Notification, NotificationOptions, NotificationPermission};

                if Notification::permission() != NotificationPermission::Granted {
                    return Err("notification permission not granted".to_string());
                }
                let options = NotificationOptions::new();
                if !body.trim().is_empty() {
                    options.set_body(body);
                }
                return Notification::new_with_options(title, &options)
                    .map(|_| ())
                    .map_err(|err: JsValue| format!("notification dispatch failed: {err:?}"));
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = (title, body);
                Ok(())
            }
        })
    }
}
