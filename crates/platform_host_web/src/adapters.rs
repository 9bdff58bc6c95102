use std::rc::Rc;

use log::info;
use platform_host::{
    HostServices, HostStrategy, NoopNotificationService, NotificationService, SystemClock,
    UnavailableBookmarkSource, UnavailableStorageArea,
};

use crate::{
    ExtensionBookmarkSource, ExtensionStorageArea, WebLocalStorageArea, WebNotificationService,
};

/// Picks the host strategy from the APIs visible at runtime.
///
/// Inside the extension `chrome.storage.sync` exists; a plain page only has `localStorage`;
/// native builds get in-memory adapters.
pub fn detect_host_strategy() -> HostStrategy {
    if ExtensionStorageArea::sync().is_available() {
        HostStrategy::Extension
    } else if WebLocalStorageArea::is_available() {
        HostStrategy::PlainPage
    } else {
        HostStrategy::Headless
    }
}

/// Builds the host bundle for the detected strategy.
///
/// The full snapshot always lives in `localStorage`; the light snapshot goes to
/// `chrome.storage.sync` when the page runs inside the extension.
pub fn build_host_services() -> HostServices {
    let strategy = detect_host_strategy();
    info!("host strategy: {}", strategy.as_str());
    match strategy {
        HostStrategy::Extension => HostServices {
            strategy,
            local: Rc::new(WebLocalStorageArea),
            sync: Rc::new(ExtensionStorageArea::sync()),
            bookmarks: Rc::new(ExtensionBookmarkSource::default()),
            notifications: notification_service(),
            clock: Rc::new(SystemClock),
        },
        HostStrategy::PlainPage => HostServices {
            strategy,
            local: Rc::new(WebLocalStorageArea),
            sync: Rc::new(UnavailableStorageArea::new("chrome.storage.sync not available")),
            bookmarks: Rc::new(UnavailableBookmarkSource::default()),
            notifications: notification_service(),
            clock: Rc::new(SystemClock),
        },
        HostStrategy::Headless => HostServices::in_memory(),
    }
}

fn notification_service() -> Rc<dyn NotificationService> {
    if cfg!(target_arch = "wasm32") {
        Rc::new(WebNotificationService)
    } else {
        Rc::new(NoopNotificationService)
    }
}
