//! Answers commands sent by the extension shell over `chrome.runtime` messaging.

use std::future::Future;

use homepage_runtime::HomepageApp;
use log::debug;
use platform_host::{HostCommand, HostReply};
use serde_json::Value;

/// Delay between attempts while an `openSettings` command waits for initialization.
pub const HOST_RETRY_INTERVAL_MS: u32 = 100;
/// Attempts before an `openSettings` command gives up.
pub const HOST_RETRY_LIMIT: u32 = 50;

/// Parses `message` and answers it. `openSettings` is retried every
/// [`HOST_RETRY_INTERVAL_MS`] until the homepage has initialized, up to
/// [`HOST_RETRY_LIMIT`] attempts.
pub async fn answer_host_message<S, F>(app: &HomepageApp, message: &Value, sleep: S) -> HostReply
where
    S: Fn(u32) -> F,
    F: Future<Output = ()>,
{
    let Some(command) = HostCommand::from_message(message) else {
        return HostReply::failed("message has no action");
    };

    for attempt in 1..HOST_RETRY_LIMIT {
        let reply = app.handle_host_command(&command);
        if reply.success || command != HostCommand::OpenSettings {
            return reply;
        }
        debug!("openSettings before initialization (attempt {attempt}); retrying");
        sleep(HOST_RETRY_INTERVAL_MS).await;
    }
    app.handle_host_command(&command)
}
