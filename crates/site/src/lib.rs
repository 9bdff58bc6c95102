//! Browser entrypoint for the bookmark homepage.
//!
//! Builds the host services for the current page, runs [`HomepageApp`] and paints its
//! window views with Leptos.
//!
//! [`HomepageApp`]: homepage_runtime::HomepageApp

mod homepage;
mod messaging;

pub use homepage::HomepageRoot;
pub use messaging::{answer_host_message, HOST_RETRY_INTERVAL_MS, HOST_RETRY_LIMIT};

/// Mounts the homepage into `<body>`.
#[cfg(all(feature = "csr", target_arch = "wasm32"))]
pub fn mount() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    leptos::mount_to_body(|| leptos::view! { <HomepageRoot /> })
}
