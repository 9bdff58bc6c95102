//! Window and state coordination for the bookmark homepage.
//!
//! [`Store`] holds typed application state and persists it to the host storage areas.
//! [`WindowRegistry`] owns the lifecycle of the floating windows, [`layout`] places them,
//! and [`RenderBridge`] turns window records into view models and UI events back into
//! registry calls. [`HomepageApp`] runs the startup pipeline over all of them.

pub mod app;
pub mod background;
pub mod bridge;
pub mod error;
pub mod events;
pub mod gate;
pub mod layout;
pub mod model;
pub mod palette;
pub mod persistence;
pub mod registry;
pub mod scheduler;
pub mod store;

pub use app::{AddWindowOptions, AppConfig, AppDebugInfo, HomepageApp, InitReport, TickReport};
pub use background::{is_valid_background, validate_background, BackgroundError};
pub use bridge::{
    BridgeEffect, Control, Drift, MountedWindow, NodeRef, RenderBridge, UiEvent, UiEventKind,
    WindowBody, WindowView,
};
pub use error::{HomepageError, RegistryError};
pub use events::{EventBus, Notice, NoticeLevel, RegistryEvent};
pub use layout::{AlignPlan, LayoutConfig};
pub use model::*;
pub use registry::{RemovedWindow, WindowRegistry};
pub use store::{FlushReport, LoadReport, LoadSource, Store, StoreConfig, Subscription};
