//! Browser storage areas.

pub mod extension;
pub mod local;
