//! Error taxonomy for the homepage runtime.

use bookmark_index::ImportError;
use thiserror::Error;

use crate::{background::BackgroundError, model::WindowId};

/// Rejections raised by window registry operations. The registry is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A bookmark window for this folder already exists.
    #[error("a window for folder `{0}` already exists")]
    DuplicateFolder(String),
    /// The target window id was not found in the current state.
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
    /// The supplied id could not be read as a window id.
    #[error("`{0}` is not a window id")]
    InvalidId(String),
    /// Another removal is still running.
    #[error("a window removal is already in progress")]
    RemovalInProgress,
    /// The header color class is not part of the palette.
    #[error("unknown header color `{0}`")]
    UnknownColor(String),
}

/// Application-level failures surfaced to callers of `HomepageApp`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HomepageError {
    /// The bookmark source failed; defaults are in use.
    #[error(transparent)]
    Import(#[from] ImportError),
    /// A user-supplied value was refused.
    #[error("invalid value: {0}")]
    Validation(#[from] BackgroundError),
    /// A backing store read or write failed.
    #[error("storage error: {0}")]
    Storage(String),
    /// The request conflicts with current window state.
    #[error(transparent)]
    StateConflict(#[from] RegistryError),
    /// `init` was called while a previous call is still running.
    #[error("initialization already in progress")]
    InitInProgress,
    /// The runtime has not finished initializing.
    #[error("homepage is not initialized yet")]
    NotReady,
}
