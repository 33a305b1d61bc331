//! Error types for design operations.

use thiserror::Error;

use crate::render::RenderError;
use crate::store::StoreError;

/// Result type for design operations.
pub type DesignResult<T> = Result<T, DesignError>;

/// Errors that can occur while editing, rendering or loading a design.
///
/// Every variant except [`DesignError::Invariant`] is a recoverable condition
/// reported to the calling UI layer; the model is left unchanged.
#[derive(Debug, Error)]
pub enum DesignError {
    /// Malformed element input (missing required field, wrong value type).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An operation referenced an id that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A reorder request was not a permutation of the existing ids.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// A single-choice control received a value outside its option set.
    #[error("Unknown option {value:?} for control {control}")]
    UnknownOption {
        /// Control name.
        control: String,
        /// Rejected value.
        value: String,
    },

    /// No control is registered under this name.
    #[error("Unknown control: {0}")]
    UnknownControl(String),

    /// The view has locked dimensions and cannot be resized.
    #[error("View {0} has locked dimensions")]
    LockedDimensions(String),

    /// A persisted document could not be loaded.
    #[error("Schema error: {0}")]
    Schema(String),

    /// The operation is not valid in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// An internal invariant was violated. The affected view is halted.
    #[error("Invariant violated in view {view}: {detail}")]
    Invariant {
        /// Affected view.
        view: String,
        /// What was found.
        detail: String,
    },

    /// The view was halted after an invariant violation and rejects mutation.
    #[error("View {0} is halted after an invariant violation")]
    ViewHalted(String),

    /// Rendering backend failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Persistence collaborator failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JSON encoding/decoding error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DesignError {
    /// Whether the error is a fatal invariant violation rather than bad input.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant { .. } | Self::ViewHalted(_))
    }
}
