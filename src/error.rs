//! Domain errors for the configuration engine.
//!
//! These are the only failures the pure core can report. None of them is fatal:
//! each one rejects a single mutation and leaves the state as it was.
use thiserror::Error;

use crate::fields::MAX_SELECTED_FIELDS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichError {
    /// Selecting another field would exceed the selection limit.
    #[error("maximum {MAX_SELECTED_FIELDS} fields allowed")]
    CapacityExceeded,

    /// A field with this machine name is already selected.
    #[error("field `{0}` is already selected")]
    Duplicate(String),

    /// The field generation service failed or returned an unusable payload.
    #[error("failed to generate fields: {0}")]
    GenerationFailed(String),

    /// User-supplied input was rejected before reaching the registry.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested transition is not available from the current step.
    #[error("{0}")]
    StepBlocked(String),

    /// A generation request is already pending.
    #[error("generation request #{0} is still in flight")]
    GenerationInFlight(u64),
}

impl EnrichError {
    /// Whether the caller should surface this to the user or treat it as a no-op.
    pub fn is_silent(&self) -> bool {
        matches!(self, EnrichError::Duplicate(_))
    }
}
