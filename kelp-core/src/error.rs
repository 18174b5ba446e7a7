//! Errors in the library.
use thiserror::Error;

/// Errors raised by stores and records.
///
/// Store operations either commit a transition completely or return one of these
/// values without touching any column.
#[derive(Error, Debug, PartialEq)]
pub enum KelpError {
    /// Sampling was requested before enough transitions were collected.
    #[error("requested {requested} samples, but only {available} are available")]
    InsufficientData {
        /// The number of requested samples.
        requested: usize,
        /// The number of valid entries in the store.
        available: usize,
    },

    /// Malformed input, such as a row of the wrong width or a per-agent list of
    /// the wrong length.
    #[error("dimension mismatch in {field}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Name of the offending argument.
        field: String,
        /// Expected length.
        expected: usize,
        /// Given length.
        actual: usize,
    },

    /// A trajectory store was written past its horizon.
    #[error("trajectory store is full (horizon = {horizon})")]
    BufferOverflow {
        /// The horizon of the store.
        horizon: usize,
    },

    /// Configuration that cannot be used to build a store.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl KelpError {
    pub(crate) fn mismatch(field: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            field: field.into(),
            expected,
            actual,
        }
    }
}
