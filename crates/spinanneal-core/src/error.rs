//! # Engine Error Types
//!
//! Error classification for model construction and the anneal/simulate
//! drivers. Every failure is a caller-input problem: the engine itself has
//! no I/O and no retryable failure modes.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while validating problem encodings, schedules, and buffers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The flat problem arrays disagree about their own dimensions, or an
    /// index points outside the spin range.
    #[error("shape mismatch: {message}")]
    InvalidShape {
        /// Which arrays disagree and how.
        message: String,
    },

    /// A caller-supplied state or result buffer has the wrong length, or two
    /// parallel schedule arrays differ in length.
    #[error("buffer mismatch: {message}")]
    InvalidBuffer {
        /// Which buffer is wrong and the expected length.
        message: String,
    },

    /// A spin state entry is not exactly +1 or -1.
    #[error("spin {index} has value {value}; spin states must be exactly +1 or -1")]
    InvalidSpin {
        /// Position of the offending entry.
        index: usize,
        /// The value found there.
        value: i8,
    },

    /// A temperature is negative or NaN.
    #[error("invalid temperature schedule: {message}")]
    InvalidSchedule {
        /// Which entry is invalid and why.
        message: String,
    },
}

impl EngineError {
    /// Create a new shape-mismatch error.
    pub fn shape<S: Into<String>>(message: S) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }

    /// Create a new buffer-mismatch error.
    pub fn buffer<S: Into<String>>(message: S) -> Self {
        Self::InvalidBuffer {
            message: message.into(),
        }
    }

    /// Create a new schedule error.
    pub fn schedule<S: Into<String>>(message: S) -> Self {
        Self::InvalidSchedule {
            message: message.into(),
        }
    }
}
