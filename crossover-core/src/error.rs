//! Error taxonomy for the core pipeline.
//!
//! Every component validates its inputs at the boundary and fails before
//! producing any output. There is no partially computed series on the error
//! path.

use std::fmt;
use thiserror::Error;

/// How two series fail to line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misalignment {
    /// The series have a different number of entries.
    Length { left: usize, right: usize },
    /// Same length, but the timestamps first differ at this position.
    Timestamp { position: usize },
}

impl fmt::Display for Misalignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Misalignment::Length { left, right } => {
                write!(f, "{left} entries vs {right} entries")
            }
            Misalignment::Timestamp { position } => {
                write!(f, "timestamps diverge at position {position}")
            }
        }
    }
}

/// Errors produced by the core computations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid window {window}: must be >= 1")]
    InvalidWindow { window: usize },

    #[error("input series is empty")]
    EmptyInput,

    #[error("{context}: series are misaligned ({detail})")]
    LengthMismatch {
        context: &'static str,
        detail: Misalignment,
    },

    #[error("initial balance must be a positive finite number, got {0}")]
    NonPositiveBalance(f64),

    #[error("undefined {what} at index {index}")]
    UndefinedValue { what: &'static str, index: usize },

    #[error("timestamps must be strictly increasing (violated at index {index})")]
    UnorderedIndex { index: usize },
}
