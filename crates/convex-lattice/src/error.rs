//! Error types for lattice valuation.

use thiserror::Error;

use crate::models::ModelError;

/// A specialized Result type for lattice operations.
pub type LatticeResult<T> = Result<T, LatticeError>;

/// Errors that can occur while valuing an asset on a lattice.
///
/// All variants are fatal for the valuation in progress: numerical rollback
/// is deterministic, so retrying the same call cannot succeed.
#[derive(Error, Debug, Clone)]
pub enum LatticeError {
    /// An asset and the asset it wraps disagree on their lattice, or a value
    /// vector does not match the lattice node count.
    #[error("Consistency error: {reason}")]
    Consistency {
        /// Description of the mismatch.
        reason: String,
    },

    /// A lifecycle call was made out of order (rolling forward in time,
    /// reading the present value before time 0, using an unbound asset).
    #[error("Sequence error: {reason}")]
    Sequence {
        /// Description of the misuse.
        reason: String,
    },

    /// An internal invariant was broken by a construction defect.
    #[error("Invariant violation: {reason}")]
    InvariantViolation {
        /// Description of the broken invariant.
        reason: String,
    },

    /// Invalid construction parameter or input data.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of what's invalid.
        reason: String,
    },

    /// Short rate model error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl LatticeError {
    /// Creates a consistency error.
    #[must_use]
    pub fn consistency(reason: impl Into<String>) -> Self {
        Self::Consistency {
            reason: reason.into(),
        }
    }

    /// Creates a sequence error.
    #[must_use]
    pub fn sequence(reason: impl Into<String>) -> Self {
        Self::Sequence {
            reason: reason.into(),
        }
    }

    /// Creates an invariant violation error.
    #[must_use]
    pub fn invariant_violation(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a consistency error for a value vector of the wrong length.
    #[must_use]
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::consistency(format!(
            "value vector has {actual} entries, lattice has {expected} nodes"
        ))
    }
}
