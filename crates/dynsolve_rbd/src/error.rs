//! Error types for model construction and algorithm calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The model description is inconsistent (unknown parent, bad axis, ...).
    #[error("invalid model description: {0}")]
    Description(String),

    #[error("failed to read model description: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model description: {0}")]
    Json(#[from] serde_json::Error),

    /// An argument vector has the wrong length for this model.
    #[error("{what} has size {actual}, expected {expected}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The joint-space inertia matrix could not be factorized.
    #[error("joint-space inertia matrix is not positive definite")]
    Singular,
}

impl ModelError {
    pub fn description(msg: impl Into<String>) -> Self {
        Self::Description(msg.into())
    }

    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::Dimension {
                what,
                expected,
                actual,
            })
        }
    }
}
