use dynsolve_rbd::ModelError;
use thiserror::Error;

/// Coarse classification used by callers that only care about the fault class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Dimension,
    Unsupported,
}

#[derive(Debug, Error)]
pub enum DynamicsError {
    /// The scene or parameters are incompatible with the solver's assumptions.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A state, control or tangent vector has the wrong size.
    #[error("dimension error: {what} has size {actual}, expected {expected}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("dimension error: argument position {0} is not 0 or 1")]
    InvalidArgumentPosition(usize),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl DynamicsError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_bound(type_name: &str) -> Self {
        Self::Configuration(format!("{type_name} is not bound to a scene"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Dimension { .. } | Self::InvalidArgumentPosition(_) => ErrorKind::Dimension,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
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

impl From<ModelError> for DynamicsError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Dimension {
                what,
                expected,
                actual,
            } => Self::Dimension {
                what,
                expected,
                actual,
            },
            other => Self::Configuration(other.to_string()),
        }
    }
}

pub type Result<T, E = DynamicsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_keep_their_class() {
        let dim: DynamicsError = ModelError::Dimension {
            what: "velocity",
            expected: 2,
            actual: 3,
        }
        .into();
        assert_eq!(dim.kind(), ErrorKind::Dimension);

        let desc: DynamicsError = ModelError::description("bad axis").into();
        assert_eq!(desc.kind(), ErrorKind::Configuration);
        assert!(desc.to_string().contains("bad axis"));
    }

    #[test]
    fn argument_position_is_a_dimension_fault() {
        assert_eq!(
            DynamicsError::InvalidArgumentPosition(2).kind(),
            ErrorKind::Dimension
        );
    }
}
