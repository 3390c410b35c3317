//! Error types for the filters.
//!
//! Only two things can go wrong inside the filters themselves: a process noise
//! description that cannot be turned into a per-second noise rate, and an update
//! whose innovation covariance cannot be inverted. Everything else (extreme
//! accuracies, polar latitudes, zero speed) is accepted as-is.
use thiserror::Error;

/// Filter error types
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    /// A non-zero random step was given with a zero time step, so no noise rate exists.
    #[error("invalid process noise arguments: random step given without a time step")]
    InvalidProcessNoise,
    /// The innovation covariance (predicted covariance plus observation noise) is singular.
    #[error("innovation covariance is singular, observation rejected")]
    SingularMatrix,
}

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

impl From<FilterError> for std::io::Error {
    fn from(err: FilterError) -> Self {
        std::io::Error::other(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert!(
            FilterError::InvalidProcessNoise
                .to_string()
                .starts_with("invalid process noise")
        );
        assert!(FilterError::SingularMatrix.to_string().contains("singular"));
    }

    #[test]
    fn converts_into_io_error() {
        let err: std::io::Error = FilterError::SingularMatrix.into();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }
}
