//! Error types for deform_core operations.
//!
//! A plain enum with no external dependencies, so the host-side math stays
//! usable without pulling in an error framework.

use core::fmt;

/// Error types that can occur during deform_core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// Two point sets that must correspond one-to-one have different lengths.
    LengthMismatch {
        /// Length of the first set.
        left: usize,
        /// Length of the second set.
        right: usize,
    },
    /// A fit was requested on fewer points than it can be solved for.
    TooFewPoints {
        /// The minimum number of points required.
        required: usize,
        /// The number of points provided.
        got: usize,
    },
    /// An integer region tag does not belong to the mode's enumeration.
    InvalidRegionTag {
        /// The offending tag.
        tag: u8,
        /// Name of the training mode whose enumeration was used.
        mode: &'static str,
    },
    /// The singular value decomposition did not converge or did not produce both factors.
    Decomposition,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::LengthMismatch { left, right } => {
                write!(f, "point sets differ in length: {} vs {}", left, right)
            }
            CoreError::TooFewPoints { required, got } => {
                write!(f, "fit requires at least {} points, got {}", required, got)
            }
            CoreError::InvalidRegionTag { tag, mode } => {
                write!(f, "region tag {} is not valid in {} mode", tag, mode)
            }
            CoreError::Decomposition => {
                write!(f, "singular value decomposition failed")
            }
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::TooFewPoints {
            required: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "fit requires at least 3 points, got 2");

        let err = CoreError::InvalidRegionTag {
            tag: 7,
            mode: "surface",
        };
        assert!(err.to_string().contains("surface"));
    }
}
