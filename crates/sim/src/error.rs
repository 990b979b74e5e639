//! Error types for simulator construction and configuration.
//!
//! The simulation itself has no recoverable error surface: runtime edge
//! cases (zero wind, flat gradients, empty cells) are handled by explicit
//! guards and never raise. Everything that can go wrong is rejected up
//! front, when the simulator or one of its layers is built.

use std::error::Error;
use std::fmt;

/// Errors raised when building or configuring a [`crate::DuneSimulation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// The requested grid does not produce square cells: either the
    /// resolution is not square, or the bounding box aspect ratio does not
    /// match it.
    InvalidGeometry {
        /// Requested grid resolution.
        nx: usize,
        /// Requested grid resolution.
        ny: usize,
    },
    /// A layer supplied through one of the `set_*` methods has a different
    /// resolution than the simulator's grid.
    DimensionMismatch {
        /// Resolution of the simulator grid.
        expected: (usize, usize),
        /// Resolution of the supplied field.
        got: (usize, usize),
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry { nx, ny } => {
                write!(f, "grid {nx}x{ny} does not yield square cells")
            }
            Self::DimensionMismatch { expected, got } => {
                write!(
                    f,
                    "field resolution {}x{} does not match simulator grid {}x{}",
                    got.0, got.1, expected.0, expected.1
                )
            }
        }
    }
}

impl Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = SimError::InvalidGeometry { nx: 10, ny: 20 };
        assert!(e.to_string().contains("10x20"));

        let e = SimError::DimensionMismatch {
            expected: (64, 64),
            got: (32, 64),
        };
        assert!(e.to_string().contains("32x64"));
        assert!(e.to_string().contains("64x64"));
    }
}
