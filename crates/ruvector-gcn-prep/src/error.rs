//! Error types for ruvector-gcn-prep

use thiserror::Error;

/// Result type alias for preprocessing operations
pub type Result<T> = std::result::Result<T, SpectralError>;

/// Errors raised while building spectral operators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectralError {
    /// Operand shapes are incompatible for the requested operation
    #[error("Shape mismatch in {op}: {left:?} vs {right:?}")]
    ShapeMismatch {
        /// Operation that rejected the operands
        op: &'static str,
        /// Shape of the left (or only) operand
        left: (usize, usize),
        /// Shape required or supplied on the right
        right: (usize, usize),
    },

    /// Coordinate outside the operator shape
    #[error("Index ({row}, {col}) out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
        /// Operator shape
        shape: (usize, usize),
    },

    /// Coordinate and value sequences disagree in length
    #[error("Length mismatch: {rows} rows, {cols} cols, {values} values")]
    LengthMismatch {
        /// Number of row indices
        rows: usize,
        /// Number of column indices
        cols: usize,
        /// Number of values
        values: usize,
    },

    /// Largest eigenvalue is zero (or otherwise unusable for rescaling)
    #[error("Degenerate spectrum: largest eigenvalue {lambda_max} cannot rescale the Laplacian")]
    DegenerateSpectrum {
        /// Resolved largest eigenvalue
        lambda_max: f64,
    },

    /// Iterative eigensolver exhausted its budget
    #[error("Eigensolver did not converge after {iterations} iterations (residual: {residual:.2e})")]
    EigensolverNonConvergence {
        /// Lanczos steps performed
        iterations: usize,
        /// Residual estimate of the best Ritz pair
        residual: f64,
    },

    /// Negative Chebyshev order
    #[error("Invalid Chebyshev order {order}: must be >= 0")]
    InvalidOrder {
        /// Requested order
        order: i64,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },
}

impl SpectralError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(op: &'static str, left: (usize, usize), right: (usize, usize)) -> Self {
        Self::ShapeMismatch { op, left, right }
    }

    /// Create an out-of-bounds error
    pub fn index_out_of_bounds(row: usize, col: usize, shape: (usize, usize)) -> Self {
        Self::IndexOutOfBounds { row, col, shape }
    }

    /// Create a degenerate spectrum error
    pub fn degenerate_spectrum(lambda_max: f64) -> Self {
        Self::DegenerateSpectrum { lambda_max }
    }

    /// Create a non-convergence error
    pub fn non_convergence(iterations: usize, residual: f64) -> Self {
        Self::EigensolverNonConvergence {
            iterations,
            residual,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors the pipeline may recover from numerically
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EigensolverNonConvergence { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpectralError::shape_mismatch("add", (3, 3), (4, 4));
        let msg = err.to_string();
        assert!(msg.contains("add"));
        assert!(msg.contains("(3, 3)"));
        assert!(msg.contains("(4, 4)"));
    }

    #[test]
    fn test_only_non_convergence_is_recoverable() {
        assert!(SpectralError::non_convergence(10, 1e-3).is_recoverable());
        assert!(!SpectralError::degenerate_spectrum(0.0).is_recoverable());
        assert!(!SpectralError::InvalidOrder { order: -1 }.is_recoverable());
        assert!(!SpectralError::shape_mismatch("laplacian", (2, 3), (2, 2)).is_recoverable());
    }

    #[test]
    fn test_convergence_error() {
        let err = SpectralError::non_convergence(100, 1e-3);
        assert!(err.to_string().contains("100"));
    }
}
