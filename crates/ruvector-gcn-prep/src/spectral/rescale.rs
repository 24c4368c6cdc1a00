//! Spectral rescaling of a normalized Laplacian into [-1, 1]

use tracing::{info, warn};

use super::lanczos::{EigenEstimate, LanczosSolver};
use crate::error::{Result, SpectralError};
use crate::scalar::Scalar;
use crate::sparse::SparseOperator;

/// Upper bound on the spectrum of a normalized Laplacian, used when the
/// eigensolver does not converge
pub const DEFAULT_FALLBACK_EIGENVALUE: f64 = 2.0;

/// How the largest eigenvalue was resolved
#[derive(Debug, Clone, PartialEq)]
pub enum LambdaMax<T> {
    /// The eigensolver converged
    Estimated(EigenEstimate<T>),
    /// The eigensolver ran out of budget and the fallback bound was used
    Fallback {
        /// Substituted eigenvalue
        value: T,
        /// The absorbed non-convergence
        cause: SpectralError,
    },
}

impl<T: Scalar> LambdaMax<T> {
    /// Eigenvalue used for rescaling
    pub fn value(&self) -> T {
        match self {
            Self::Estimated(est) => est.value,
            Self::Fallback { value, .. } => *value,
        }
    }

    /// True when the fallback was substituted (degraded accuracy)
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// `L_scaled = (2 / λ_max) · L − I` together with the resolved `λ_max`
#[derive(Debug, Clone, PartialEq)]
pub struct RescaledLaplacian<T> {
    /// Rescaled operator, spectrum inside [-1, 1]
    pub operator: SparseOperator<T>,
    /// Eigenvalue used for the rescaling
    pub lambda_max: LambdaMax<T>,
}

/// Estimates `λ_max` and rescales Laplacians
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralRescaler {
    solver: LanczosSolver,
    fallback: f64,
}

impl Default for SpectralRescaler {
    fn default() -> Self {
        Self {
            solver: LanczosSolver::default(),
            fallback: DEFAULT_FALLBACK_EIGENVALUE,
        }
    }
}

impl SpectralRescaler {
    /// Create a rescaler around a configured eigensolver
    pub fn new(solver: LanczosSolver) -> Self {
        Self {
            solver,
            ..Default::default()
        }
    }

    /// Override the fallback eigenvalue
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Underlying eigensolver
    pub fn solver(&self) -> &LanczosSolver {
        &self.solver
    }

    /// Fallback eigenvalue
    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    /// Resolve `λ_max`, absorbing eigensolver non-convergence.
    ///
    /// Structural errors from the solver propagate unchanged.
    pub fn estimate_lambda_max<T: Scalar>(
        &self,
        laplacian: &SparseOperator<T>,
    ) -> Result<LambdaMax<T>> {
        match self.solver.largest_eigenvalue(laplacian) {
            Ok(est) => {
                info!(
                    lambda_max = %est.value,
                    iterations = est.iterations,
                    "largest eigenvalue of normalized Laplacian"
                );
                Ok(LambdaMax::Estimated(est))
            }
            Err(cause) if cause.is_recoverable() => {
                warn!(
                    fallback = self.fallback,
                    %cause,
                    "eigenvalue calculation did not converge, using fallback"
                );
                Ok(LambdaMax::Fallback {
                    value: T::from_config(self.fallback),
                    cause,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Rescale `laplacian` by its resolved largest eigenvalue
    pub fn rescale<T: Scalar>(
        &self,
        laplacian: &SparseOperator<T>,
    ) -> Result<RescaledLaplacian<T>> {
        let lambda_max = self.estimate_lambda_max(laplacian)?;
        let operator = rescale_with(laplacian, lambda_max.value())?;
        Ok(RescaledLaplacian {
            operator,
            lambda_max,
        })
    }
}

/// `(2 / λ_max) · L − I` for a given `λ_max`.
///
/// A zero or non-finite `λ_max`, or one whose reciprocal overflows, is a
/// [`SpectralError::DegenerateSpectrum`].
pub fn rescale_with<T: Scalar>(
    laplacian: &SparseOperator<T>,
    lambda_max: T,
) -> Result<SparseOperator<T>> {
    if !laplacian.is_square() {
        return Err(SpectralError::shape_mismatch(
            "rescale",
            laplacian.shape(),
            (laplacian.rows(), laplacian.rows()),
        ));
    }
    let two = T::from_config(2.0);
    let factor = two / lambda_max;
    if lambda_max == T::zero() || !lambda_max.is_finite() || !factor.is_finite() {
        return Err(SpectralError::degenerate_spectrum(
            lambda_max.to_f64_lossless(),
        ));
    }
    laplacian
        .scale(factor)
        .sub(&SparseOperator::identity(laplacian.rows()))
}
