//! Spectral rescaling
//!
//! Chebyshev polynomials are only well behaved on [-1, 1], so the normalized
//! Laplacian `L` (spectrum inside [0, 2]) is mapped through
//!
//! ```text
//! L_scaled = (2 / λ_max) · L − I
//! ```
//!
//! `λ_max` is estimated with a Lanczos iteration. When the iteration runs
//! out of budget, the theoretical bound `λ_max <= 2` is substituted and a
//! warning is emitted; the caller can still tell from [`LambdaMax`] that the
//! result is degraded.

mod lanczos;
mod rescale;

pub use lanczos::{
    EigenEstimate, LanczosSolver, DEFAULT_KRYLOV_DIMENSION, DEFAULT_MAX_ITERATIONS, DEFAULT_SEED,
    DEFAULT_TOLERANCE,
};
pub use rescale::{
    rescale_with, LambdaMax, RescaledLaplacian, SpectralRescaler, DEFAULT_FALLBACK_EIGENVALUE,
};
