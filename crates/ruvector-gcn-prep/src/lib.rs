//! # RuVector GCN Prep
//!
//! Spectral preprocessing of graph adjacency for graph convolutional networks:
//!
//! - **Sparse operators**: immutable CSR matrices with a fixed SpGEMM summation order
//! - **Normalization**: symmetrization, self-loops, `D^-1/2 A D^-1/2` and `D^-1 A`
//! - **Laplacian**: `L = I - A_norm`
//! - **Spectral rescaling**: Lanczos estimate of `λ_max` and `(2/λ_max) L - I`
//! - **Chebyshev bases**: `T0 = I`, `T1 = L`, `Tk = 2 L Tk-1 - Tk-2`
//! - **Codec**: canonical `(coords, values, shape)` triples for tensor consumers
//!
//! ## Data Flow
//!
//! ```text
//!                      raw adjacency
//!                            │
//!                       symmetrize
//!                            │
//!            ┌───────────────┴───────────────┐
//!            ▼                               ▼
//!    normalize(A + I)                 L = I - normalize(A)
//!    (first-order models)                    │
//!            │                        λ_max (Lanczos, fallback 2.0)
//!            │                               │
//!            │                        (2/λ_max) L - I
//!            │                               │
//!            │                        T0 .. Tk (Chebyshev)
//!            └───────────────┬───────────────┘
//!                            ▼
//!                     SparseTriple(s)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ruvector_gcn_prep::{Pipeline, PipelineConfig, SparseOperator};
//!
//! // Directed ring on 4 nodes
//! let raw = SparseOperator::<f64>::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
//!
//! // First-order preprocessing
//! let output = Pipeline::new(PipelineConfig::default()).run(&raw).unwrap();
//! assert_eq!(output.operators()[0].shape, (4, 4));
//!
//! // Chebyshev basis of order 2
//! let output = Pipeline::new(PipelineConfig::chebyshev(2)).run(&raw).unwrap();
//! assert_eq!(output.operators().len(), 3);
//! assert!(!output.is_degraded());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chebyshev;
pub mod codec;
pub mod error;
pub mod laplacian;
pub mod normalize;
pub mod pipeline;
pub mod scalar;
pub mod sparse;
pub mod spectral;

pub use chebyshev::{chebyshev_basis, ChebyshevBasisBuilder};
pub use codec::{from_triple, to_triple, SparseTriple};
pub use error::{Result, SpectralError};
pub use laplacian::{laplacian, normalized_laplacian_of};
pub use normalize::{
    add_self_loops, normalize, preprocess_adjacency, symmetrize, NormalizationMode,
};
pub use pipeline::{
    EigensolverConfig, FilterKind, Pipeline, PipelineConfig, PipelineObserver, PipelineOutput,
    Stage, TracingObserver,
};
pub use scalar::Scalar;
pub use sparse::{SparseMask, SparseOperator};
pub use spectral::{
    rescale_with, EigenEstimate, LambdaMax, LanczosSolver, RescaledLaplacian, SpectralRescaler,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chebyshev::*;
    pub use crate::codec::*;
    pub use crate::error::*;
    pub use crate::laplacian::*;
    pub use crate::normalize::*;
    pub use crate::pipeline::*;
    pub use crate::scalar::*;
    pub use crate::sparse::*;
    pub use crate::spectral::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(!version.is_empty());
    }
}
