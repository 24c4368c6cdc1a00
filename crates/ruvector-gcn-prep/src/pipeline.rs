//! End-to-end preprocessing pipeline
//!
//! ```text
//! raw adjacency ─ symmetrize ─┬─ (+I) ─ normalize ───────────────────────────── FirstOrder
//!                             └─ normalize ─ laplacian ─ rescale ─ chebyshev ─── Chebyshev
//! ```
//!
//! Every final operator is emitted as a canonical [`SparseTriple`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chebyshev::ChebyshevBasisBuilder;
use crate::codec::{to_triple, SparseTriple};
use crate::error::{Result, SpectralError};
use crate::laplacian::laplacian;
use crate::normalize::{self, NormalizationMode};
use crate::scalar::Scalar;
use crate::spectral::{
    rescale_with, LambdaMax, LanczosSolver, SpectralRescaler, DEFAULT_FALLBACK_EIGENVALUE,
    DEFAULT_KRYLOV_DIMENSION, DEFAULT_MAX_ITERATIONS, DEFAULT_SEED, DEFAULT_TOLERANCE,
};
use crate::sparse::SparseOperator;

/// Which operators the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// First-order model: the preprocessed adjacency only
    #[default]
    LocalPool,
    /// Polynomial model: Chebyshev basis of the rescaled Laplacian
    Chebyshev,
}

/// Eigensolver settings used by the Chebyshev path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigensolverConfig {
    /// Lanczos step budget, summed over restarts
    pub max_iterations: usize,
    /// Krylov vectors held before the solver restarts
    pub krylov_dimension: usize,
    /// Relative residual tolerance
    pub tolerance: f64,
    /// Eigenvalue substituted when the solver does not converge
    pub fallback: f64,
    /// Start-vector seed
    pub seed: u64,
}

impl Default for EigensolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            krylov_dimension: DEFAULT_KRYLOV_DIMENSION,
            tolerance: DEFAULT_TOLERANCE,
            fallback: DEFAULT_FALLBACK_EIGENVALUE,
            seed: DEFAULT_SEED,
        }
    }
}

impl EigensolverConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SpectralError::invalid_parameter(
                "max_iterations",
                "must be > 0",
            ));
        }
        if self.krylov_dimension < 2 {
            return Err(SpectralError::invalid_parameter(
                "krylov_dimension",
                "must be >= 2",
            ));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(SpectralError::invalid_parameter(
                "tolerance",
                "must be >= 0",
            ));
        }
        if !self.fallback.is_finite() || self.fallback <= 0.0 {
            return Err(SpectralError::invalid_parameter(
                "fallback",
                "must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Rescaler configured from these settings
    pub fn rescaler(&self) -> SpectralRescaler {
        let solver = LanczosSolver::new(self.max_iterations, self.tolerance)
            .with_krylov_dimension(self.krylov_dimension)
            .with_seed(self.seed);
        SpectralRescaler::new(solver).with_fallback(self.fallback)
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Symmetric (`D^-1/2 A D^-1/2`) instead of random-walk (`D^-1 A`) normalization
    pub symmetric: bool,
    /// Add self-loops before first-order normalization
    pub add_self_loops: bool,
    /// Output family
    pub filter: FilterKind,
    /// Chebyshev polynomial order `k`
    pub chebyshev_order: i64,
    /// Eigensolver settings
    pub eigensolver: EigensolverConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symmetric: true,
            add_self_loops: true,
            filter: FilterKind::LocalPool,
            chebyshev_order: 2,
            eigensolver: EigensolverConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Chebyshev output of order `order`
    pub fn chebyshev(order: i64) -> Self {
        Self {
            filter: FilterKind::Chebyshev,
            chebyshev_order: order,
            ..Self::default()
        }
    }

    /// Set the normalization flavour
    pub fn with_symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    /// Enable or disable self-loops on the first-order path
    pub fn with_self_loops(mut self, add_self_loops: bool) -> Self {
        self.add_self_loops = add_self_loops;
        self
    }

    /// Replace the eigensolver settings
    pub fn with_eigensolver(mut self, eigensolver: EigensolverConfig) -> Self {
        self.eigensolver = eigensolver;
        self
    }

    /// Normalization mode selected by `symmetric`
    pub fn mode(&self) -> NormalizationMode {
        NormalizationMode::from_symmetric(self.symmetric)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ChebyshevBasisBuilder::try_new(self.chebyshev_order)?;
        self.eigensolver.validate()
    }
}

/// Pipeline stages reported to a [`PipelineObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Raw adjacency made symmetric
    Symmetrize,
    /// Self-loops added
    SelfLoops,
    /// Degree normalization
    Normalize,
    /// Laplacian built
    Laplacian,
    /// Laplacian rescaled into [-1, 1]
    Rescale,
    /// Chebyshev basis evaluated
    ChebyshevBasis,
}

impl Stage {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Symmetrize => "symmetrize",
            Self::SelfLoops => "self_loops",
            Self::Normalize => "normalize",
            Self::Laplacian => "laplacian",
            Self::Rescale => "rescale",
            Self::ChebyshevBasis => "chebyshev_basis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hook into pipeline progress
pub trait PipelineObserver: Send + Sync {
    /// A stage finished; `nnz` counts the stored entries it produced
    fn on_stage(&self, _stage: Stage, _nodes: usize, _nnz: usize) {}

    /// The eigensolver did not converge and `fallback` was substituted
    fn on_eigensolver_fallback(&self, _fallback: f64, _cause: &SpectralError) {}
}

/// Observer that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_stage(&self, stage: Stage, nodes: usize, nnz: usize) {
        debug!(%stage, nodes, nnz, "pipeline stage complete");
    }

    fn on_eigensolver_fallback(&self, fallback: f64, cause: &SpectralError) {
        warn!(fallback, %cause, "chebyshev basis built on fallback eigenvalue");
    }
}

/// Operators produced by a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput<T> {
    /// Preprocessed adjacency for first-order models
    FirstOrder {
        /// `normalize(A + I)` (or `normalize(A)` without self-loops)
        adjacency: SparseTriple<T>,
    },
    /// Chebyshev basis `[T0, ..., Tk]`
    Chebyshev {
        /// Basis operators in order
        basis: Vec<SparseTriple<T>>,
        /// Eigenvalue used for rescaling
        lambda_max: LambdaMax<T>,
    },
}

impl<T: Scalar> PipelineOutput<T> {
    /// Final operators in order
    pub fn operators(&self) -> &[SparseTriple<T>] {
        match self {
            Self::FirstOrder { adjacency } => std::slice::from_ref(adjacency),
            Self::Chebyshev { basis, .. } => basis,
        }
    }

    /// Resolved `λ_max`, if the run went through the Laplacian
    pub fn lambda_max(&self) -> Option<&LambdaMax<T>> {
        match self {
            Self::FirstOrder { .. } => None,
            Self::Chebyshev { lambda_max, .. } => Some(lambda_max),
        }
    }

    /// True when the eigensolver fallback was used
    pub fn is_degraded(&self) -> bool {
        self.lambda_max().is_some_and(LambdaMax::is_fallback)
    }
}

/// Configured preprocessing pipeline
pub struct Pipeline {
    config: PipelineConfig,
    observer: Box<dyn PipelineObserver>,
}

impl Pipeline {
    /// Create a pipeline reporting through [`TracingObserver`]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            observer: Box::new(TracingObserver),
        }
    }

    /// Replace the observer
    pub fn with_observer(mut self, observer: impl PipelineObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over a raw, possibly asymmetric adjacency
    pub fn run<T: Scalar>(&self, raw: &SparseOperator<T>) -> Result<PipelineOutput<T>> {
        self.config.validate()?;

        let sym = normalize::symmetrize(raw)?;
        self.report(Stage::Symmetrize, &sym);

        match self.config.filter {
            FilterKind::LocalPool => self.first_order(sym),
            FilterKind::Chebyshev => self.chebyshev(&sym),
        }
    }

    fn first_order<T: Scalar>(&self, sym: SparseOperator<T>) -> Result<PipelineOutput<T>> {
        let adj = if self.config.add_self_loops {
            let looped = normalize::add_self_loops(&sym)?;
            self.report(Stage::SelfLoops, &looped);
            looped
        } else {
            sym
        };

        let normalized = normalize::normalize(&adj, self.config.mode())?;
        self.report(Stage::Normalize, &normalized);

        Ok(PipelineOutput::FirstOrder {
            adjacency: to_triple(&normalized),
        })
    }

    fn chebyshev<T: Scalar>(&self, sym: &SparseOperator<T>) -> Result<PipelineOutput<T>> {
        let builder = ChebyshevBasisBuilder::try_new(self.config.chebyshev_order)?;
        let mode = self.config.mode();

        let normalized = normalize::normalize(sym, mode)?;
        self.report(Stage::Normalize, &normalized);
        let l = laplacian(&normalized)?;
        self.report(Stage::Laplacian, &l);

        // The random-walk Laplacian is similar to the symmetric one, so its
        // largest eigenvalue is estimated on the symmetric form.
        let rescaler = self.config.eigensolver.rescaler();
        let (l_scaled, lambda_max) = match mode {
            NormalizationMode::Symmetric => {
                let rescaled = rescaler.rescale(&l)?;
                (rescaled.operator, rescaled.lambda_max)
            }
            NormalizationMode::RandomWalk => {
                let l_sym = laplacian(&normalize::normalize(sym, NormalizationMode::Symmetric)?)?;
                let lambda_max = rescaler.estimate_lambda_max(&l_sym)?;
                (rescale_with(&l, lambda_max.value())?, lambda_max)
            }
        };
        if let LambdaMax::Fallback { value, cause } = &lambda_max {
            self.observer
                .on_eigensolver_fallback(value.to_f64_lossless(), cause);
        }
        self.report(Stage::Rescale, &l_scaled);

        let basis = builder.build(&l_scaled)?;
        let nnz = basis.iter().map(SparseOperator::nnz).sum();
        self.observer
            .on_stage(Stage::ChebyshevBasis, l_scaled.rows(), nnz);

        Ok(PipelineOutput::Chebyshev {
            basis: basis.iter().map(to_triple).collect(),
            lambda_max,
        })
    }

    fn report<T: Scalar>(&self, stage: Stage, op: &SparseOperator<T>) {
        self.observer.on_stage(stage, op.rows(), op.nnz());
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
