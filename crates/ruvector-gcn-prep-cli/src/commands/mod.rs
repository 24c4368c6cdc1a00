pub mod preprocess;
pub mod spectrum;

use crate::config::Precision;
use clap::Args;
use ruvector_gcn_prep::{EigensolverConfig, NormalizationMode};
use std::path::PathBuf;

/// Input and eigensolver flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GraphArgs {
    /// Edge-list file (`src dst [weight]` per line)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of nodes (default: largest node id + 1)
    #[arg(short, long)]
    pub nodes: Option<usize>,

    /// Use random-walk normalization instead of symmetric
    #[arg(long)]
    pub random_walk: bool,

    /// Floating-point precision
    #[arg(long, value_enum)]
    pub precision: Option<Precision>,

    /// Lanczos iteration budget
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Krylov vectors held before Lanczos restarts
    #[arg(long)]
    pub krylov_dimension: Option<usize>,

    /// Eigenvalue substituted when the eigensolver does not converge
    #[arg(long)]
    pub fallback: Option<f64>,
}

impl GraphArgs {
    /// Normalization mode, with the flag taking precedence over the file
    pub fn mode(&self, symmetric: bool) -> NormalizationMode {
        NormalizationMode::from_symmetric(symmetric && !self.random_walk)
    }

    /// Apply eigensolver overrides on top of file settings
    pub fn eigensolver(&self, base: &EigensolverConfig) -> EigensolverConfig {
        let mut config = base.clone();
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if let Some(krylov_dimension) = self.krylov_dimension {
            config.krylov_dimension = krylov_dimension;
        }
        if let Some(fallback) = self.fallback {
            config.fallback = fallback;
        }
        config
    }
}
