use ruvector_gcn_prep::{EigenEstimate, LambdaMax, PipelineOutput, Scalar, SparseTriple};
use serde::Serialize;
use std::path::Path;

/// JSON document written by `preprocess`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[serde(bound = "T: Scalar")]
pub enum PreprocessReport<T> {
    FirstOrder {
        adjacency: SparseTriple<T>,
    },
    Chebyshev {
        order: usize,
        lambda_max: LambdaReport<T>,
        basis: Vec<SparseTriple<T>>,
    },
}

/// Resolved largest eigenvalue and how it was obtained
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Scalar")]
pub struct LambdaReport<T> {
    pub value: T,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<EigenEstimate<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T: Scalar> From<&LambdaMax<T>> for LambdaReport<T> {
    fn from(lambda_max: &LambdaMax<T>) -> Self {
        match lambda_max {
            LambdaMax::Estimated(est) => Self {
                value: est.value,
                fallback: false,
                estimate: Some(*est),
                warning: None,
            },
            LambdaMax::Fallback { value, cause } => Self {
                value: *value,
                fallback: true,
                estimate: None,
                warning: Some(cause.to_string()),
            },
        }
    }
}

impl<T: Scalar> From<PipelineOutput<T>> for PreprocessReport<T> {
    fn from(output: PipelineOutput<T>) -> Self {
        match output {
            PipelineOutput::FirstOrder { adjacency } => Self::FirstOrder { adjacency },
            PipelineOutput::Chebyshev { basis, lambda_max } => Self::Chebyshev {
                order: basis.len().saturating_sub(1),
                lambda_max: LambdaReport::from(&lambda_max),
                basis,
            },
        }
    }
}

/// JSON document written by `spectrum`
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Scalar")]
pub struct SpectrumReport<T> {
    pub nodes: usize,
    pub nnz: usize,
    pub lambda_max: LambdaReport<T>,
}

/// Serialize `value` to `path`, or stdout when no path is given
pub fn write_json<S: Serialize>(value: &S, path: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match path {
        Some(p) => {
            std::fs::write(p, json)?;
            tracing::info!(path = %p.display(), "wrote output");
        }
        None => println!("{json}"),
    }
    Ok(())
}
