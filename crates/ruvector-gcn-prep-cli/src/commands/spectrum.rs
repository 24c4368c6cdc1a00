use super::GraphArgs;
use crate::config::{Config, Precision};
use crate::edges::{read_edge_list, EdgeList};
use crate::output::{write_json, LambdaReport, SpectrumReport};
use clap::Args;
use ruvector_gcn_prep::{
    normalized_laplacian_of, symmetrize, EigensolverConfig, NormalizationMode, Scalar,
};

#[derive(Args, Debug, Clone, Default)]
pub struct SpectrumArgs {
    #[command(flatten)]
    graph: GraphArgs,
}

pub fn run(args: SpectrumArgs, config: &Config) -> anyhow::Result<()> {
    let edges = read_edge_list(&args.graph.input)?;
    let eigensolver = args.graph.eigensolver(&config.pipeline.eigensolver);
    eigensolver.validate()?;

    match args.graph.precision.unwrap_or(config.output.precision) {
        Precision::F32 => report::<f32>(&edges, &args, &eigensolver, config),
        Precision::F64 => report::<f64>(&edges, &args, &eigensolver, config),
    }
}

fn report<T: Scalar>(
    edges: &EdgeList,
    args: &SpectrumArgs,
    eigensolver: &EigensolverConfig,
    config: &Config,
) -> anyhow::Result<()> {
    let spectrum = estimate::<T>(edges, args, eigensolver)?;
    write_json(&spectrum, None, config.output.pretty)
}

fn estimate<T: Scalar>(
    edges: &EdgeList,
    args: &SpectrumArgs,
    eigensolver: &EigensolverConfig,
) -> anyhow::Result<SpectrumReport<T>> {
    let raw = edges.to_operator::<T>(args.graph.nodes)?;
    let sym = symmetrize(&raw)?;
    // Both normalizations share one spectrum, the symmetric one is the one
    // the eigensolver can work on
    let l = normalized_laplacian_of(&sym, NormalizationMode::Symmetric)?;
    let lambda_max = eigensolver.rescaler().estimate_lambda_max(&l)?;

    Ok(SpectrumReport {
        nodes: l.rows(),
        nnz: l.nnz(),
        lambda_max: LambdaReport::from(&lambda_max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn path_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# path\n0 1\n1 2").unwrap();
        file
    }

    #[test]
    fn test_path_spectrum() {
        let file = path_file();
        let edges = read_edge_list(file.path()).unwrap();
        let args = SpectrumArgs::default();

        let report = estimate::<f64>(&edges, &args, &EigensolverConfig::default()).unwrap();
        assert_eq!(report.nodes, 3);
        assert!(!report.lambda_max.fallback);
        // Path on three nodes: normalized Laplacian spectrum {0, 1, 2}
        assert!((report.lambda_max.value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_budget_override_triggers_fallback() {
        let file = path_file();
        let edges = read_edge_list(file.path()).unwrap();
        let args = SpectrumArgs {
            graph: GraphArgs {
                max_iterations: Some(1),
                fallback: Some(2.5),
                ..Default::default()
            },
        };
        let eigensolver = args.graph.eigensolver(&EigensolverConfig::default());

        let report = estimate::<f32>(&edges, &args, &eigensolver).unwrap();
        assert!(report.lambda_max.fallback);
        assert_eq!(report.lambda_max.value, 2.5);
    }
}
