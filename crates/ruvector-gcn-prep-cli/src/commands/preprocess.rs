use super::GraphArgs;
use crate::config::{Config, Precision};
use crate::edges::{read_edge_list, EdgeList};
use crate::output::{write_json, PreprocessReport};
use clap::{Args, ValueEnum};
use ruvector_gcn_prep::{FilterKind, NormalizationMode, Pipeline, PipelineConfig, Scalar};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct PreprocessArgs {
    #[command(flatten)]
    graph: GraphArgs,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Operator family to produce
    #[arg(short, long, value_enum)]
    filter: Option<Filter>,

    /// Chebyshev polynomial order
    #[arg(short = 'k', long, allow_negative_numbers = true)]
    order: Option<i64>,

    /// Skip self-loops on the first-order path
    #[arg(long)]
    no_self_loops: bool,

    /// Compact single-line JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    LocalPool,
    Chebyshev,
}

impl From<Filter> for FilterKind {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::LocalPool => FilterKind::LocalPool,
            Filter::Chebyshev => FilterKind::Chebyshev,
        }
    }
}

impl PreprocessArgs {
    /// Pipeline configuration with command-line overrides applied
    fn pipeline_config(&self, base: &PipelineConfig) -> PipelineConfig {
        let mut config = base.clone();
        config.symmetric = self.graph.mode(base.symmetric) == NormalizationMode::Symmetric;
        config.add_self_loops = base.add_self_loops && !self.no_self_loops;
        if let Some(filter) = self.filter {
            config.filter = filter.into();
        }
        if let Some(order) = self.order {
            config.chebyshev_order = order;
        }
        config.eigensolver = self.graph.eigensolver(&base.eigensolver);
        config
    }
}

pub fn run(args: PreprocessArgs, config: &Config) -> anyhow::Result<()> {
    let edges = read_edge_list(&args.graph.input)?;
    let pipeline_config = args.pipeline_config(&config.pipeline);
    pipeline_config.validate()?;

    let precision = args.graph.precision.unwrap_or(config.output.precision);
    let pretty = config.output.pretty && !args.compact;

    tracing::info!(
        filter = ?pipeline_config.filter,
        symmetric = pipeline_config.symmetric,
        ?precision,
        "preprocessing adjacency"
    );

    match precision {
        Precision::F32 => run_typed::<f32>(&edges, &args, pipeline_config, pretty),
        Precision::F64 => run_typed::<f64>(&edges, &args, pipeline_config, pretty),
    }
}

fn run_typed<T: Scalar>(
    edges: &EdgeList,
    args: &PreprocessArgs,
    config: PipelineConfig,
    pretty: bool,
) -> anyhow::Result<()> {
    let raw = edges.to_operator::<T>(args.graph.nodes)?;
    let output = Pipeline::new(config).run(&raw)?;
    if output.is_degraded() {
        tracing::warn!("output built on the fallback eigenvalue, accuracy is degraded");
    }

    write_json(
        &PreprocessReport::from(output),
        args.output.as_deref(),
        pretty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ring_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 1\n1 2\n2 3\n3 0").unwrap();
        file
    }

    fn args_for(input: PathBuf, output: PathBuf) -> PreprocessArgs {
        PreprocessArgs {
            graph: GraphArgs {
                input,
                ..Default::default()
            },
            output: Some(output),
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_override_file() {
        let mut base = PipelineConfig::default();
        base.eigensolver.max_iterations = 7;

        let args = PreprocessArgs {
            graph: GraphArgs {
                random_walk: true,
                krylov_dimension: Some(8),
                fallback: Some(3.0),
                ..Default::default()
            },
            filter: Some(Filter::Chebyshev),
            order: Some(4),
            no_self_loops: true,
            ..Default::default()
        };
        let config = args.pipeline_config(&base);

        assert!(!config.symmetric);
        assert!(!config.add_self_loops);
        assert_eq!(config.filter, FilterKind::Chebyshev);
        assert_eq!(config.chebyshev_order, 4);
        assert_eq!(config.eigensolver.max_iterations, 7);
        assert_eq!(config.eigensolver.krylov_dimension, 8);
        assert_eq!(config.eigensolver.fallback, 3.0);
    }

    #[test]
    fn test_first_order_file_output() {
        let input = ring_file();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("adjacency.json");

        run(args_for(input.path().to_path_buf(), out.clone()), &Config::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["mode"], "first_order");
        // Directed ring symmetrizes to an undirected one, plus four self-loops
        assert_eq!(json["adjacency"]["values"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_chebyshev_single_precision() {
        let input = ring_file();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("basis.json");

        let mut args = args_for(input.path().to_path_buf(), out.clone());
        args.filter = Some(Filter::Chebyshev);
        args.order = Some(2);
        args.graph.precision = Some(Precision::F32);
        run(args, &Config::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["mode"], "chebyshev");
        assert_eq!(json["basis"].as_array().unwrap().len(), 3);
        assert_eq!(json["lambda_max"]["fallback"], false);
    }

    #[test]
    fn test_negative_order_is_an_error() {
        let input = ring_file();
        let dir = tempfile::tempdir().unwrap();
        let mut args = args_for(input.path().to_path_buf(), dir.path().join("x.json"));
        args.filter = Some(Filter::Chebyshev);
        args.order = Some(-1);

        let err = run(args, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("order"));
    }
}
