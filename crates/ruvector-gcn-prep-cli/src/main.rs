use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod edges;
mod output;

#[derive(Parser)]
#[command(name = "ruvector-gcn-prep")]
#[command(author = "rUv <ruv@ruv.io>")]
#[command(version)]
#[command(about = "Spectral graph-convolution preprocessing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize an edge list and emit canonical sparse triples
    Preprocess(commands::preprocess::PreprocessArgs),

    /// Estimate the largest eigenvalue of the normalized Laplacian
    Spectrum(commands::spectrum::SpectrumArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .init();

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Preprocess(args) => commands::preprocess::run(args, &config),
        Commands::Spectrum(args) => commands::spectrum::run(args, &config),
    }
}
