use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use sla_core::config::PipelineConfig;
use sla_core::Executor;
use sla_io::{FileSink, FileSource};
use sla_ops::MovingAverage;
use tracing::{error, info};

/// Calculates the moving average of translation delivery time, one line per minute.
#[derive(Parser, Debug)]
#[command(name = "delivery-sla", version, about)]
struct Cli {
    /// File containing the stream events, one JSON object per line
    #[arg(long = "input_file")]
    input_file: Option<PathBuf>,
    /// Number of past minutes averaged for each output minute [default: 10]
    #[arg(long = "window_size", allow_negative_numbers = true)]
    window_size: Option<i64>,
    /// Output file, "-" for stdout [default: output]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Pipeline TOML file; flags given on the command line take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write Prometheus text metrics here after a successful run
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let base = match &cli.config {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading config {}", path.display()))?;
            PipelineConfig::from_toml_str(&text)?
        }
        None => PipelineConfig::default(),
    };
    let cfg = resolve_config(&cli, base);
    cfg.validate()?;
    let window = cfg.window_size()?;
    let input = cfg
        .source
        .path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("input_file must be set"))?;
    info!(input_file = %input.display(), window_size = window.minutes(), "computing moving average");

    let sink = if cfg.sink_is_stdout() {
        FileSink::stdout()
    } else {
        FileSink::file(&cfg.sink.path)
    };
    let mut exec = Executor::new();
    exec.source(FileSource::new(&input))
        .operator(MovingAverage::new(window))
        .sink(sink);
    exec.run()
        .await
        .with_context(|| format!("processing {}", input.display()))?;

    if let Some(path) = &cli.metrics_file {
        tokio::fs::write(path, sla_core::metrics::render_prometheus())
            .await
            .with_context(|| format!("writing metrics {}", path.display()))?;
    }
    Ok(())
}

/// Overlays command-line flags on a config loaded from file (or the defaults).
fn resolve_config(cli: &Cli, mut cfg: PipelineConfig) -> PipelineConfig {
    if let Some(p) = &cli.input_file {
        cfg.source.path = Some(p.clone());
    }
    if let Some(w) = cli.window_size {
        cfg.window.size = w.to_string();
    }
    if let Some(o) = &cli.output {
        cfg.sink.path = o.clone();
    }
    cfg
}
