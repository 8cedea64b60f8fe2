//! reactor-perf entry point: CLI wiring, ingestion, and output export.

use std::path::Path;
use std::process::ExitCode;

use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reactor_perf::cli::{self, CliOptions};
use reactor_perf::config::PipelineConfig;
use reactor_perf::error::PipelineError;
use reactor_perf::io::export::{export_json, export_metrics_csv};
use reactor_perf::io::observations::load_observations;
use reactor_perf::io::registry::load_registry;
use reactor_perf::pipeline::{self, PipelineInput};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves the configuration: `--config` file (or defaults), then flags.
fn load_config(opts: &CliOptions) -> Result<PipelineConfig, PipelineError> {
    let mut cfg = match &opts.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };
    opts.apply(&mut cfg);
    Ok(cfg)
}

fn run(cfg: &PipelineConfig) -> Result<(), PipelineError> {
    let as_of = cfg.as_of.unwrap_or_else(|| Local::now().date_naive());

    let registry = load_registry(&cfg.inputs.registry, as_of)?;
    let observations = load_observations(&cfg.inputs.observations)?;

    let output = pipeline::run(
        PipelineInput {
            registry: registry.records,
            observations: observations.records,
        },
        &cfg.metrics,
        cfg.merged_aliases(),
    )?;
    let summary = output.summarize();

    export_json(
        &cfg.output.dir,
        &summary.reconciliation.entries,
        &output.metrics,
        &summary.fleet,
    )?;
    if let Some(path) = &cfg.output.metrics_csv {
        write_metrics_csv(&output, path)?;
    }

    println!("{}", summary.fleet);
    let report = &summary.reconciliation.report;
    if !report.unmatched_names.is_empty() {
        println!();
        println!("Unmatched registry entries:");
        for name in &report.unmatched_names {
            println!("  {name}");
        }
    }
    Ok(())
}

fn write_metrics_csv(output: &pipeline::PipelineOutput, path: &Path) -> Result<(), PipelineError> {
    export_metrics_csv(&output.metrics, path).map_err(|e| PipelineError::io(path, e))?;
    info!(path = %path.display(), units = output.metrics.len(), "wrote metrics CSV");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            return ExitCode::FAILURE;
        }
    };
    if opts.help {
        cli::print_usage();
        return ExitCode::SUCCESS;
    }

    let cfg = match load_config(&opts) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        return ExitCode::FAILURE;
    }

    match run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
