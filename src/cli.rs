//! Command-line parsing for the `reactor-perf` binary.

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::config::PipelineConfig;

/// Parsed flags. Every field overrides the matching config value when set.
#[derive(Debug, Default, PartialEq)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub observations: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub metrics_csv: Option<PathBuf>,
    pub as_of: Option<NaiveDate>,
    pub help: bool,
}

impl CliOptions {
    /// Applies the flags on top of a loaded configuration.
    pub fn apply(&self, cfg: &mut PipelineConfig) {
        if let Some(path) = &self.registry {
            cfg.inputs.registry = path.clone();
        }
        if let Some(path) = &self.observations {
            cfg.inputs.observations = path.clone();
        }
        if let Some(dir) = &self.out_dir {
            cfg.output.dir = dir.clone();
        }
        if let Some(path) = &self.metrics_csv {
            cfg.output.metrics_csv = Some(path.clone());
        }
        if self.as_of.is_some() {
            cfg.as_of = self.as_of;
        }
    }
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns a message describing the first bad argument.
pub fn parse_args() -> Result<CliOptions, String> {
    parse_args_from(env::args().skip(1))
}

/// Parses an argument list (without the program name).
///
/// # Errors
///
/// Returns a message describing the first bad argument.
pub fn parse_args_from<I>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                opts.help = true;
                return Ok(opts);
            }
            "--config" => set_once(&mut opts.config, flag, path_value(&args, &mut i, flag)?)?,
            "--registry" => set_once(&mut opts.registry, flag, path_value(&args, &mut i, flag)?)?,
            "--observations" => {
                set_once(&mut opts.observations, flag, path_value(&args, &mut i, flag)?)?;
            }
            "--out-dir" => set_once(&mut opts.out_dir, flag, path_value(&args, &mut i, flag)?)?,
            "--metrics-csv" => {
                set_once(&mut opts.metrics_csv, flag, path_value(&args, &mut i, flag)?)?;
            }
            "--as-of" => {
                let raw = next_value(&args, &mut i, flag, "a YYYY-MM-DD date")?;
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| format!("--as-of value \"{raw}\" is not a YYYY-MM-DD date"))?;
                set_once(&mut opts.as_of, flag, date)?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(opts)
}

fn next_value<'a>(
    args: &'a [String],
    i: &mut usize,
    flag: &str,
    expected: &str,
) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag} (expected {expected})"))
}

fn path_value(args: &[String], i: &mut usize, flag: &str) -> Result<PathBuf, String> {
    next_value(args, i, flag, "a path").map(PathBuf::from)
}

fn set_once<T>(slot: &mut Option<T>, flag: &str, value: T) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

pub fn print_usage() {
    eprintln!("reactor-perf: derive reactor performance metrics and fleet statistics");
    eprintln!();
    eprintln!("Usage: reactor-perf [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load settings from a TOML file");
    eprintln!("  --registry <path>        Master registry CSV");
    eprintln!("  --observations <path>    Daily power status CSV");
    eprintln!("  --out-dir <path>         Directory for the JSON outputs");
    eprintln!("  --metrics-csv <path>     Also write per-unit metrics as CSV");
    eprintln!("  --as-of <YYYY-MM-DD>     Reference date for registry ages (default: today)");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Flags override values from --config. Set RUST_LOG to change log verbosity.");
}
