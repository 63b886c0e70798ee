//! rename-expr: rename files by formula.
//!
//! Usage: rename-expr [--config FILE] [--dry-run] FORMULA PATH...

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rename_expr::{warmup_operator_tables, BatchExecutor, Expression, LocalFileSystem, RenamerConfig};

const USAGE: &str = "usage: rename-expr [--config FILE] [--dry-run] FORMULA PATH...";

struct Args {
    config: Option<PathBuf>,
    dry_run: bool,
    formula: String,
    paths: Vec<String>,
}

fn parse_args() -> Result<Option<Args>> {
    let mut config = None;
    let mut dry_run = false;
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--dry-run" | "-n" => dry_run = true,
            "--config" => {
                let path = args.next().context("--config needs a file argument")?;
                config = Some(PathBuf::from(path));
            }
            "--" => {
                positional.extend(args.by_ref());
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(formula) = positional.next() else {
        bail!("missing formula\n{USAGE}");
    };
    Ok(Some(Args {
        config,
        dry_run,
        formula,
        paths: positional.collect(),
    }))
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let Some(args) = parse_args()? else {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    };

    let config = match &args.config {
        Some(path) => RenamerConfig::load_from(path)?,
        None => RenamerConfig::load()?,
    };

    // RUST_LOG wins over the configured filter.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("Invalid log_filter {:?}", config.log_filter))?,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    warmup_operator_tables();

    let formula = Expression::parse(&args.formula)
        .with_context(|| format!("Failed to parse formula {:?}", args.formula))?;

    let executor = BatchExecutor::new(LocalFileSystem::from_config(&config));
    for value in formula.values() {
        if !executor.append_value(value.clone()) {
            bail!("executor rejected formula value {value}");
        }
    }
    for path in args.paths {
        if !executor.append_path(path.as_str()) {
            bail!("executor rejected path {path}");
        }
    }
    tracing::debug!(formula = ?executor.render_expression(), "formula loaded");

    if args.dry_run {
        let Some(preview) = executor.preview() else {
            bail!("executor busy");
        };
        return match preview {
            Ok(plans) => {
                for plan in plans {
                    println!("{} -> {}", plan.from.display(), plan.to.display());
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{err}");
                Ok(ExitCode::FAILURE)
            }
        };
    }

    if !executor.run() {
        bail!("a batch is already running");
    }
    let interval = Duration::from_millis(config.poll_interval_ms);
    while !executor.take_result_ready_flag() {
        std::thread::sleep(interval);
    }
    executor.join();

    println!("{}", executor.poll_result());
    let success = executor
        .poll_outcome()
        .is_some_and(|outcome| outcome.is_success());
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
