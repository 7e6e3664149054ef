mod cli;
mod config;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};

use cef::ParseMetrics;
use crate::{
    cli::{Cli, Command},
    config::{InspectConfig, LogFormat, LogOutput, OutputConfig},
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Phase 1: Basic tracing so we can log during config loading
    let basic_tracing = init_tracing_basic();

    let mut config = InspectConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    config.validate()
        .context("Configuration validation failed")?;

    if let Some(format) = cli.output {
        config.output.format = format;
    }

    // Phase 2: Re-initialize tracing with config (format, level, output)
    drop(basic_tracing);
    init_tracing_from_config(&config)?;

    debug!(?config, "Configuration loaded");

    let metrics = ParseMetrics::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = match cli.command {
        Command::Parse { files, escape, no_reconstruct } => {
            config.output.escape |= escape;
            config.output.show_reconstructed &= !no_reconstruct;
            run_parse(&mut out, &files, &config.output, &metrics)
        }
        Command::Validate { files } => run_validate(&mut out, &files, &config.output, &metrics),
        Command::Line { line } => cef::parse_observed(&line, &metrics)
            .context("Failed to parse line")
            .and_then(|event| report::write_event(&mut out, 1, &event, &config.output)),
    };

    if config.output.summary {
        report::write_summary(&mut out, &metrics.snapshot(), config.output.format)?;
    }
    out.flush()?;

    if let Err(e) = &outcome {
        error!("{:#}", e);
    }
    outcome
}

/// Input name and full text, stdin when no files are given
fn read_sources(files: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), text)]);
    }

    files
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path.display().to_string(), text))
        })
        .collect()
}

fn run_parse(
    out: &mut impl Write,
    files: &[PathBuf],
    output: &OutputConfig,
    metrics: &ParseMetrics,
) -> Result<()> {
    let mut index = 0;

    for (name, text) in read_sources(files)? {
        let events = cef::parse_log_observed(&text, metrics)
            .with_context(|| format!("Failed to parse {}", name))?;
        info!(source = %name, events = events.len(), "Parsed CEF log");

        for event in &events {
            index += 1;
            report::write_event(out, index, event, output)?;
        }
    }

    Ok(())
}

fn run_validate(
    out: &mut impl Write,
    files: &[PathBuf],
    output: &OutputConfig,
    metrics: &ParseMetrics,
) -> Result<()> {
    let mut checked = 0;
    let mut invalid = 0;

    for (name, text) in read_sources(files)? {
        for (idx, line) in cef::log_lines(&text).enumerate() {
            let result = cef::parse_observed(line, metrics);
            if let Err(e) = &result {
                debug!(source = %name, line = idx + 1, error = %e, "Invalid CEF line");
                invalid += 1;
            }
            checked += 1;
            report::write_validation(out, idx + 1, line, &result, output.format)?;
        }
    }

    info!(checked, invalid, "Validation finished");
    if invalid > 0 {
        anyhow::bail!("{} of {} lines are not valid CEF", invalid, checked);
    }

    Ok(())
}

fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,inspect=info"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Prefer RUST_LOG, fall back to the configured level.
fn init_tracing_from_config(config: &InspectConfig) -> Result<()> {
    use std::sync::Arc;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stderr) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let file = open_log_file(path)?;
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::Stderr) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_writer(io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let file = open_log_file(path)?;
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}

fn open_log_file(path: &str) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file '{}'", path))
}
