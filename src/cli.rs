//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bar::Period;
use crate::domain::batch::{BatchReport, SymbolStatus};
use crate::domain::config_validation::{build_batch_config, build_engine_params, configured_symbols};
use crate::domain::engine::IndicatorEngine;
use crate::domain::error::KlineError;
use crate::domain::signal::SignalEvent;
use crate::logging::{self, DEFAULT_FILTER, LogFormat};
use crate::ports::bar_port::BarPort;
use crate::ports::config_port::ConfigPort;

/// Exit code when every requested symbol failed.
const ALL_FAILED_EXIT: u8 = 5;

#[derive(Parser, Debug)]
#[command(name = "kline-signals", about = "Technical indicator and signal engine for OHLCV bars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recompute and persist oscillator rows for many symbols
    Recompute {
        #[arg(short, long)]
        config: PathBuf,
        /// Restrict the batch to these symbols (repeatable)
        #[arg(long)]
        symbol: Vec<String>,
    },
    /// Print the signal events of one symbol
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        /// day, week, month or year; defaults to `[batch] period`
        #[arg(long)]
        period: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let (Command::Recompute { config, .. } | Command::Signals { config, .. }) = &cli.command;
    let adapter = match load_config(config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = init_logging_from(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match cli.command {
        Command::Recompute { symbol, .. } => match run_recompute(&adapter, &symbol) {
            Ok(report) => {
                print_batch_summary(&report);
                if report.updated() == 0 && report.failed() > 0 {
                    ExitCode::from(ALL_FAILED_EXIT)
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        },
        Command::Signals { symbol, period, .. } => {
            match run_signals(&adapter, &symbol, period.as_deref()) {
                Ok(events) => {
                    for event in &events {
                        println!("{}", format_signal(event));
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    (&e).into()
                }
            }
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, KlineError> {
    FileConfigAdapter::from_file(path)
}

/// Reads `[logging] format` and `[logging] filter`.
pub fn logging_settings(config: &dyn ConfigPort) -> Result<(LogFormat, String), KlineError> {
    let format = match config.get_string("logging", "format") {
        Some(value) => value
            .parse::<LogFormat>()
            .map_err(|reason| KlineError::ConfigInvalid {
                section: "logging".to_string(),
                key: "format".to_string(),
                reason,
            })?,
        None => LogFormat::default(),
    };
    let filter = config
        .get_string("logging", "filter")
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());
    Ok((format, filter))
}

fn init_logging_from(config: &dyn ConfigPort) -> Result<(), KlineError> {
    let (format, filter) = logging_settings(config)?;
    logging::init_logging(format, &filter);
    Ok(())
}

/// Bar source chosen by `[source] kind`: `sqlite` (default) or `csv`.
pub fn open_bar_source(config: &dyn ConfigPort) -> Result<Box<dyn BarPort + Sync>, KlineError> {
    let kind = config
        .get_string("source", "kind")
        .unwrap_or_else(|| "sqlite".to_string());
    match kind.trim().to_lowercase().as_str() {
        "csv" => {
            let dir = config
                .get_string("csv", "dir")
                .ok_or_else(|| KlineError::ConfigMissing {
                    section: "csv".into(),
                    key: "dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?,
        )),
        other => Err(KlineError::ConfigInvalid {
            section: "source".into(),
            key: "kind".into(),
            reason: format!("unsupported bar source '{other}'"),
        }),
    }
}

/// Command-line symbols win, then `[batch] symbols`, then every symbol the
/// bar source knows for the period.
pub fn resolve_symbols(
    cli_symbols: &[String],
    config: &dyn ConfigPort,
    bar_port: &dyn BarPort,
    period: Period,
) -> Result<Vec<String>, KlineError> {
    let symbols: Vec<String> = cli_symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if !symbols.is_empty() {
        return Ok(symbols);
    }
    if let Some(symbols) = configured_symbols(config) {
        return Ok(symbols);
    }
    bar_port.list_symbols(period)
}

pub fn run_recompute(
    config: &dyn ConfigPort,
    cli_symbols: &[String],
) -> Result<BatchReport, KlineError> {
    let engine = IndicatorEngine::new(build_engine_params(config)?);
    let batch_config = build_batch_config(config)?;
    let bar_port = open_bar_source(config)?;
    let symbols = resolve_symbols(cli_symbols, config, bar_port.as_ref(), batch_config.period)?;
    if symbols.is_empty() {
        eprintln!("warning: no symbols to recompute");
        return Ok(BatchReport::default());
    }

    #[cfg(feature = "sqlite")]
    {
        let store = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
        let cancel = std::sync::atomic::AtomicBool::new(false);
        crate::domain::batch::run_batch(
            &engine,
            bar_port.as_ref(),
            &store,
            &symbols,
            &batch_config,
            &cancel,
        )
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&engine, &symbols);
        Err(KlineError::ConfigInvalid {
            section: "sqlite".into(),
            key: "path".into(),
            reason: "sqlite feature is required for recompute".into(),
        })
    }
}

pub fn run_signals(
    config: &dyn ConfigPort,
    symbol: &str,
    period: Option<&str>,
) -> Result<Vec<SignalEvent>, KlineError> {
    let engine = IndicatorEngine::new(build_engine_params(config)?);
    let batch_config = build_batch_config(config)?;
    let period = match period {
        Some(p) => p.parse::<Period>().map_err(|reason| KlineError::ConfigInvalid {
            section: "cli".into(),
            key: "period".into(),
            reason,
        })?,
        None => batch_config.period,
    };
    let symbol = symbol.trim().to_uppercase();
    let bar_port = open_bar_source(config)?;
    let bars = bar_port.get_bars(&symbol, period, None, None, batch_config.history_limit)?;
    if bars.is_empty() {
        return Err(KlineError::NoData { symbol });
    }
    let report = engine.compute(&bars, period)?;
    Ok(report.signals())
}

/// One event per line: `YYYYMMDD category side`.
pub fn format_signal(event: &SignalEvent) -> String {
    format!(
        "{} {} {}",
        event.trade_date,
        event.category,
        event.category.side()
    )
}

fn print_batch_summary(report: &BatchReport) {
    eprintln!(
        "Recompute finished: {} updated, {} failed, {} skipped",
        report.updated(),
        report.failed(),
        report.skipped()
    );
    for outcome in &report.outcomes {
        if let SymbolStatus::Failed { reason } = &outcome.status {
            eprintln!("  {}: {}", outcome.symbol, reason);
        }
    }
}
