//! Batch recompute over many symbols.
//!
//! Symbols are independent, so each one runs as its own task on a private
//! rayon pool. Cancellation is checked before a symbol starts; a symbol that
//! is already running finishes. One symbol failing is logged and recorded
//! and never stops the others.

use crate::domain::bar::{Bar, Period};
use crate::domain::engine::IndicatorEngine;
use crate::domain::error::KlineError;
use crate::domain::incremental::{RecomputeMode, TAIL_ROWS, WindowFit, window_fit};
use crate::domain::indicator::OscillatorRow;
use crate::ports::bar_port::BarPort;
use crate::ports::indicator_store_port::IndicatorStorePort;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub period: Period,
    pub workers: usize,
    /// Most recent bars to load when resuming; `None` loads the whole
    /// history. A full recompute always reads the whole history.
    pub history_limit: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            period: Period::Day,
            workers: DEFAULT_WORKERS,
            history_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolStatus {
    Updated { rows: usize, mode: RecomputeMode },
    Failed { reason: String },
    /// Cancelled before the symbol started.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub status: SymbolStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One entry per requested symbol, in request order.
    pub outcomes: Vec<SymbolOutcome>,
}

impl BatchReport {
    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, SymbolStatus::Updated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SymbolStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, SymbolStatus::Skipped))
    }

    pub fn outcome(&self, symbol: &str) -> Option<&SymbolStatus> {
        self.outcomes
            .iter()
            .find(|o| o.symbol == symbol)
            .map(|o| &o.status)
    }

    fn count(&self, pred: impl Fn(&SymbolStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Fetch, recompute and persist one symbol. Returns rows written and mode.
pub fn process_symbol<B, S>(
    engine: &IndicatorEngine,
    bar_port: &B,
    store: &S,
    symbol: &str,
    config: &BatchConfig,
) -> Result<(usize, RecomputeMode), KlineError>
where
    B: BarPort + ?Sized,
    S: IndicatorStorePort + ?Sized,
{
    let prior = store.get_last_indicator_rows(symbol, config.period, TAIL_ROWS)?;
    let bars = load_window(engine, bar_port, symbol, config, &prior)?;
    if bars.is_empty() {
        return Err(KlineError::NoData {
            symbol: symbol.to_string(),
        });
    }
    let result = engine.compute_incremental(&bars, &prior)?;
    store.upsert_indicator_rows(symbol, config.period, &result.rows)?;
    debug!(
        symbol,
        bars = bars.len(),
        rows = result.rows.len(),
        signals = result.signals().len(),
        "symbol recomputed"
    );
    Ok((result.rows.len(), result.mode))
}

/// The most recent `history_limit` bars, widened when the fold needs older
/// ones.
fn load_window<B>(
    engine: &IndicatorEngine,
    bar_port: &B,
    symbol: &str,
    config: &BatchConfig,
    prior: &[OscillatorRow],
) -> Result<Vec<Bar>, KlineError>
where
    B: BarPort + ?Sized,
{
    let Some(limit) = config.history_limit else {
        return bar_port.get_bars(symbol, config.period, None, None, None);
    };
    let window = bar_port.get_bars(symbol, config.period, None, None, Some(limit))?;
    if window.len() < limit {
        return Ok(window);
    }
    match window_fit(&window, prior, &engine.params().kdj) {
        WindowFit::Enough => Ok(window),
        WindowFit::Extend(missing) => {
            debug!(symbol, missing, "widening bar window for the KDJ lookback");
            bar_port.get_bars(symbol, config.period, None, None, Some(limit + missing))
        }
        WindowFit::WholeHistory => {
            debug!(symbol, "full recompute reads the whole bar history");
            bar_port.get_bars(symbol, config.period, None, None, None)
        }
    }
}

pub fn run_batch<B, S>(
    engine: &IndicatorEngine,
    bar_port: &B,
    store: &S,
    symbols: &[String],
    config: &BatchConfig,
    cancel: &AtomicBool,
) -> Result<BatchReport, KlineError>
where
    B: BarPort + Sync + ?Sized,
    S: IndicatorStorePort + Sync + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .map_err(|e| KlineError::WorkerPool {
            reason: e.to_string(),
        })?;

    info!(
        symbols = symbols.len(),
        workers = config.workers,
        period = %config.period,
        "batch recompute started"
    );

    let outcomes: Vec<SymbolOutcome> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| {
                if cancel.load(Ordering::Relaxed) {
                    return SymbolOutcome {
                        symbol: symbol.clone(),
                        status: SymbolStatus::Skipped,
                    };
                }
                let status = match process_symbol(engine, bar_port, store, symbol, config) {
                    Ok((rows, mode)) => SymbolStatus::Updated { rows, mode },
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "symbol recompute failed");
                        SymbolStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                SymbolOutcome {
                    symbol: symbol.clone(),
                    status,
                }
            })
            .collect()
    });

    let report = BatchReport { outcomes };
    info!(
        updated = report.updated(),
        failed = report.failed(),
        skipped = report.skipped(),
        "batch recompute finished"
    );
    Ok(report)
}
