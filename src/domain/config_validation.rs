//! Configuration validation.
//!
//! Validates config fields and builds the engine and batch settings from them.

use crate::domain::bar::Period;
use crate::domain::batch::{BatchConfig, DEFAULT_WORKERS};
use crate::domain::engine::EngineParams;
use crate::domain::error::KlineError;
use crate::domain::indicator::kdj::{self, KdjParams};
use crate::domain::indicator::macd::{self, MacdParams};
use crate::ports::config_port::ConfigPort;

pub fn build_engine_params(config: &dyn ConfigPort) -> Result<EngineParams, KlineError> {
    let fast = positive(config, "engine", "macd_fast", macd::DEFAULT_FAST)?;
    let slow = positive(config, "engine", "macd_slow", macd::DEFAULT_SLOW)?;
    let signal = positive(config, "engine", "macd_signal", macd::DEFAULT_SIGNAL)?;
    if fast >= slow {
        return Err(KlineError::ConfigInvalid {
            section: "engine".to_string(),
            key: "macd_fast".to_string(),
            reason: format!("macd_fast ({fast}) must be less than macd_slow ({slow})"),
        });
    }
    Ok(EngineParams {
        macd: MacdParams { fast, slow, signal },
        kdj: KdjParams {
            n: positive(config, "engine", "kdj_n", kdj::DEFAULT_N)?,
            m1: positive(config, "engine", "kdj_m1", kdj::DEFAULT_M1)?,
            m2: positive(config, "engine", "kdj_m2", kdj::DEFAULT_M2)?,
        },
    })
}

pub fn build_batch_config(config: &dyn ConfigPort) -> Result<BatchConfig, KlineError> {
    let workers = positive(config, "batch", "workers", DEFAULT_WORKERS)?;
    let period = match config.get_string("batch", "period") {
        Some(value) => value.parse::<Period>().map_err(|reason| KlineError::ConfigInvalid {
            section: "batch".to_string(),
            key: "period".to_string(),
            reason,
        })?,
        None => Period::Day,
    };
    let limit = config.get_int("batch", "history_limit", 0);
    if limit < 0 {
        return Err(KlineError::ConfigInvalid {
            section: "batch".to_string(),
            key: "history_limit".to_string(),
            reason: "history_limit must be non-negative (0 = unlimited)".to_string(),
        });
    }
    Ok(BatchConfig {
        period,
        workers,
        history_limit: (limit > 0).then_some(limit as usize),
    })
}

/// `[batch] symbols` as a list, or `None` when unset or empty.
pub fn configured_symbols(config: &dyn ConfigPort) -> Option<Vec<String>> {
    let raw = config.get_string("batch", "symbols")?;
    let symbols: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    (!symbols.is_empty()).then_some(symbols)
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, KlineError> {
    let value = config.get_int(section, key, default as i64);
    if value < 1 {
        return Err(KlineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be at least 1"),
        });
    }
    Ok(value as usize)
}
