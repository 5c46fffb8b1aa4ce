#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use kline_signals::domain::bar::{Bar, Period, to_trade_date};
use kline_signals::domain::error::KlineError;
use kline_signals::domain::indicator::OscillatorRow;
use kline_signals::ports::bar_port::BarPort;
use kline_signals::ports::indicator_store_port::IndicatorStorePort;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub const VOLUME: i64 = 1_000_000;

pub struct MockBarPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockBarPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl BarPort for MockBarPort {
    fn get_bars(
        &self,
        symbol: &str,
        _period: Period,
        start_date: Option<u32>,
        end_date: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<Bar>, KlineError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(KlineError::Database {
                reason: reason.clone(),
            });
        }
        let mut bars: Vec<Bar> = self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| start_date.is_none_or(|s| b.trade_date >= s))
            .filter(|b| end_date.is_none_or(|e| b.trade_date <= e))
            .collect();
        if let Some(n) = limit {
            let skip = bars.len().saturating_sub(n);
            bars.drain(..skip);
        }
        Ok(bars)
    }

    fn list_symbols(&self, _period: Period) -> Result<Vec<String>, KlineError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Oscillator rows kept in memory, keyed like the SQLite table.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<(String, Period), BTreeMap<u32, OscillatorRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_rows(&self, symbol: &str, period: Period) -> Vec<OscillatorRow> {
        let guard = self.rows.lock().unwrap();
        guard
            .get(&(symbol.to_string(), period))
            .map(|rows| rows.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn seed(&self, symbol: &str, period: Period, rows: &[OscillatorRow]) {
        self.upsert_indicator_rows(symbol, period, rows).unwrap();
    }
}

impl IndicatorStorePort for MemoryStore {
    fn get_last_indicator_rows(
        &self,
        symbol: &str,
        period: Period,
        n: usize,
    ) -> Result<Vec<OscillatorRow>, KlineError> {
        let rows = self.all_rows(symbol, period);
        let skip = rows.len().saturating_sub(n);
        Ok(rows[skip..].to_vec())
    }

    fn upsert_indicator_rows(
        &self,
        symbol: &str,
        period: Period,
        rows: &[OscillatorRow],
    ) -> Result<(), KlineError> {
        let mut guard = self.rows.lock().unwrap();
        let entry = guard.entry((symbol.to_string(), period)).or_default();
        for row in rows {
            entry.insert(row.trade_date, *row);
        }
        Ok(())
    }
}

/// Weekday trade dates starting on Monday 2023-01-02.
pub fn trading_dates(count: usize) -> Vec<u32> {
    let mut date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut dates = Vec::with_capacity(count);
    while dates.len() < count {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(to_trade_date(date));
        }
        date = date.succ_opt().unwrap();
    }
    dates
}

/// Bars with open = high = low = close.
pub fn flat_bars(closes: &[f64]) -> Vec<Bar> {
    trading_dates(closes.len())
        .into_iter()
        .zip(closes)
        .map(|(trade_date, &close)| Bar {
            trade_date,
            open: close,
            high: close,
            low: close,
            close,
            volume: VOLUME,
            amount: close * VOLUME as f64,
        })
        .collect()
}

/// `count` closes moving linearly from `from` to `to`.
pub fn linear_closes(count: usize, from: f64, to: f64) -> Vec<f64> {
    let step = if count > 1 {
        (to - from) / (count - 1) as f64
    } else {
        0.0
    };
    (0..count).map(|i| from + step * i as f64).collect()
}

pub fn rising_bars(count: usize) -> Vec<Bar> {
    flat_bars(&linear_closes(count, 10.0, 13.0))
}

pub fn falling_bars(count: usize) -> Vec<Bar> {
    flat_bars(&linear_closes(count, 13.0, 10.0))
}

/// Oscillating bars with a small intraday range, for exercising every pipeline.
pub fn wave_bars(count: usize) -> Vec<Bar> {
    trading_dates(count)
        .into_iter()
        .enumerate()
        .map(|(i, trade_date)| {
            let close = 15.0 + 2.5 * (i as f64 * 0.2).sin();
            let open = 15.0 + 2.5 * ((i as f64 - 0.5) * 0.2).sin();
            Bar {
                trade_date,
                open,
                high: open.max(close) + 0.3,
                low: open.min(close) - 0.3,
                close,
                volume: VOLUME + (i as i64 % 7) * 50_000,
                amount: close * VOLUME as f64,
            }
        })
        .collect()
}
