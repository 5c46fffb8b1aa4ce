//! Bar representation and bar-sequence validation.
//!
//! One concrete bar type serves every period; the period travels alongside
//! the sequence instead of being baked into the type.

use crate::domain::error::KlineError;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// One OHLCV record, keyed by an integer trade date (YYYYMMDD).
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub trade_date: u32,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub amount: f64,
}

impl Bar {
    /// Calendar year of the trade date.
    pub fn year(&self) -> u32 {
        self.trade_date / 10_000
    }

    /// (low + open + close + high) / 4
    pub fn average_price(&self) -> f64 {
        (self.low + self.open + self.close + self.high) / 4.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Bar aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "d" | "daily" => Ok(Period::Day),
            "week" | "w" | "weekly" => Ok(Period::Week),
            "month" | "m" | "monthly" => Ok(Period::Month),
            "year" | "y" | "yearly" => Ok(Period::Year),
            other => Err(format!("unknown period '{other}'")),
        }
    }
}

/// Convert a YYYYMMDD integer into a calendar date.
pub fn parse_trade_date(value: u32) -> Result<NaiveDate, KlineError> {
    let year = (value / 10_000) as i32;
    let month = (value / 100) % 100;
    let day = value % 100;
    NaiveDate::from_ymd_opt(year, month, day).ok_or(KlineError::InvalidTradeDate { value })
}

/// Convert a calendar date into its YYYYMMDD integer form.
pub fn to_trade_date(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// Check that every trade date is a real date and that dates strictly increase.
///
/// A violation is a caller contract breach, not something the engine recovers from.
pub fn validate_bars(bars: &[Bar]) -> Result<(), KlineError> {
    for (i, bar) in bars.iter().enumerate() {
        parse_trade_date(bar.trade_date)?;
        if i > 0 && bars[i - 1].trade_date >= bar.trade_date {
            return Err(KlineError::NonMonotonicDates {
                index: i,
                previous: bars[i - 1].trade_date,
                current: bar.trade_date,
            });
        }
    }
    Ok(())
}

/// Index of the bar carrying `trade_date`, if any.
pub fn find_trade_date(bars: &[Bar], trade_date: u32) -> Option<usize> {
    bars.binary_search_by_key(&trade_date, |b| b.trade_date).ok()
}

pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn opens(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.open).collect()
}

pub fn highs(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn lows(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.low).collect()
}

pub fn volumes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume as f64).collect()
}
