//! CSV file bar adapter.
//!
//! One file per symbol and period, named `{SYMBOL}_{period}.csv`, with the
//! header `trade_date,open,high,low,close,volume,amount`.

use crate::domain::bar::{Bar, Period};
use crate::domain::error::KlineError;
use crate::ports::bar_port::BarPort;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, period: Period) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, period))
    }
}

fn field<T: FromStr>(record: &StringRecord, index: usize, name: &str) -> Result<T, KlineError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| KlineError::Database {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e: T::Err| KlineError::Database {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_record(record: &StringRecord) -> Result<Bar, KlineError> {
    Ok(Bar {
        trade_date: field(record, 0, "trade_date")?,
        open: field(record, 1, "open")?,
        high: field(record, 2, "high")?,
        low: field(record, 3, "low")?,
        close: field(record, 4, "close")?,
        volume: field(record, 5, "volume")?,
        amount: field(record, 6, "amount")?,
    })
}

impl BarPort for CsvAdapter {
    fn get_bars(
        &self,
        symbol: &str,
        period: Period,
        start_date: Option<u32>,
        end_date: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<Bar>, KlineError> {
        let path = self.csv_path(symbol, period);
        let content = fs::read_to_string(&path).map_err(|e| KlineError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| KlineError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;
            let bar = parse_record(&record)?;
            if start_date.is_some_and(|start| bar.trade_date < start)
                || end_date.is_some_and(|end| bar.trade_date > end)
            {
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.trade_date);
        if let Some(n) = limit {
            let skip = bars.len().saturating_sub(n);
            bars.drain(..skip);
        }
        Ok(bars)
    }

    fn list_symbols(&self, period: Period) -> Result<Vec<String>, KlineError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| KlineError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", period);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| KlineError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
