//! SQLite storage adapter for bars and oscillator rows.

use crate::domain::bar::{Bar, Period};
use crate::domain::error::KlineError;
use crate::domain::indicator::OscillatorRow;
use crate::ports::bar_port::BarPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::indicator_store_port::IndicatorStorePort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{TransactionBehavior, params};
use std::time::Duration;

const DEFAULT_POOL_SIZE: i64 = 4;
const BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> KlineError {
    KlineError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> KlineError {
    KlineError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, KlineError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| KlineError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("sqlite", "pool_size", DEFAULT_POOL_SIZE).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(|conn| conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS)));
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, KlineError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, KlineError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), KlineError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS bars (
                    symbol TEXT NOT NULL,
                    period TEXT NOT NULL,
                    trade_date INTEGER NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    amount REAL NOT NULL,
                    PRIMARY KEY (symbol, period, trade_date)
                );
                CREATE TABLE IF NOT EXISTS oscillator_rows (
                    symbol TEXT NOT NULL,
                    period TEXT NOT NULL,
                    trade_date INTEGER NOT NULL,
                    ema_fast REAL NOT NULL,
                    ema_slow REAL NOT NULL,
                    dif REAL NOT NULL,
                    dea REAL NOT NULL,
                    macd REAL NOT NULL,
                    k REAL NOT NULL,
                    d REAL NOT NULL,
                    j REAL NOT NULL,
                    PRIMARY KEY (symbol, period, trade_date)
                );",
            )
            .map_err(query_error)
    }

    pub fn insert_bars(&self, symbol: &str, period: Period, bars: &[Bar]) -> Result<(), KlineError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO bars
                    (symbol, period, trade_date, open, high, low, close, volume, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    symbol,
                    period.as_str(),
                    bar.trade_date,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    bar.amount
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }

    /// Every stored oscillator row for `symbol`, ascending.
    pub fn all_indicator_rows(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<OscillatorRow>, KlineError> {
        self.indicator_rows(symbol, period, -1)
    }

    fn indicator_rows(
        &self,
        symbol: &str,
        period: Period,
        limit: i64,
    ) -> Result<Vec<OscillatorRow>, KlineError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT trade_date, ema_fast, ema_slow, dif, dea, macd, k, d, j
                 FROM oscillator_rows
                 WHERE symbol = ?1 AND period = ?2
                 ORDER BY trade_date DESC
                 LIMIT ?3",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![symbol, period.as_str(), limit], |row| {
                Ok(OscillatorRow {
                    trade_date: row.get(0)?,
                    ema_fast: row.get(1)?,
                    ema_slow: row.get(2)?,
                    dif: row.get(3)?,
                    dea: row.get(4)?,
                    macd: row.get(5)?,
                    k: row.get(6)?,
                    d: row.get(7)?,
                    j: row.get(8)?,
                })
            })
            .map_err(query_error)?;

        let mut out = rows.collect::<Result<Vec<_>, _>>().map_err(query_error)?;
        out.reverse();
        Ok(out)
    }
}

impl BarPort for SqliteAdapter {
    fn get_bars(
        &self,
        symbol: &str,
        period: Period,
        start_date: Option<u32>,
        end_date: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<Bar>, KlineError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT trade_date, open, high, low, close, volume, amount
                 FROM bars
                 WHERE symbol = ?1 AND period = ?2 AND trade_date >= ?3 AND trade_date <= ?4
                 ORDER BY trade_date DESC
                 LIMIT ?5",
            )
            .map_err(query_error)?;

        let limit = limit.map_or(-1, |n| n as i64);
        let rows = stmt
            .query_map(
                params![
                    symbol,
                    period.as_str(),
                    start_date.unwrap_or(0),
                    end_date.unwrap_or(u32::MAX),
                    limit
                ],
                |row| {
                    Ok(Bar {
                        trade_date: row.get(0)?,
                        open: row.get(1)?,
                        high: row.get(2)?,
                        low: row.get(3)?,
                        close: row.get(4)?,
                        volume: row.get(5)?,
                        amount: row.get(6)?,
                    })
                },
            )
            .map_err(query_error)?;

        let mut bars = rows.collect::<Result<Vec<_>, _>>().map_err(query_error)?;
        bars.reverse();
        Ok(bars)
    }

    fn list_symbols(&self, period: Period) -> Result<Vec<String>, KlineError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM bars WHERE period = ?1 ORDER BY symbol")
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![period.as_str()], |row| row.get(0))
            .map_err(query_error)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }
}

impl IndicatorStorePort for SqliteAdapter {
    fn get_last_indicator_rows(
        &self,
        symbol: &str,
        period: Period,
        n: usize,
    ) -> Result<Vec<OscillatorRow>, KlineError> {
        self.indicator_rows(symbol, period, n as i64)
    }

    fn upsert_indicator_rows(
        &self,
        symbol: &str,
        period: Period,
        rows: &[OscillatorRow],
    ) -> Result<(), KlineError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_error)?;

        for row in rows {
            tx.execute(
                "INSERT INTO oscillator_rows
                    (symbol, period, trade_date, ema_fast, ema_slow, dif, dea, macd, k, d, j)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT (symbol, period, trade_date) DO UPDATE SET
                    ema_fast = excluded.ema_fast,
                    ema_slow = excluded.ema_slow,
                    dif = excluded.dif,
                    dea = excluded.dea,
                    macd = excluded.macd,
                    k = excluded.k,
                    d = excluded.d,
                    j = excluded.j",
                params![
                    symbol,
                    period.as_str(),
                    row.trade_date,
                    row.ema_fast,
                    row.ema_slow,
                    row.dif,
                    row.dea,
                    row.macd,
                    row.k,
                    row.d,
                    row.j
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }
}
