//! Oscillator state persistence port.

use crate::domain::bar::Period;
use crate::domain::error::KlineError;
use crate::domain::indicator::OscillatorRow;

pub trait IndicatorStorePort {
    /// The newest `n` rows for `symbol`, in ascending trade-date order.
    fn get_last_indicator_rows(
        &self,
        symbol: &str,
        period: Period,
        n: usize,
    ) -> Result<Vec<OscillatorRow>, KlineError>;

    /// Insert or replace rows keyed by (symbol, period, trade date).
    ///
    /// Writing the same rows twice leaves the store unchanged.
    fn upsert_indicator_rows(
        &self,
        symbol: &str,
        period: Period,
        rows: &[OscillatorRow],
    ) -> Result<(), KlineError>;
}
