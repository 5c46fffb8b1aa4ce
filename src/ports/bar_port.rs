//! Bar retrieval port.

use crate::domain::bar::{Bar, Period};
use crate::domain::error::KlineError;

pub trait BarPort {
    /// Bars for `symbol` in ascending trade-date order.
    ///
    /// `start_date`/`end_date` bound the range inclusively; `limit` keeps the
    /// most recent `limit` bars inside it.
    fn get_bars(
        &self,
        symbol: &str,
        period: Period,
        start_date: Option<u32>,
        end_date: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<Bar>, KlineError>;

    fn list_symbols(&self, period: Period) -> Result<Vec<String>, KlineError>;
}
