//! MACD (Moving Average Convergence Divergence) as a bar-by-bar recurrence.
//!
//! DIF = EMA(close, fast) - EMA(close, slow)
//! DEA = EMA(DIF, signal)
//! MACD = 2 * (DIF - DEA)
//!
//! Default parameters: fast=12, slow=26, signal=9. The first bar seeds both
//! EMAs with its close and zeroes DIF/DEA/MACD.

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

/// The carried state between bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdState {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub dea: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub dif: f64,
    pub dea: f64,
    pub macd: f64,
}

/// value·2/(p+1) + prev·(p−1)/(p+1)
fn smooth(value: f64, prev: f64, period: usize) -> f64 {
    let p = period.max(1) as f64;
    value * 2.0 / (p + 1.0) + prev * (p - 1.0) / (p + 1.0)
}

impl MacdState {
    pub fn seed(close: f64) -> (Self, MacdPoint) {
        (
            Self {
                ema_fast: close,
                ema_slow: close,
                dea: 0.0,
            },
            MacdPoint {
                dif: 0.0,
                dea: 0.0,
                macd: 0.0,
            },
        )
    }

    pub fn next(&self, close: f64, params: &MacdParams) -> (Self, MacdPoint) {
        let ema_fast = smooth(close, self.ema_fast, params.fast);
        let ema_slow = smooth(close, self.ema_slow, params.slow);
        let dif = ema_fast - ema_slow;
        let dea = smooth(dif, self.dea, params.signal);
        (
            Self {
                ema_fast,
                ema_slow,
                dea,
            },
            MacdPoint {
                dif,
                dea,
                macd: 2.0 * (dif - dea),
            },
        )
    }
}

/// Full-history MACD over a close series.
pub fn calculate_macd(closes: &[f64], params: &MacdParams) -> Vec<MacdPoint> {
    closes
        .iter()
        .scan(None::<MacdState>, |state, &close| {
            let (next, point) = match state {
                None => MacdState::seed(close),
                Some(prev) => prev.next(close, params),
            };
            *state = Some(next);
            Some(point)
        })
        .collect()
}
