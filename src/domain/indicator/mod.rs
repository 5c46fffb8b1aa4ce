//! Stateful oscillators (MACD, KDJ) and the ratio oscillators built on the
//! rolling primitives.
//!
//! MACD and KDJ are recurrences: each row depends on the row before it, so
//! the persisted [`OscillatorRow`] carries enough state to resume the fold
//! from any bar.

pub mod kdj;
pub mod macd;
pub mod rsi;

use crate::domain::bar::Bar;
use crate::domain::series::cross;
use crate::domain::signal::{SignalCategory, SignalEvent};
use kdj::{KdjParams, KdjState};
use macd::{MacdParams, MacdState};

/// One bar of oscillator output, keyed by trade date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorRow {
    pub trade_date: u32,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub dif: f64,
    pub dea: f64,
    pub macd: f64,
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

impl OscillatorRow {
    pub fn macd_state(&self) -> MacdState {
        MacdState {
            ema_fast: self.ema_fast,
            ema_slow: self.ema_slow,
            dea: self.dea,
        }
    }

    pub fn kdj_state(&self) -> KdjState {
        KdjState {
            k: self.k,
            d: self.d,
        }
    }
}

/// Fold the oscillators over `bars[start..]`.
///
/// `seed` is the row of bar `start - 1`; without it the first folded bar
/// initialises fresh state. The returned rows cover `bars[start..]` only.
pub fn fold_rows(
    bars: &[Bar],
    start: usize,
    seed: Option<&OscillatorRow>,
    macd_params: &MacdParams,
    kdj_params: &KdjParams,
) -> Vec<OscillatorRow> {
    let initial = seed.map(|row| (row.macd_state(), row.kdj_state()));
    (start..bars.len())
        .scan(initial, |state, i| {
            let bar = &bars[i];
            let (macd_state, macd_point, kdj_state, kdj_point) = match state {
                None => {
                    let (m, mp) = MacdState::seed(bar.close);
                    let (k, kp) = KdjState::seed();
                    (m, mp, k, kp)
                }
                Some((m, k)) => {
                    let (m, mp) = m.next(bar.close, macd_params);
                    let (k, kp) = k.next(kdj::rsv(bars, i, kdj_params.n), kdj_params);
                    (m, mp, k, kp)
                }
            };
            *state = Some((macd_state, kdj_state));
            Some(OscillatorRow {
                trade_date: bar.trade_date,
                ema_fast: macd_state.ema_fast,
                ema_slow: macd_state.ema_slow,
                dif: macd_point.dif,
                dea: macd_point.dea,
                macd: macd_point.macd,
                k: kdj_point.k,
                d: kdj_point.d,
                j: kdj_point.j,
            })
        })
        .collect()
}

/// MACD and KDJ crossings over `rows`.
///
/// When `previous` is given it is treated as the row immediately before
/// `rows[0]`, so a crossing on the first recomputed bar is still detected.
pub fn cross_signals(rows: &[OscillatorRow], previous: Option<&OscillatorRow>) -> Vec<SignalEvent> {
    let offset = usize::from(previous.is_some());
    let all: Vec<&OscillatorRow> = previous.into_iter().chain(rows.iter()).collect();
    let dif: Vec<f64> = all.iter().map(|r| r.dif).collect();
    let dea: Vec<f64> = all.iter().map(|r| r.dea).collect();
    let k: Vec<f64> = all.iter().map(|r| r.k).collect();
    let d: Vec<f64> = all.iter().map(|r| r.d).collect();

    let checks = [
        (cross(&dif, &dea), SignalCategory::MacdGoldenCross),
        (cross(&dea, &dif), SignalCategory::MacdDeathCross),
        (cross(&k, &d), SignalCategory::KdjGoldenCross),
        (cross(&d, &k), SignalCategory::KdjDeathCross),
    ];

    let mut events = Vec::new();
    for (i, row) in all.iter().enumerate().skip(offset) {
        for (flags, category) in &checks {
            if flags[i] {
                events.push(SignalEvent {
                    trade_date: row.trade_date,
                    category: *category,
                });
            }
        }
    }
    events
}
