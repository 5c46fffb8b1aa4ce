//! Time-decay pressure composite.
//!
//! Two mirrored eight-stage chains. The accumulation side (AS1..AS8) looks at
//! lows pressing into the 30-bar trough while the close is at or under its
//! 58-bar average; the distribution side (AD2..AD8) does the same for highs
//! pressing the 30-bar peak above the average. Both are scaled down by a
//! fixed divisor and capped, then reported as a signed pair per trade date.
//!
//! Bars dated in or after 2038 are forced to zero by a legacy epoch gate.
//! The gate is kept so historical output stays reproducible; a warning is
//! logged whenever it zeroes anything.

use crate::domain::bar::{self, Bar};
use crate::domain::pipeline::PipelineOutcome;
use crate::domain::series::{
    abs, ema, hhv, llv, ma, max_with, min_with, ratio, ref_lag, select, sma, zip_with,
};
use tracing::warn;

pub const MIN_BARS: usize = 58;

pub const EXTREME_WINDOW: usize = 30;
pub const GATE_AVERAGE: usize = 58;
pub const SPREAD_SMOOTHING: usize = 13;
pub const DIRECTIONAL_SMOOTHING: usize = 10;
pub const RATIO_SMOOTHING: usize = 10;
pub const OUTPUT_SMOOTHING: usize = 3;
pub const MAGNITUDE_DIVISOR: f64 = 618.0;
pub const ACCUMULATION_CAP: f64 = 100.0;
pub const DISTRIBUTION_CAP: f64 = 50.0;
pub const EPOCH_GUARD_YEAR: u32 = 2038;

/// Signed pressure pair for one trade date: `buy` ≥ 0, `sell` ≤ 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureBar {
    pub trade_date: u32,
    pub buy: f64,
    pub sell: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PressureReport {
    /// AS8, bounded by 100.
    pub accumulation: Vec<f64>,
    /// AD8, bounded by 50.
    pub distribution: Vec<f64>,
    pub bars: Vec<PressureBar>,
    /// Number of bars zeroed by the epoch gate.
    pub epoch_guarded: usize,
}

pub fn calculate_pressure(bars: &[Bar]) -> PipelineOutcome<PressureReport> {
    PipelineOutcome::require(bars.len(), MIN_BARS, || build(bars))
}

fn epoch_gate(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .map(|b| if b.year() >= EPOCH_GUARD_YEAR { 0.0 } else { 1.0 })
        .collect()
}

fn build(bars: &[Bar]) -> PressureReport {
    let highs = bar::highs(bars);
    let lows = bar::lows(bars);
    let closes = bar::closes(bars);
    let average_price: Vec<f64> = bars.iter().map(Bar::average_price).collect();
    let zeros = vec![0.0; bars.len()];

    let as1 = ref_lag(&average_price, 1);
    let close_average = ma(&closes, GATE_AVERAGE);
    let gate = epoch_gate(bars);

    let low_gap = zip_with(&lows, &as1, |l, a| l - a);
    let as2 = ratio(
        &sma(&abs(&low_gap), SPREAD_SMOOTHING, 1),
        &sma(&max_with(&low_gap, 0.0), DIRECTIONAL_SMOOTHING, 1),
        0.0,
    );
    let as3 = ema(&as2, RATIO_SMOOTHING);
    let as4 = llv(&lows, EXTREME_WINDOW);
    let at_trough: Vec<bool> = lows.iter().zip(&as4).map(|(l, t)| l <= t).collect();
    let as5: Vec<f64> = ema(&select(&at_trough, &as3, &zeros), OUTPUT_SMOOTHING)
        .into_iter()
        .map(|v| v / MAGNITUDE_DIVISOR)
        .collect();
    let below_average: Vec<bool> = closes.iter().zip(&close_average).map(|(c, m)| c <= m).collect();
    let as6 = select(&below_average, &as5, &zeros);
    let as7 = zip_with(&as6, &gate, |v, g| v * g);
    let as8 = min_with(&as7, ACCUMULATION_CAP);

    let high_gap = zip_with(&highs, &as1, |h, a| h - a);
    let ad2 = ratio(
        &sma(&abs(&high_gap), SPREAD_SMOOTHING, 1),
        &sma(&max_with(&zip_with(&as1, &highs, |a, h| a - h), 0.0), DIRECTIONAL_SMOOTHING, 1),
        0.0,
    );
    let ad3 = ema(&ad2, RATIO_SMOOTHING);
    let ad4 = hhv(&highs, EXTREME_WINDOW);
    let at_peak: Vec<bool> = highs.iter().zip(&ad4).map(|(h, p)| h >= p).collect();
    let ad5: Vec<f64> = ema(&select(&at_peak, &ad3, &zeros), OUTPUT_SMOOTHING)
        .into_iter()
        .map(|v| v / MAGNITUDE_DIVISOR)
        .collect();
    let above_average: Vec<bool> = closes.iter().zip(&close_average).map(|(c, m)| c >= m).collect();
    let ad6 = select(&above_average, &ad5, &zeros);
    let ad7 = zip_with(&ad6, &gate, |v, g| v * g);
    let ad8 = min_with(&ad7, DISTRIBUTION_CAP);

    let epoch_guarded = gate.iter().filter(|&&g| g == 0.0).count();
    if epoch_guarded > 0 {
        warn!(
            bars = epoch_guarded,
            year = EPOCH_GUARD_YEAR,
            "pressure output zeroed by legacy epoch gate"
        );
    }

    let pressure_bars = bars
        .iter()
        .zip(as8.iter().zip(&ad8))
        .map(|(b, (&buy, &sell))| PressureBar {
            trade_date: b.trade_date,
            buy,
            sell: 0.0 - sell,
        })
        .collect();

    PressureReport {
        accumulation: as8,
        distribution: ad8,
        bars: pressure_bars,
        epoch_guarded,
    }
}
