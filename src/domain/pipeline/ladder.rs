//! Support/resistance trend ladder.
//!
//! Static price levels come from one day's open/high/low snapshot. The trend
//! line is a double-smoothed 0–100 position of the close inside the 55-bar
//! high/low band. Each bar is classified from the trend value and the value
//! one bar earlier; no tier state is carried from bar to bar.
//!
//! Buy side tiers, from shallow to deep: 11 (starred), 6, 3, 1, 0.
//! Sell side tiers mirror them: 89 (starred), 94, 97, 99, 100.

use crate::domain::bar::{self, Bar};
use crate::domain::pipeline::PipelineOutcome;
use crate::domain::series::{band_position, every, sma};
use crate::domain::signal::{SignalCategory, SignalEvent, sort_events};

pub const MIN_BARS: usize = 55;

pub const TREND_WINDOW: usize = 55;
pub const TREND_FAST: usize = 5;
pub const TREND_SLOW: usize = 3;
pub const BUY_TIERS: [u8; 5] = [11, 6, 3, 1, 0];
pub const SELL_TIERS: [u8; 5] = [89, 94, 97, 99, 100];
pub const OVERSOLD: f64 = 11.0;
pub const OVERBOUGHT: f64 = 89.0;
pub const READY_STAY: usize = 15;

/// The externally supplied day used for the static levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySnapshot {
    pub open: f64,
    pub high: f64,
    pub low: f64,
}

impl DaySnapshot {
    pub fn from_bar(bar: &Bar) -> Self {
        Self {
            open: bar.open,
            high: bar.high,
            low: bar.low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevels {
    pub support: f64,
    pub center: f64,
    pub resistance: f64,
}

impl PriceLevels {
    pub fn from_snapshot(snapshot: &DaySnapshot) -> Self {
        let center = (snapshot.open + snapshot.high + snapshot.low) / 3.0;
        Self {
            support: 2.0 * center - snapshot.high,
            center,
            resistance: 2.0 * center - snapshot.low,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LadderReport {
    pub levels: PriceLevels,
    pub trend: Vec<f64>,
    pub signals: Vec<SignalEvent>,
}

pub fn calculate_ladder(bars: &[Bar], snapshot: &DaySnapshot) -> PipelineOutcome<LadderReport> {
    PipelineOutcome::require(bars.len(), MIN_BARS, || build(bars, snapshot))
}

pub fn trend_line(bars: &[Bar]) -> Vec<f64> {
    let position = band_position(
        &bar::closes(bars),
        &bar::highs(bars),
        &bar::lows(bars),
        TREND_WINDOW,
        100.0,
        50.0,
    );
    sma(&sma(&position, TREND_FAST, 1), TREND_SLOW, 1)
}

/// Upward crossing of a buy boundary: prev ≤ b < current.
pub fn buy_crossing(prev: f64, current: f64) -> Option<SignalCategory> {
    BUY_TIERS.iter().find_map(|&tier| {
        let b = f64::from(tier);
        (prev <= b && current > b).then(|| {
            if tier == BUY_TIERS[0] {
                SignalCategory::StarBuy
            } else {
                SignalCategory::Buy { tier }
            }
        })
    })
}

/// Downward crossing of a sell boundary: prev ≥ b > current.
pub fn sell_crossing(prev: f64, current: f64) -> Option<SignalCategory> {
    SELL_TIERS.iter().find_map(|&tier| {
        let b = f64::from(tier);
        (prev >= b && current < b).then(|| {
            if tier == SELL_TIERS[0] {
                SignalCategory::StarSell
            } else {
                SignalCategory::Sell { tier }
            }
        })
    })
}

fn build(bars: &[Bar], snapshot: &DaySnapshot) -> LadderReport {
    let levels = PriceLevels::from_snapshot(snapshot);
    let trend = trend_line(bars);
    let low_stay: Vec<bool> = trend.iter().map(|&t| t <= OVERSOLD).collect();
    let high_stay: Vec<bool> = trend.iter().map(|&t| t >= OVERBOUGHT).collect();
    let ready_buy = every(&low_stay, READY_STAY);
    let ready_sell = every(&high_stay, READY_STAY);

    let mut signals = Vec::new();
    for (i, b) in bars.iter().enumerate() {
        let mut push = |category| {
            signals.push(SignalEvent {
                trade_date: b.trade_date,
                category,
            })
        };
        let below_center = b.close < levels.center;
        let above_center = b.close > levels.center;

        if trend[i] < OVERSOLD {
            push(SignalCategory::PrepareBuy);
        }
        if ready_buy[i] && below_center {
            push(SignalCategory::ReadyBuy);
        }
        if trend[i] > OVERBOUGHT {
            push(SignalCategory::PrepareSell);
        }
        if ready_sell[i] && above_center {
            push(SignalCategory::ReadySell);
        }
        if i == 0 {
            continue;
        }
        if below_center {
            if let Some(category) = buy_crossing(trend[i - 1], trend[i]) {
                push(category);
            }
        }
        if above_center {
            if let Some(category) = sell_crossing(trend[i - 1], trend[i]) {
                push(category);
            }
        }
    }
    sort_events(&mut signals);

    LadderReport {
        levels,
        trend,
        signals,
    }
}
