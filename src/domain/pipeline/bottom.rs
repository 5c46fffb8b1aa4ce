//! Bottom-detection composite.
//!
//! A 0–4 "wave" line tracks where the close sits inside the 34-bar high/low
//! band. It is read against its own short average, three fixed reference
//! lines, moving-average crossovers, a volume check and a handful of ratio
//! oscillators. Each rule below fills one signal category independently.
//!
//! Rules are evaluated from the second bar on; the first bar has no prior
//! bar to compare against.

use crate::domain::bar::{self, Bar};
use crate::domain::indicator::rsi::{
    VOLATILITY_PERIOD, momentum_blend, relative_strength, rsi, volatility_ratio,
};
use crate::domain::pipeline::PipelineOutcome;
use crate::domain::series::{band_position, constant, cross, ema, llv, ma, ref_lag, safe_div, sma};
use crate::domain::signal::{SignalCategory, SignalEvent, sort_events};

pub const MIN_BARS: usize = 38;

pub const WAVE_WINDOW: usize = 34;
pub const WAVE_SCALE: f64 = 4.0;
pub const WAVE_SMOOTHING: usize = 4;
pub const WAVE_AVERAGE: usize = 3;
pub const OVERBOUGHT_LINE: f64 = 3.5;
pub const MID_LINE: f64 = 2.0;
pub const OVERSOLD_LINE: f64 = 0.5;

pub const INFO_SCALE: f64 = 688.0;
pub const INFO_SMOOTHING: usize = 5;
pub const MA_FAST: usize = 5;
pub const MA_SLOW: usize = 10;
pub const VOLUME_WINDOW: usize = 5;

pub const LOW_LOOKBACK: usize = 38;
pub const ABSOLUTE_BOTTOM_STRENGTH: f64 = 30.0;
pub const SEE_RISE_OPEN_LOW: f64 = 1.05;
pub const SEE_RISE_CLOSE_OPEN: f64 = 1.01;
pub const MUST_RISE_GAIN: f64 = 1.04;
pub const BUILD_SMOOTHING: usize = 3;
pub const BUILD_CEILING: f64 = 20.0;
pub const ESCAPE_PERIOD: usize = 6;
pub const ESCAPE_LINE: f64 = 79.0;
pub const FISHING_LINE: f64 = 20.0;

/// Per-bar classification feeding the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BarState {
    pub strengthening: bool,
    pub weakening: bool,
    pub info_rising: bool,
    pub volume_surge: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BottomReport {
    pub wave: Vec<f64>,
    pub average: Vec<f64>,
    pub overbought: Vec<f64>,
    pub mid: Vec<f64>,
    pub oversold: Vec<f64>,
    pub info: Vec<f64>,
    pub strength: Vec<f64>,
    pub volatility: Vec<f64>,
    pub escape_line: Vec<f64>,
    pub momentum: Vec<f64>,
    pub build_fast: Vec<f64>,
    pub build_slow: Vec<f64>,
    pub states: Vec<BarState>,
    pub signals: Vec<SignalEvent>,
}

impl BottomReport {
    pub fn signals_of(&self, category: SignalCategory) -> impl Iterator<Item = &SignalEvent> {
        self.signals.iter().filter(move |e| e.category == category)
    }
}

pub fn calculate_bottom(bars: &[Bar]) -> PipelineOutcome<BottomReport> {
    PipelineOutcome::require(bars.len(), MIN_BARS, || build(bars))
}

fn build(bars: &[Bar]) -> BottomReport {
    let len = bars.len();
    let opens = bar::opens(bars);
    let highs = bar::highs(bars);
    let lows = bar::lows(bars);
    let closes = bar::closes(bars);
    let volumes = bar::volumes(bars);

    let position = band_position(&closes, &highs, &lows, WAVE_WINDOW, 1.0, 0.5);
    let scaled: Vec<f64> = position.iter().map(|p| p * WAVE_SCALE).collect();
    let wave = ema(&scaled, WAVE_SMOOTHING);
    let average = ma(&wave, WAVE_AVERAGE);
    let prev_wave = ref_lag(&wave, 1);

    let prev_close = ref_lag(&closes, 1);
    let info_raw: Vec<f64> = (0..len)
        .map(|i| safe_div(INFO_SCALE * (closes[i] - prev_close[i]), prev_close[i], 0.0))
        .collect();
    let info = ema(&info_raw, INFO_SMOOTHING);
    let prev_info = ref_lag(&info, 1);
    let volume_average = ma(&volumes, VOLUME_WINDOW);

    let states: Vec<BarState> = (0..len)
        .map(|i| {
            if i == 0 {
                return BarState::default();
            }
            BarState {
                strengthening: wave[i] > average[i] && wave[i] > prev_wave[i],
                weakening: wave[i] < average[i] && wave[i] < prev_wave[i],
                info_rising: info[i] > prev_info[i],
                volume_surge: volumes[i] > volume_average[i],
            }
        })
        .collect();

    let strength = relative_strength(&closes);
    let volatility = volatility_ratio(bars, VOLATILITY_PERIOD);
    let escape_line = rsi(&closes, ESCAPE_PERIOD);
    let momentum = momentum_blend(bars);

    let pressure = band_position(&closes, &highs, &lows, WAVE_WINDOW, 100.0, 50.0);
    let build_fast = sma(&pressure, BUILD_SMOOTHING, 1);
    let build_mid = sma(&build_fast, BUILD_SMOOTHING, 1);
    let build_slow = sma(&build_mid, BUILD_SMOOTHING, 1);

    let wave_cross = cross(&wave, &average);
    let ma_cross = cross(&ma(&closes, MA_FAST), &ma(&closes, MA_SLOW));
    let build_cross = cross(&build_fast, &build_slow);
    let lowest_close = llv(&closes, LOW_LOOKBACK);

    let mut signals = Vec::new();
    let mut emit = |i: usize, category: SignalCategory| {
        signals.push(SignalEvent {
            trade_date: bars[i].trade_date,
            category,
        })
    };

    for i in 1..len {
        let state = states[i];
        let (open, low, close) = (opens[i], lows[i], closes[i]);
        let prev = closes[i - 1];

        if wave_cross[i] && wave[i - 1] < OVERSOLD_LINE {
            emit(i, SignalCategory::ExtremeBottom);
        }
        if wave_cross[i] && wave[i] < MID_LINE {
            emit(i, SignalCategory::Rise);
        }
        if prev == lowest_close[i - 1]
            && close > prev
            && state.strengthening
            && strength[i] < ABSOLUTE_BOTTOM_STRENGTH
        {
            emit(i, SignalCategory::AbsoluteBottom);
        }
        if safe_div(open, low, 0.0) > SEE_RISE_OPEN_LOW
            && safe_div(close, open, 0.0) >= SEE_RISE_CLOSE_OPEN
        {
            emit(i, SignalCategory::SeeRise);
        }
        if safe_div(close, prev, 0.0) > MUST_RISE_GAIN && state.volume_surge && state.info_rising {
            emit(i, SignalCategory::MustRise);
        }
        if ma_cross[i] && !state.weakening {
            emit(i, SignalCategory::GoldenCross);
        }
        if build_cross[i] && build_slow[i] < BUILD_CEILING {
            emit(i, SignalCategory::BuildPosition);
        }
        if escape_line[i - 1] > ESCAPE_LINE && escape_line[i] < escape_line[i - 1] {
            emit(i, SignalCategory::Escape);
        }
        if momentum[i] < FISHING_LINE && low > lows[i - 1] && close > low {
            emit(i, SignalCategory::BottomFishing);
        }
    }
    sort_events(&mut signals);

    BottomReport {
        overbought: constant(OVERBOUGHT_LINE, len),
        mid: constant(MID_LINE, len),
        oversold: constant(OVERSOLD_LINE, len),
        wave,
        average,
        info,
        strength,
        volatility,
        escape_line,
        momentum,
        build_fast,
        build_slow,
        states,
        signals,
    }
}
