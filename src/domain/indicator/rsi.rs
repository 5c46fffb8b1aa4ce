//! RSI family and the related ratio oscillators.
//!
//! RSI(n) = 100 * SMA(max(ΔC, 0), n, 1) / SMA(|ΔC|, n, 1), 50 when flat
//! %R(n)  = 100 * (HHV(H, n) - C) / (HHV(H, n) - LLV(L, n)), 50 on a flat band
//!
//! The weighted blends reuse one weight triple (0.5 / 0.31 / 0.19). The
//! weights and periods are fixed so that historical signal output stays
//! reproducible.

use crate::domain::bar::{self, Bar};
use crate::domain::series::{abs, hhv, llv, max_with, ratio, sma, zip_with};

pub const NEUTRAL: f64 = 50.0;
pub const BLEND_WEIGHTS: [f64; 3] = [0.5, 0.31, 0.19];
pub const STRENGTH_PERIODS: [usize; 3] = [3, 5, 8];
pub const BLEND_RSI_PERIOD: usize = 5;
pub const BLEND_WR_PERIODS: [usize; 2] = [12, 24];
pub const VOLATILITY_PERIOD: usize = 14;

/// Close-to-close change, 0 on the first bar.
fn price_change(closes: &[f64]) -> Vec<f64> {
    (0..closes.len())
        .map(|i| if i == 0 { 0.0 } else { closes[i] - closes[i - 1] })
        .collect()
}

pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let change = price_change(closes);
    let gains = sma(&max_with(&change, 0.0), period, 1);
    let moves = sma(&abs(&change), period, 1);
    ratio(&gains, &moves, NEUTRAL / 100.0)
        .into_iter()
        .map(|r| r * 100.0)
        .collect()
}

/// 0.5·RSI(3) + 0.31·RSI(5) + 0.19·RSI(8)
pub fn relative_strength(closes: &[f64]) -> Vec<f64> {
    let [fast, mid, slow] = STRENGTH_PERIODS.map(|p| rsi(closes, p));
    blend(&fast, &mid, &slow)
}

pub fn williams_r(bars: &[Bar], period: usize) -> Vec<f64> {
    let highest = hhv(&bar::highs(bars), period);
    let lowest = llv(&bar::lows(bars), period);
    bars.iter()
        .enumerate()
        .map(|(i, b)| {
            let width = highest[i] - lowest[i];
            if width == 0.0 {
                NEUTRAL
            } else {
                100.0 * ((highest[i] - b.close) / width)
            }
        })
        .collect()
}

/// 0.5·RSI(5) + 0.31·(100 − %R(12)) + 0.19·(100 − %R(24))
pub fn momentum_blend(bars: &[Bar]) -> Vec<f64> {
    let closes = bar::closes(bars);
    let strength = rsi(&closes, BLEND_RSI_PERIOD);
    let [short, long] = BLEND_WR_PERIODS.map(|p| {
        williams_r(bars, p)
            .into_iter()
            .map(|wr| 100.0 - wr)
            .collect::<Vec<f64>>()
    });
    blend(&strength, &short, &long)
}

/// 100 · SMA(|+DM − −DM|, n, 1) / SMA(TR, n, 1), 0 when the range is flat.
pub fn volatility_ratio(bars: &[Bar], period: usize) -> Vec<f64> {
    let mut spread = Vec::with_capacity(bars.len());
    let mut range = Vec::with_capacity(bars.len());
    for (i, b) in bars.iter().enumerate() {
        if i == 0 {
            spread.push(0.0);
            range.push(b.high - b.low);
            continue;
        }
        let prev = &bars[i - 1];
        let up = b.high - prev.high;
        let down = prev.low - b.low;
        let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
        let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };
        spread.push((plus_dm - minus_dm).abs());
        range.push(b.true_range(prev.close));
    }
    let directional = sma(&spread, period, 1);
    let true_range = sma(&range, period, 1);
    ratio(&directional, &true_range, 0.0)
        .into_iter()
        .map(|r| r * 100.0)
        .collect()
}

fn blend(a: &[f64], b: &[f64], c: &[f64]) -> Vec<f64> {
    let [wa, wb, wc] = BLEND_WEIGHTS;
    let ab = zip_with(a, b, |x, y| wa * x + wb * y);
    zip_with(&ab, c, |x, y| x + wc * y)
}
