//! KDJ stochastic oscillator as a bar-by-bar recurrence.
//!
//! RSV = 100 * (close - LLV(low, n)) / (HHV(high, n) - LLV(low, n)), 100 on a flat band
//! K = K_prev * (m1-1)/m1 + RSV/m1
//! D = D_prev * (m2-1)/m2 + K/m2
//! J = 3K - 2D
//!
//! Defaults: n=9, m1=3, m2=3. Without prior state K=D=J=50.

use crate::domain::bar::Bar;

pub const DEFAULT_N: usize = 9;
pub const DEFAULT_M1: usize = 3;
pub const DEFAULT_M2: usize = 3;
pub const NEUTRAL: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdjParams {
    pub n: usize,
    pub m1: usize,
    pub m2: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            m1: DEFAULT_M1,
            m2: DEFAULT_M2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjState {
    pub k: f64,
    pub d: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdjPoint {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

/// Raw stochastic value of bar `index` over the trailing `n` bars.
pub fn rsv(bars: &[Bar], index: usize, n: usize) -> f64 {
    let start = (index + 1).saturating_sub(n.max(1));
    let window = &bars[start..=index];
    let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    if highest == lowest {
        100.0
    } else {
        100.0 * ((bars[index].close - lowest) / (highest - lowest))
    }
}

impl KdjState {
    pub fn seed() -> (Self, KdjPoint) {
        (
            Self {
                k: NEUTRAL,
                d: NEUTRAL,
            },
            KdjPoint {
                k: NEUTRAL,
                d: NEUTRAL,
                j: NEUTRAL,
            },
        )
    }

    pub fn next(&self, rsv: f64, params: &KdjParams) -> (Self, KdjPoint) {
        let m1 = params.m1.max(1) as f64;
        let m2 = params.m2.max(1) as f64;
        let k = self.k * (m1 - 1.0) / m1 + rsv / m1;
        let d = self.d * (m2 - 1.0) / m2 + k / m2;
        (Self { k, d }, KdjPoint { k, d, j: 3.0 * k - 2.0 * d })
    }
}

/// Full-history KDJ over a bar series.
pub fn calculate_kdj(bars: &[Bar], params: &KdjParams) -> Vec<KdjPoint> {
    (0..bars.len())
        .scan(None::<KdjState>, |state, i| {
            let (next, point) = match state {
                None => KdjState::seed(),
                Some(prev) => prev.next(rsv(bars, i, params.n), params),
            };
            *state = Some(next);
            Some(point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bar(high: f64, low: f64, close: f64) -> Bar {
        Bar {
            trade_date: 20240102,
            open: close,
            high,
            low,
            close,
            volume: 1000,
            amount: 0.0,
        }
    }

    #[test]
    fn first_bar_is_neutral() {
        let points = calculate_kdj(&[bar(11.0, 9.0, 10.0)], &KdjParams::default());
        assert_eq!(points[0], KdjPoint { k: 50.0, d: 50.0, j: 50.0 });
    }

    #[test]
    fn rsv_flat_band_is_full_scale() {
        let bars = vec![bar(10.0, 10.0, 10.0), bar(10.0, 10.0, 10.0)];
        assert_eq!(rsv(&bars, 1, 9), 100.0);
    }

    #[test]
    fn rsv_uses_trailing_window_only() {
        let bars = vec![
            bar(30.0, 1.0, 20.0),
            bar(12.0, 10.0, 11.0),
            bar(14.0, 10.0, 12.0),
        ];
        // window of 2 ignores the first bar's extremes
        assert_relative_eq!(rsv(&bars, 2, 2), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn second_bar_matches_hand_calculation() {
        let bars = vec![bar(11.0, 9.0, 10.0), bar(12.0, 10.0, 11.5)];
        let points = calculate_kdj(&bars, &KdjParams::default());
        // rsv = 100·(11.5 − 9)/(12 − 9) = 83.33…
        let rsv = 100.0 * 2.5 / 3.0;
        let k = 50.0 * 2.0 / 3.0 + rsv / 3.0;
        let d = 50.0 * 2.0 / 3.0 + k / 3.0;
        assert_relative_eq!(points[1].k, k, epsilon = 1e-9);
        assert_relative_eq!(points[1].d, d, epsilon = 1e-9);
        assert_relative_eq!(points[1].j, 3.0 * k - 2.0 * d, epsilon = 1e-9);
    }

    #[test]
    fn saturated_rsv_approaches_limits_monotonically() {
        let params = KdjParams::default();
        for (rsv, limit) in [(100.0, 100.0), (0.0, 0.0)] {
            let (mut state, _) = KdjState::seed();
            let mut gap = (state.k - limit).abs();
            for _ in 0..60 {
                let (next, point) = state.next(rsv, &params);
                assert!((0.0 - 1e-12..=100.0 + 1e-12).contains(&point.k));
                assert!((0.0 - 1e-12..=100.0 + 1e-12).contains(&point.d));
                let next_gap = (next.k - limit).abs();
                assert!(next_gap <= gap + 1e-12);
                gap = next_gap;
                state = next;
            }
            assert_relative_eq!(state.k, limit, epsilon = 1e-6);
        }
    }

    #[test]
    fn k_and_d_stay_within_bounds() {
        let bars: Vec<Bar> = (0..80)
            .map(|i| {
                let c = 50.0 + 20.0 * (i as f64 * 0.3).sin();
                bar(c + 1.5, c - 1.5, c)
            })
            .collect();
        for p in calculate_kdj(&bars, &KdjParams::default()) {
            assert!((0.0..=100.0).contains(&p.k), "K {} out of range", p.k);
            assert!((0.0..=100.0).contains(&p.d), "D {} out of range", p.d);
        }
    }
}
