//! Indicator engine: the pure entry points over one symbol's bar history.
//!
//! `compute` runs every oscillator and composite over the supplied window.
//! `compute_incremental` resumes the oscillators after the persisted anchor
//! row and reports series and signals for that suffix only. Neither performs
//! I/O.

use crate::domain::bar::{Bar, Period, closes, validate_bars};
use crate::domain::error::KlineError;
use crate::domain::incremental::{self, IncrementalResult};
use crate::domain::indicator::kdj::KdjParams;
use crate::domain::indicator::macd::MacdParams;
use crate::domain::indicator::rsi::relative_strength;
use crate::domain::indicator::{OscillatorRow, cross_signals, fold_rows};
use crate::domain::pipeline::bottom::BottomReport;
use crate::domain::pipeline::ladder::{DaySnapshot, LadderReport};
use crate::domain::pipeline::pressure::PressureReport;
use crate::domain::pipeline::{Composites, PipelineOutcome};
use crate::domain::signal::{SignalEvent, sort_events};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineParams {
    pub macd: MacdParams,
    pub kdj: KdjParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorReport {
    pub period: Period,
    pub rows: Vec<OscillatorRow>,
    pub oscillator_signals: Vec<SignalEvent>,
    pub relative_strength: Vec<f64>,
    pub bottom: PipelineOutcome<BottomReport>,
    pub pressure: PipelineOutcome<PressureReport>,
    pub ladder: PipelineOutcome<LadderReport>,
}

impl IndicatorReport {
    /// Every signal event from oscillators and ready pipelines, ordered by
    /// trade date and then category.
    pub fn signals(&self) -> Vec<SignalEvent> {
        let mut events = self.oscillator_signals.clone();
        if let Some(report) = self.bottom.ready() {
            events.extend_from_slice(&report.signals);
        }
        if let Some(report) = self.ladder.ready() {
            events.extend_from_slice(&report.signals);
        }
        sort_events(&mut events);
        events
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: EngineParams,
}

impl IndicatorEngine {
    pub fn new(params: EngineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Full computation; the ladder levels use the last bar as the snapshot.
    pub fn compute(&self, bars: &[Bar], period: Period) -> Result<IndicatorReport, KlineError> {
        let snapshot = bars.last().map(DaySnapshot::from_bar);
        self.compute_report(bars, period, snapshot.as_ref())
    }

    pub fn compute_with_snapshot(
        &self,
        bars: &[Bar],
        period: Period,
        snapshot: &DaySnapshot,
    ) -> Result<IndicatorReport, KlineError> {
        self.compute_report(bars, period, Some(snapshot))
    }

    /// Resume after the persisted anchor row. Composites run over `bars`
    /// with the last bar as the ladder snapshot.
    pub fn compute_incremental(
        &self,
        bars: &[Bar],
        prior: &[OscillatorRow],
    ) -> Result<IncrementalResult, KlineError> {
        validate_bars(bars)?;
        Ok(incremental::recompute(
            bars,
            prior,
            &self.params.macd,
            &self.params.kdj,
        ))
    }

    fn compute_report(
        &self,
        bars: &[Bar],
        period: Period,
        snapshot: Option<&DaySnapshot>,
    ) -> Result<IndicatorReport, KlineError> {
        validate_bars(bars)?;

        let rows = fold_rows(bars, 0, None, &self.params.macd, &self.params.kdj);
        let oscillator_signals = cross_signals(&rows, None);
        let Composites {
            bottom,
            pressure,
            ladder,
        } = Composites::evaluate(bars, snapshot);
        let report = IndicatorReport {
            period,
            relative_strength: relative_strength(&closes(bars)),
            bottom,
            pressure,
            ladder,
            rows,
            oscillator_signals,
        };
        debug!(
            bars = bars.len(),
            %period,
            bottom = report.bottom.is_ready(),
            pressure = report.pressure.is_ready(),
            ladder = report.ladder.is_ready(),
            "indicators computed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(i: usize, close: f64) -> Bar {
        Bar {
            trade_date: 20210101 + (i as u32 / 28) * 100 + (i as u32 % 28),
            open: close,
            high: close + 0.3,
            low: close - 0.3,
            close,
            volume: 10_000,
            amount: close * 10_000.0,
        }
    }

    fn history(count: usize) -> Vec<Bar> {
        (0..count)
            .map(|i| make_bar(i, 15.0 + 2.5 * (i as f64 * 0.2).sin()))
            .collect()
    }

    #[test]
    fn empty_history_is_all_insufficient() {
        let engine = IndicatorEngine::default();
        let report = engine.compute(&[], Period::Day).unwrap();
        assert!(report.rows.is_empty());
        assert!(!report.bottom.is_ready());
        assert!(!report.pressure.is_ready());
        assert!(!report.ladder.is_ready());
        assert!(report.signals().is_empty());
    }

    #[test]
    fn pipelines_switch_on_at_their_minimums() {
        let engine = IndicatorEngine::default();
        let report = engine.compute(&history(55), Period::Day).unwrap();
        assert!(report.bottom.is_ready());
        assert!(report.ladder.is_ready());
        assert!(!report.pressure.is_ready());
        assert_eq!(report.rows.len(), 55);
        assert_eq!(report.relative_strength.len(), 55);
    }

    #[test]
    fn rejects_unordered_history() {
        let mut bars = history(10);
        bars.swap(3, 4);
        let engine = IndicatorEngine::default();
        assert!(matches!(
            engine.compute(&bars, Period::Day),
            Err(KlineError::NonMonotonicDates { index: 4, .. })
        ));
        assert!(engine.compute_incremental(&bars, &[]).is_err());
    }

    #[test]
    fn snapshot_changes_levels_only() {
        let engine = IndicatorEngine::default();
        let bars = history(60);
        let snapshot = DaySnapshot {
            open: 15.0,
            high: 16.0,
            low: 14.0,
        };
        let custom = engine
            .compute_with_snapshot(&bars, Period::Week, &snapshot)
            .unwrap();
        let default = engine.compute(&bars, Period::Week).unwrap();
        let levels = custom.ladder.ready().unwrap().levels;
        assert_eq!(levels.center, 15.0);
        assert_eq!(custom.rows, default.rows);
        assert_eq!(custom.bottom, default.bottom);
        assert_eq!(custom.period, Period::Week);
    }

    #[test]
    fn signals_are_sorted() {
        let engine = IndicatorEngine::default();
        let report = engine.compute(&history(120), Period::Day).unwrap();
        let signals = report.signals();
        assert!(!signals.is_empty());
        assert!(
            signals
                .windows(2)
                .all(|w| (w[0].trade_date, w[0].category) <= (w[1].trade_date, w[1].category))
        );
    }
}
