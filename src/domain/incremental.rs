//! Incremental oscillator recompute.
//!
//! The persisted tail must hold at least two rows. The second-to-last row is
//! the anchor: its state seeds the fold and every bar after it is recomputed,
//! which replaces the last persisted row as well as anything newer. If the
//! anchor date is not in the bar history, or the tail is too short or out of
//! order, the whole history is recomputed instead.
//!
//! The composites carry no state between runs. They are evaluated over the
//! supplied bars and only their signals dated inside the suffix are kept.

use crate::domain::bar::{Bar, closes, find_trade_date};
use crate::domain::indicator::kdj::KdjParams;
use crate::domain::indicator::macd::MacdParams;
use crate::domain::indicator::rsi::relative_strength;
use crate::domain::indicator::{OscillatorRow, cross_signals, fold_rows};
use crate::domain::pipeline::bottom::BottomReport;
use crate::domain::pipeline::ladder::{DaySnapshot, LadderReport};
use crate::domain::pipeline::pressure::PressureReport;
use crate::domain::pipeline::{Composites, PipelineOutcome};
use crate::domain::signal::{SignalEvent, sort_events};
use tracing::{debug, warn};

/// Rows the controller needs from the persisted tail.
pub const TAIL_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeMode {
    /// Resumed after the anchor row with this trade date.
    Resumed { anchor_date: u32 },
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecomputePlan {
    pub start_index: usize,
    pub seed: Option<OscillatorRow>,
    pub mode: RecomputeMode,
}

impl RecomputePlan {
    fn full() -> Self {
        Self {
            start_index: 0,
            seed: None,
            mode: RecomputeMode::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncrementalResult {
    pub start_index: usize,
    pub mode: RecomputeMode,
    /// Rows for `bars[start_index..]`.
    pub rows: Vec<OscillatorRow>,
    /// Oscillator crossings inside the recomputed suffix.
    pub oscillator_signals: Vec<SignalEvent>,
    /// Relative strength for `bars[start_index..]`.
    pub relative_strength: Vec<f64>,
    /// Composites over the whole supplied window.
    pub bottom: PipelineOutcome<BottomReport>,
    pub pressure: PipelineOutcome<PressureReport>,
    pub ladder: PipelineOutcome<LadderReport>,
}

impl IncrementalResult {
    /// Oscillator and composite signals dated inside the suffix, ordered by
    /// trade date and then category.
    pub fn signals(&self) -> Vec<SignalEvent> {
        let mut events = self.oscillator_signals.clone();
        if let Some(first) = self.rows.first() {
            let composites = [
                self.bottom.ready().map(|r| r.signals.as_slice()),
                self.ladder.ready().map(|r| r.signals.as_slice()),
            ];
            events.extend(
                composites
                    .into_iter()
                    .flatten()
                    .flatten()
                    .filter(|e| e.trade_date >= first.trade_date),
            );
        }
        sort_events(&mut events);
        events
    }
}

/// Whether a window of the most recent bars is wide enough to resume from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFit {
    Enough,
    /// This many older bars are needed so the first resumed RSV sees a full
    /// `kdj.n` window.
    Extend(usize),
    /// The fold restarts from scratch, so it needs the whole history.
    WholeHistory,
}

/// Check a most-recent-bars window against the persisted tail.
pub fn window_fit(window: &[Bar], prior: &[OscillatorRow], kdj: &KdjParams) -> WindowFit {
    let plan = plan_recompute(window, prior);
    match plan.mode {
        RecomputeMode::Full => WindowFit::WholeHistory,
        RecomputeMode::Resumed { .. } => {
            let missing = kdj.n.max(1).saturating_sub(1).saturating_sub(plan.start_index);
            if missing == 0 {
                WindowFit::Enough
            } else {
                WindowFit::Extend(missing)
            }
        }
    }
}

pub fn plan_recompute(bars: &[Bar], prior: &[OscillatorRow]) -> RecomputePlan {
    if prior.len() < TAIL_ROWS {
        debug!(rows = prior.len(), "no usable oscillator tail, full recompute");
        return RecomputePlan::full();
    }
    if prior.windows(2).any(|w| w[0].trade_date >= w[1].trade_date) {
        warn!("persisted oscillator tail is out of order, full recompute");
        return RecomputePlan::full();
    }
    let anchor = prior[prior.len() - 2];
    match find_trade_date(bars, anchor.trade_date) {
        Some(index) => RecomputePlan {
            start_index: index + 1,
            seed: Some(anchor),
            mode: RecomputeMode::Resumed {
                anchor_date: anchor.trade_date,
            },
        },
        None => {
            warn!(
                anchor_date = anchor.trade_date,
                "anchor row not found in bar history, full recompute"
            );
            RecomputePlan::full()
        }
    }
}

pub fn recompute(
    bars: &[Bar],
    prior: &[OscillatorRow],
    macd_params: &MacdParams,
    kdj_params: &KdjParams,
) -> IncrementalResult {
    let plan = plan_recompute(bars, prior);
    let rows = fold_rows(bars, plan.start_index, plan.seed.as_ref(), macd_params, kdj_params);
    let oscillator_signals = cross_signals(&rows, plan.seed.as_ref());
    let mut strength = relative_strength(&closes(bars));
    strength.drain(..plan.start_index.min(strength.len()));
    let snapshot = bars.last().map(DaySnapshot::from_bar);
    let Composites {
        bottom,
        pressure,
        ladder,
    } = Composites::evaluate(bars, snapshot.as_ref());
    debug!(
        start_index = plan.start_index,
        rows = rows.len(),
        "suffix recomputed"
    );
    IncrementalResult {
        start_index: plan.start_index,
        mode: plan.mode,
        rows,
        oscillator_signals,
        relative_strength: strength,
        bottom,
        pressure,
        ladder,
    }
}

/// Splice a recomputed suffix onto the rows persisted before it.
pub fn merge_rows(persisted: &[OscillatorRow], result: &IncrementalResult) -> Vec<OscillatorRow> {
    match result.mode {
        RecomputeMode::Full => result.rows.clone(),
        RecomputeMode::Resumed { anchor_date } => persisted
            .iter()
            .filter(|r| r.trade_date <= anchor_date)
            .chain(result.rows.iter())
            .copied()
            .collect(),
    }
}
