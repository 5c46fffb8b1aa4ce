//! Composite signal pipelines.
//!
//! Each pipeline has a hard minimum bar count. Below it the pipeline yields
//! [`PipelineOutcome::InsufficientHistory`] and computes nothing; there is no
//! partially filled result.

pub mod bottom;
pub mod ladder;
pub mod pressure;

use crate::domain::bar::Bar;
use bottom::BottomReport;
use ladder::{DaySnapshot, LadderReport};
use pressure::PressureReport;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome<T> {
    InsufficientHistory { bars: usize, minimum: usize },
    Ready(T),
}

impl<T> PipelineOutcome<T> {
    /// Run `build` only when `bars` meets `minimum`.
    pub fn require(bars: usize, minimum: usize, build: impl FnOnce() -> T) -> Self {
        if bars < minimum {
            PipelineOutcome::InsufficientHistory { bars, minimum }
        } else {
            PipelineOutcome::Ready(build())
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            PipelineOutcome::Ready(value) => Some(value),
            PipelineOutcome::InsufficientHistory { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PipelineOutcome::Ready(_))
    }
}

/// The three composites evaluated over one bar window.
#[derive(Debug, Clone, PartialEq)]
pub struct Composites {
    pub bottom: PipelineOutcome<BottomReport>,
    pub pressure: PipelineOutcome<PressureReport>,
    pub ladder: PipelineOutcome<LadderReport>,
}

impl Composites {
    /// Without a snapshot the ladder has no price levels and stays insufficient.
    pub fn evaluate(bars: &[Bar], snapshot: Option<&DaySnapshot>) -> Self {
        let ladder = match snapshot {
            Some(snapshot) => ladder::calculate_ladder(bars, snapshot),
            None => PipelineOutcome::InsufficientHistory {
                bars: bars.len(),
                minimum: ladder::MIN_BARS,
            },
        };
        Self {
            bottom: bottom::calculate_bottom(bars),
            pressure: pressure::calculate_pressure(bars),
            ladder,
        }
    }
}
