//! Discrete signal events emitted by the oscillators and composite pipelines.

use std::fmt;

/// Which way a signal leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalSide {
    Buy,
    Sell,
    /// Heads-up states (oversold, overbought, awaiting reversal) that are not
    /// actionable on their own.
    Watch,
}

impl fmt::Display for SignalSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalSide::Buy => write!(f, "buy"),
            SignalSide::Sell => write!(f, "sell"),
            SignalSide::Watch => write!(f, "watch"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalCategory {
    ExtremeBottom,
    Rise,
    AbsoluteBottom,
    SeeRise,
    MustRise,
    GoldenCross,
    BuildPosition,
    Escape,
    BottomFishing,
    MacdGoldenCross,
    MacdDeathCross,
    KdjGoldenCross,
    KdjDeathCross,
    PrepareBuy,
    ReadyBuy,
    Buy { tier: u8 },
    StarBuy,
    PrepareSell,
    ReadySell,
    Sell { tier: u8 },
    StarSell,
}

impl SignalCategory {
    pub fn side(&self) -> SignalSide {
        match self {
            SignalCategory::ExtremeBottom
            | SignalCategory::Rise
            | SignalCategory::AbsoluteBottom
            | SignalCategory::SeeRise
            | SignalCategory::MustRise
            | SignalCategory::GoldenCross
            | SignalCategory::BuildPosition
            | SignalCategory::BottomFishing
            | SignalCategory::MacdGoldenCross
            | SignalCategory::KdjGoldenCross
            | SignalCategory::Buy { .. }
            | SignalCategory::StarBuy => SignalSide::Buy,
            SignalCategory::Escape
            | SignalCategory::MacdDeathCross
            | SignalCategory::KdjDeathCross
            | SignalCategory::Sell { .. }
            | SignalCategory::StarSell => SignalSide::Sell,
            SignalCategory::PrepareBuy
            | SignalCategory::ReadyBuy
            | SignalCategory::PrepareSell
            | SignalCategory::ReadySell => SignalSide::Watch,
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalCategory::ExtremeBottom => write!(f, "extreme-bottom"),
            SignalCategory::Rise => write!(f, "rise"),
            SignalCategory::AbsoluteBottom => write!(f, "absolute-bottom"),
            SignalCategory::SeeRise => write!(f, "see-rise"),
            SignalCategory::MustRise => write!(f, "must-rise"),
            SignalCategory::GoldenCross => write!(f, "golden-cross"),
            SignalCategory::BuildPosition => write!(f, "build-position"),
            SignalCategory::Escape => write!(f, "escape"),
            SignalCategory::BottomFishing => write!(f, "bottom-fishing"),
            SignalCategory::MacdGoldenCross => write!(f, "macd-golden-cross"),
            SignalCategory::MacdDeathCross => write!(f, "macd-death-cross"),
            SignalCategory::KdjGoldenCross => write!(f, "kdj-golden-cross"),
            SignalCategory::KdjDeathCross => write!(f, "kdj-death-cross"),
            SignalCategory::PrepareBuy => write!(f, "prepare-buy"),
            SignalCategory::ReadyBuy => write!(f, "ready-buy"),
            SignalCategory::Buy { tier } => write!(f, "buy({})", tier),
            SignalCategory::StarBuy => write!(f, "buy*"),
            SignalCategory::PrepareSell => write!(f, "prepare-sell"),
            SignalCategory::ReadySell => write!(f, "ready-sell"),
            SignalCategory::Sell { tier } => write!(f, "sell({})", tier),
            SignalCategory::StarSell => write!(f, "sell*"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalEvent {
    pub trade_date: u32,
    pub category: SignalCategory,
}

/// Order events by trade date, then by category declaration order.
pub fn sort_events(events: &mut [SignalEvent]) {
    events.sort_by_key(|e| (e.trade_date, e.category));
}
