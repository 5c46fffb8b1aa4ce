//! kline-signals: technical indicator and signal engine for OHLCV bars.
//!
//! Hexagonal architecture: pure computation in [`domain`], port traits in
//! [`ports`], storage and config implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
