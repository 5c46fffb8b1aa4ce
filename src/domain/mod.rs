//! Core domain types and computation.

pub mod bar;
pub mod batch;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod incremental;
pub mod indicator;
pub mod pipeline;
pub mod series;
pub mod signal;
