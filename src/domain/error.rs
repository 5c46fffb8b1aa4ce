//! Domain error types.
//!
//! Insufficient history is not an error: pipelines report it through
//! [`PipelineOutcome`](crate::domain::pipeline::PipelineOutcome). Zero-width
//! bands and zero prices are resolved by neutral substitution and never
//! surface here either.

/// Top-level error type for kline-signals.
#[derive(Debug, thiserror::Error)]
pub enum KlineError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("trade dates not strictly increasing at index {index}: {previous} then {current}")]
    NonMonotonicDates {
        index: usize,
        previous: u32,
        current: u32,
    },

    #[error("invalid trade date {value} (expected YYYYMMDD)")]
    InvalidTradeDate { value: u32 },

    #[error("no bars for {symbol}")]
    NoData { symbol: String },

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&KlineError> for std::process::ExitCode {
    fn from(err: &KlineError) -> Self {
        let code: u8 = match err {
            KlineError::Io(_) => 1,
            KlineError::ConfigParse { .. }
            | KlineError::ConfigMissing { .. }
            | KlineError::ConfigInvalid { .. } => 2,
            KlineError::Database { .. } | KlineError::DatabaseQuery { .. } => 3,
            KlineError::NonMonotonicDates { .. } | KlineError::InvalidTradeDate { .. } => 4,
            KlineError::NoData { .. } => 5,
            KlineError::WorkerPool { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
