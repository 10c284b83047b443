use thiserror::Error;

/// Errors surfaced by the forecasting and validation engines.
///
/// Every public operation either returns a fully valid result or one of
/// these; there are no partial or best-effort return values. Out-of-range
/// smoothing constants are clamped at construction and never error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("insufficient history: {actual} usable samples, need at least {required}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("forecast horizon must be at least 1 step, got {horizon}")]
    InvalidHorizon { horizon: usize },

    #[error("cannot form a usable train/test fold from {samples} samples with {splits} splits")]
    NoUsableFolds { samples: usize, splits: usize },

    #[error("metric '{metric}' has {actual} usable samples, need at least {required}")]
    InsufficientMetricSamples {
        metric: String,
        required: usize,
        actual: usize,
    },

    #[error("computation left the finite domain during {context}")]
    NonFiniteComputation { context: &'static str },

    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },
}

pub type Result<T> = std::result::Result<T, ForecastError>;
