use serde::{Deserialize, Serialize};

/// One forward forecast step with its 95% confidence bounds.
///
/// Invariants: `lower_ci <= value <= upper_ci`; `variance` is non-negative
/// and non-decreasing in `horizon`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub value: f64,
    pub lower_ci: f64,
    pub upper_ci: f64,
    pub variance: f64,
    /// 1-based steps ahead of the last observation.
    pub horizon: usize,
}

/// One walk-forward train/test partition. Both slices come from a single
/// ordered series with training strictly preceding testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fold {
    pub training: Vec<f64>,
    pub testing: Vec<f64>,
}

/// Forecast quality scores for one fold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldScore {
    /// Directional accuracy in [0, 1].
    pub accuracy: f64,
    /// Mean absolute percentage error against the testing slice, in percent.
    pub mape: f64,
    pub training_size: usize,
    pub testing_size: usize,
}

/// Aggregate cross-validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub folds: Vec<FoldScore>,
    pub mean_accuracy: f64,
}

/// One position of the engine-level sliding backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestWindow {
    /// Index of the first training sample in the clean series.
    pub start: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub windows: Vec<BacktestWindow>,
    pub mean_accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub drift_detected: bool,
    /// Shift of the recent rolling average relative to the historical
    /// baseline's magnitude (absolute shift when the baseline is zero).
    pub drift_magnitude: f64,
    pub threshold: f64,
}

/// Correlation strength between one engineered rolling feature and its raw
/// metric series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCorrelation {
    pub metric: String,
    /// Absolute Pearson correlation in [0, 1].
    pub correlation: f64,
    pub samples: usize,
}
