use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::types::{BacktestReport, BacktestWindow, RawSample};

use super::predictor::PredictionEngine;

impl PredictionEngine {
    /// Slide a training window of `min_data_points` samples across the
    /// series one step at a time, forecasting `horizon` steps from each
    /// position and scoring directional accuracy against the actuals that
    /// follow the window.
    pub fn backtest_performance(
        &self,
        series: &[RawSample],
        horizon: usize,
    ) -> Result<BacktestReport> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon { horizon });
        }
        let values = self.preprocess_series(series)?;
        self.backtest_values(&values, horizon)
    }

    pub(crate) fn backtest_values(&self, values: &[f64], horizon: usize) -> Result<BacktestReport> {
        let window = self.min_data_points();
        let needed = window + horizon;
        if values.len() < needed {
            return Err(ForecastError::InsufficientHistory {
                required: needed,
                actual: values.len(),
            });
        }

        let mut windows = Vec::with_capacity(values.len() - needed + 1);
        for start in 0..=values.len() - needed {
            let training = &values[start..start + window];
            let forecasts = self.forecast_series(training, horizon)?;
            let predicted: Vec<f64> = forecasts.iter().map(|p| p.value).collect();
            let actual = &values[start + window..start + window + horizon];

            windows.push(BacktestWindow {
                start,
                accuracy: self.compute_directional_accuracy(actual, &predicted),
            });
        }

        let mean_accuracy =
            windows.iter().map(|w| w.accuracy).sum::<f64>() / windows.len() as f64;
        debug!(
            windows = windows.len(),
            mean_accuracy, "sliding backtest complete"
        );

        Ok(BacktestReport {
            windows,
            mean_accuracy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_series(len: usize) -> Vec<RawSample> {
        (0..len)
            .map(|i| RawSample::scalar(100.0 + 1.5 * i as f64 + if i % 2 == 0 { 1.0 } else { -1.0 }))
            .collect()
    }

    #[test]
    fn test_backtest_window_count() {
        let engine = PredictionEngine::default();
        // 20 samples, window 14, horizon 3: positions 0..=3
        let report = engine
            .backtest_performance(&trending_series(20), 3)
            .unwrap();
        assert_eq!(report.windows.len(), 4);
        assert_eq!(report.windows[0].start, 0);
        assert_eq!(report.windows[3].start, 3);
        for w in &report.windows {
            assert!((0.0..=1.0).contains(&w.accuracy));
        }
        assert!((0.0..=1.0).contains(&report.mean_accuracy));
    }

    #[test]
    fn test_backtest_requires_window_plus_horizon() {
        let engine = PredictionEngine::default();
        let err = engine
            .backtest_performance(&trending_series(15), 3)
            .unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientHistory {
                required: 17,
                actual: 15
            }
        );
    }

    #[test]
    fn test_backtest_rejects_zero_horizon() {
        let engine = PredictionEngine::default();
        assert_eq!(
            engine
                .backtest_performance(&trending_series(20), 0)
                .unwrap_err(),
            ForecastError::InvalidHorizon { horizon: 0 }
        );
    }
}
