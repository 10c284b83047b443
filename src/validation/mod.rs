//! Leakage-free model validation: walk-forward cross-validation,
//! feature-correlation scoring, drift detection, and the accuracy gate the
//! application consults before surfacing a forecast.

use tracing::{debug, info};

use crate::config::{ForecastSettings, ValidationSettings};
use crate::engine::PredictionEngine;
use crate::error::{ForecastError, Result};
use crate::features::FeatureExtractor;
use crate::types::{
    DriftReport, Fold, FoldScore, MetricCorrelation, RawSample, ValidationSummary,
};

/// Orchestrates forecast-quality validation over a prediction engine and a
/// feature extractor. Stateless between calls.
#[derive(Debug, Clone)]
pub struct ModelValidator {
    engine: PredictionEngine,
    features: FeatureExtractor,
    required_accuracy: f64,
    drift_threshold: f64,
    splits: usize,
}

impl Default for ModelValidator {
    fn default() -> Self {
        Self::from_settings(&ForecastSettings::default())
    }
}

impl ModelValidator {
    pub fn new(engine: PredictionEngine, features: FeatureExtractor) -> Self {
        Self::with_settings(engine, features, ValidationSettings::default())
    }

    pub fn with_settings(
        engine: PredictionEngine,
        features: FeatureExtractor,
        settings: ValidationSettings,
    ) -> Self {
        Self {
            engine,
            features,
            required_accuracy: settings.required_accuracy,
            drift_threshold: settings.drift_threshold,
            splits: settings.splits.max(1),
        }
    }

    /// Build the validator and both collaborators from one settings bundle.
    pub fn from_settings(settings: &ForecastSettings) -> Self {
        Self::with_settings(
            PredictionEngine::new(settings.engine.clone()),
            FeatureExtractor::new(settings.features.clone()),
            settings.validation.clone(),
        )
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    /// Partition a clean series into sequential train/test folds.
    ///
    /// Expanding-training / fixed-test walk-forward: the final
    /// `splits × (n / (splits + 1))` samples form the test blocks; each fold
    /// trains on everything strictly before its block. Folds whose training
    /// is shorter than `min_train_size` (default: one test block) are
    /// discarded. Never shuffled.
    pub fn time_series_split(
        &self,
        values: &[f64],
        splits: usize,
        min_train_size: Option<usize>,
    ) -> Result<Vec<Fold>> {
        let n = values.len();
        let no_folds = ForecastError::NoUsableFolds { samples: n, splits };

        if splits == 0 {
            return Err(no_folds);
        }
        let test_len = n / (splits + 1);
        if test_len == 0 {
            return Err(no_folds);
        }
        let min_train = min_train_size.unwrap_or(test_len).max(1);

        let mut folds = Vec::with_capacity(splits);
        for k in 0..splits {
            let test_start = n - (splits - k) * test_len;
            if test_start < min_train {
                continue;
            }
            folds.push(Fold {
                training: values[..test_start].to_vec(),
                testing: values[test_start..test_start + test_len].to_vec(),
            });
        }

        if folds.is_empty() {
            return Err(no_folds);
        }
        Ok(folds)
    }

    /// Cross-validate the engine over walk-forward folds.
    ///
    /// Per fold: forecast the training slice `horizon` steps ahead, score
    /// directional accuracy against training+testing combined and MAPE
    /// against the testing slice alone.
    pub fn backtest(&self, series: &[RawSample], horizon: usize) -> Result<ValidationSummary> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon { horizon });
        }
        let values = self.engine.preprocess_series(series)?;
        let folds = self.time_series_split(&values, self.splits, None)?;

        let mut scores = Vec::with_capacity(folds.len());
        for fold in &folds {
            let forecasts = self.engine.forecast_series(&fold.training, horizon)?;
            let predicted: Vec<f64> = forecasts.iter().map(|p| p.value).collect();

            let mut combined = fold.training.clone();
            combined.extend_from_slice(&fold.testing);

            scores.push(FoldScore {
                accuracy: self.engine.compute_directional_accuracy(&combined, &predicted),
                mape: self.engine.calculate_mape(&fold.testing, &predicted),
                training_size: fold.training.len(),
                testing_size: fold.testing.len(),
            });
        }

        let mean_accuracy =
            scores.iter().map(|s| s.accuracy).sum::<f64>() / scores.len() as f64;
        debug!(
            folds = scores.len(),
            mean_accuracy, "walk-forward validation complete"
        );

        Ok(ValidationSummary {
            folds: scores,
            mean_accuracy,
        })
    }

    /// Correlation strength between each named metric's rolling
    /// moving-average feature and the raw metric series.
    pub fn evaluate_feature_correlation(
        &self,
        series: &[RawSample],
        metric_keys: &[&str],
    ) -> Result<Vec<MetricCorrelation>> {
        let required = self.features.window() + 1;
        let mut results = Vec::with_capacity(metric_keys.len());

        for &key in metric_keys {
            let values = self.metric_series(series, key, required)?;
            let feature = self.features.moving_average(&values);
            results.push(MetricCorrelation {
                metric: key.to_string(),
                correlation: self.features.correlation_strength(&feature, &values),
                samples: values.len(),
            });
        }

        Ok(results)
    }

    /// Compare the latest rolling moving average of a metric across a
    /// historical and a recent window.
    ///
    /// Drift is a relative-threshold heuristic, not a statistical test:
    /// flagged when the shift exceeds `drift_threshold` of the historical
    /// baseline's magnitude (absolute shift when the baseline is zero).
    pub fn detect_drift(
        &self,
        history: &[RawSample],
        recent: &[RawSample],
        metric_key: &str,
    ) -> Result<DriftReport> {
        let window = self.features.window();
        let historical = self.metric_series(history, metric_key, window)?;
        let current = self.metric_series(recent, metric_key, window)?;

        // Both series are at least one window long, so the lookups succeed
        let baseline = self.features.latest_moving_average(&historical).ok_or(
            ForecastError::NonFiniteComputation {
                context: "drift baseline",
            },
        )?;
        let latest = self.features.latest_moving_average(&current).ok_or(
            ForecastError::NonFiniteComputation {
                context: "drift comparison",
            },
        )?;

        let shift = (latest - baseline).abs();
        let drift_magnitude = if baseline.abs() == 0.0 {
            shift
        } else {
            shift / baseline.abs()
        };
        let drift_detected = drift_magnitude > self.drift_threshold;

        if drift_detected {
            info!(
                metric = metric_key,
                drift_magnitude, baseline, latest, "drift detected"
            );
        }

        Ok(DriftReport {
            drift_detected,
            drift_magnitude,
            threshold: self.drift_threshold,
        })
    }

    /// Mean directional accuracy over a horizon-stepped forward walk.
    ///
    /// Each step forecasts from all history before it and scores against
    /// the step's actuals; 0.0 when the series admits no step. This walk is
    /// distinct from `backtest`'s fold scheme.
    pub fn directional_accuracy(&self, series: &[RawSample], horizon: usize) -> Result<f64> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon { horizon });
        }
        let values = self.engine.preprocess_series(series)?;

        let mut accuracies = Vec::new();
        let mut start = self.engine.min_data_points();
        while start + horizon <= values.len() {
            let forecasts = self.engine.forecast_series(&values[..start], horizon)?;
            let predicted: Vec<f64> = forecasts.iter().map(|p| p.value).collect();
            let actual = &values[start..start + horizon];
            accuracies.push(self.engine.compute_directional_accuracy(actual, &predicted));
            start += horizon;
        }

        if accuracies.is_empty() {
            debug!(
                samples = values.len(),
                horizon, "series admits no forward step; accuracy 0"
            );
            return Ok(0.0);
        }
        Ok(accuracies.iter().sum::<f64>() / accuracies.len() as f64)
    }

    /// The gate the application consults before surfacing a forecast.
    pub fn meets_directional_accuracy(&self, series: &[RawSample], horizon: usize) -> Result<bool> {
        let accuracy = self.directional_accuracy(series, horizon)?;
        Ok(accuracy >= self.required_accuracy)
    }

    fn metric_series(
        &self,
        series: &[RawSample],
        metric_key: &str,
        required: usize,
    ) -> Result<Vec<f64>> {
        let values: Vec<f64> = series
            .iter()
            .filter_map(|s| s.metric_value(metric_key))
            .collect();
        if values.len() < required {
            return Err(ForecastError::InsufficientMetricSamples {
                metric: metric_key.to_string(),
                required,
                actual: values.len(),
            });
        }
        Ok(values)
    }
}
