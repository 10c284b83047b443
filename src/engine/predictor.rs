//! Holt-Winters triple exponential smoothing over performance histories.
//!
//! Additive model, one pass per call:
//!
//! ```text
//! Level:    L_t = α (x_t - S_{t-m}) + (1 - α)(L_{t-1} + T_{t-1})
//! Trend:    T_t = β (L_t - L_{t-1}) + (1 - β) T_{t-1}
//! Season:   S_t = γ (x_t - L_t) + (1 - γ) S_{t-m}
//! Forecast: F_{t+h} = L_t + h T_t + S_{t-m+h_m}
//! ```
//!
//! Forecast variance grows linearly with the horizon
//! (`residual_variance × h`); this deliberately simple policy is preserved
//! from the product's original engine and is not the innovations
//! state-space variance of full Holt-Winters.

use tracing::{debug, warn};

use crate::config::EngineSettings;
use crate::error::{ForecastError, Result};
use crate::types::{ForecastPoint, RawSample};

const SMOOTHING_MIN: f64 = 0.01;
const SMOOTHING_MAX: f64 = 0.99;
const MIN_SEASON_LENGTH: usize = 3;
const MIN_HISTORY_FLOOR: usize = 12;
/// 95% two-sided normal quantile.
const CI_Z: f64 = 1.96;

/// Forecasts future performance from a historical series.
///
/// Configured once at construction; every call recomputes from its inputs,
/// so a single engine can serve concurrent series.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    alpha: f64,
    beta: f64,
    gamma: f64,
    season_length: usize,
    min_data_points: usize,
    directional_epsilon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Flat,
}

/// Smoothed state after one full pass over a series.
struct FittedModel {
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
    /// One-step-ahead residuals, `actual - fitted` per observation.
    residuals: Vec<f64>,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl PredictionEngine {
    pub fn new(settings: EngineSettings) -> Self {
        let season_length = settings.season_length.max(MIN_SEASON_LENGTH);
        let min_data_points = (2 * season_length)
            .max(settings.min_data_points)
            .max(MIN_HISTORY_FLOOR);
        Self {
            alpha: clamp_constant(settings.alpha, 0.3),
            beta: clamp_constant(settings.beta, 0.1),
            gamma: clamp_constant(settings.gamma, 0.05),
            season_length,
            min_data_points,
            directional_epsilon: settings.directional_epsilon.abs(),
        }
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }

    pub fn min_data_points(&self) -> usize {
        self.min_data_points
    }

    /// Extract an ordered clean series from raw samples.
    ///
    /// Samples without a usable finite primary value are dropped. When every
    /// usable sample carries a timestamp the series is stably sorted by it;
    /// otherwise input order is preserved.
    pub fn preprocess_series(&self, series: &[RawSample]) -> Result<Vec<f64>> {
        let mut usable: Vec<(Option<chrono::DateTime<chrono::Utc>>, f64)> = series
            .iter()
            .filter_map(|s| s.primary_value().map(|v| (s.timestamp(), v)))
            .collect();

        let dropped = series.len() - usable.len();
        if dropped > 0 {
            debug!(dropped, kept = usable.len(), "dropped unusable samples");
        }

        if !usable.is_empty() && usable.iter().all(|(date, _)| date.is_some()) {
            usable.sort_by_key(|(date, _)| *date);
        }

        if usable.len() < self.min_data_points {
            return Err(ForecastError::InsufficientHistory {
                required: self.min_data_points,
                actual: usable.len(),
            });
        }

        Ok(usable.into_iter().map(|(_, v)| v).collect())
    }

    /// Preprocess raw samples and forecast `horizon` steps ahead.
    pub fn predict_performance(
        &self,
        history: &[RawSample],
        horizon: usize,
    ) -> Result<Vec<ForecastPoint>> {
        let values = self.preprocess_series(history)?;
        self.forecast_series(&values, horizon)
    }

    /// Fit and forecast over an already-clean series.
    ///
    /// Public so the validator and batch sweeps can reuse one preprocessing
    /// pass across many fold slices.
    pub fn forecast_series(&self, values: &[f64], horizon: usize) -> Result<Vec<ForecastPoint>> {
        if horizon == 0 {
            return Err(ForecastError::InvalidHorizon { horizon });
        }
        if values.len() < self.min_data_points {
            return Err(ForecastError::InsufficientHistory {
                required: self.min_data_points,
                actual: values.len(),
            });
        }

        let model = self.fit(values)?;
        let base_variance = sample_variance(&model.residuals);
        debug!(
            level = model.level,
            trend = model.trend,
            residual_variance = base_variance,
            "holt-winters fit complete"
        );

        let m = self.season_length;
        let mut forecasts = Vec::with_capacity(horizon);
        for h in 1..=horizon {
            let phase = (values.len() + h - 1) % m;
            let value = model.level + h as f64 * model.trend + model.seasonal[phase];
            let variance =
                self.calculate_forecast_variance(&model.residuals, h, Some(base_variance));
            if !value.is_finite() || !variance.is_finite() {
                return Err(ForecastError::NonFiniteComputation {
                    context: "forecast projection",
                });
            }
            let half_width = CI_Z * variance.sqrt();
            forecasts.push(ForecastPoint {
                value,
                lower_ci: value - half_width,
                upper_ci: value + half_width,
                variance,
                horizon: h,
            });
        }

        Ok(forecasts)
    }

    /// One smoothing pass: seed the state, then walk the series recording
    /// one-step-ahead residuals before each update.
    fn fit(&self, values: &[f64]) -> Result<FittedModel> {
        let m = self.season_length;
        let (mut level, mut trend, mut seasonal) = self.initial_state(values);

        let mut residuals = Vec::with_capacity(values.len());
        for (i, &actual) in values.iter().enumerate() {
            let phase = i % m;
            let fitted = level + trend + seasonal[phase];
            residuals.push(actual - fitted);

            let prev_level = level;
            level = self.alpha * (actual - seasonal[phase])
                + (1.0 - self.alpha) * (prev_level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
            seasonal[phase] = self.gamma * (actual - level) + (1.0 - self.gamma) * seasonal[phase];

            if !level.is_finite() || !trend.is_finite() || !seasonal[phase].is_finite() {
                return Err(ForecastError::NonFiniteComputation {
                    context: "holt-winters state update",
                });
            }
        }

        Ok(FittedModel {
            level,
            trend,
            seasonal,
            residuals,
        })
    }

    /// Seasonal initialization from the first two full seasons, with a
    /// degraded no-seasonality fallback when the series is too short for
    /// them.
    fn initial_state(&self, values: &[f64]) -> (f64, f64, Vec<f64>) {
        let m = self.season_length;
        let full_seasons = values.len() / m;

        if full_seasons < 2 {
            warn!(
                samples = values.len(),
                season_length = m,
                "fewer than two full seasons; modeling without seasonality"
            );
            let trend = if values.len() > 1 {
                values[1] - values[0]
            } else {
                0.0
            };
            return (values[0], trend, vec![0.0; m]);
        }

        let season_mean =
            |s: usize| values[s * m..(s + 1) * m].iter().sum::<f64>() / m as f64;
        let first = season_mean(0);
        let second = season_mean(1);

        let mut seasonal = vec![0.0; m];
        for (phase, factor) in seasonal.iter_mut().enumerate() {
            let deviation: f64 = (0..full_seasons)
                .map(|s| values[s * m + phase] - season_mean(s))
                .sum();
            *factor = deviation / full_seasons as f64;
        }

        (first, (second - first) / m as f64, seasonal)
    }

    /// Residual variance scaled linearly by the horizon.
    ///
    /// Sample variance (n-1 denominator, floored at 1) unless a baseline is
    /// supplied for reuse; result is `base × max(1, horizon)`.
    pub fn calculate_forecast_variance(
        &self,
        residuals: &[f64],
        horizon: usize,
        baseline_variance: Option<f64>,
    ) -> f64 {
        let base = baseline_variance.unwrap_or_else(|| sample_variance(residuals));
        base * horizon.max(1) as f64
    }

    /// Fraction of consecutive pairs whose predicted direction of change
    /// matches the actual direction, with `directional_epsilon` as the flat
    /// dead-zone. Two flats count as a match. 0.0 when no pair is
    /// comparable.
    pub fn compute_directional_accuracy(&self, actual: &[f64], forecast: &[f64]) -> f64 {
        let n = actual.len().min(forecast.len());
        let mut comparable = 0usize;
        let mut correct = 0usize;

        for i in 1..n {
            let true_delta = actual[i] - actual[i - 1];
            let predicted_delta = forecast[i] - actual[i - 1];
            if !true_delta.is_finite() || !predicted_delta.is_finite() {
                continue;
            }
            comparable += 1;
            if self.classify(true_delta) == self.classify(predicted_delta) {
                correct += 1;
            }
        }

        if comparable == 0 {
            0.0
        } else {
            correct as f64 / comparable as f64
        }
    }

    fn classify(&self, delta: f64) -> Direction {
        if delta.abs() < self.directional_epsilon {
            Direction::Flat
        } else if delta > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Mean absolute percentage error, in percent, over aligned positions.
    ///
    /// Positions where the actual value is exactly 0 are skipped; infinity
    /// when no comparable non-zero position exists.
    pub fn calculate_mape(&self, actual: &[f64], forecast: &[f64]) -> f64 {
        let n = actual.len().min(forecast.len());
        let mut sum = 0.0;
        let mut count = 0usize;

        for i in 0..n {
            if actual[i] == 0.0 {
                continue;
            }
            sum += ((actual[i] - forecast[i]) / actual[i]).abs();
            count += 1;
        }

        if count == 0 {
            f64::INFINITY
        } else {
            sum / count as f64 * 100.0
        }
    }

    /// Z-score normalization with sample variance (n-1 denominator, floored
    /// at 1). A constant series maps to all zeros.
    pub fn normalize_series(&self, values: &[f64]) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = sample_variance(values).sqrt();
        if std_dev == 0.0 {
            return vec![0.0; values.len()];
        }
        values.iter().map(|v| (v - mean) / std_dev).collect()
    }
}

fn clamp_constant(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(SMOOTHING_MIN, SMOOTHING_MAX)
    } else {
        fallback
    }
}

fn sample_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let denom = (values.len() - 1).max(1) as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / denom
}
