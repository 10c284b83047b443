//! Rolling-window feature engineering over performance series.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FeatureSettings;

/// Windowed statistics at one rolling position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingStats {
    pub mean: f64,
    /// Sample standard deviation of the window.
    pub std_dev: f64,
    /// Last minus first value of the window.
    pub momentum: f64,
}

/// Computes rolling-window statistics and pairwise correlation strength.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    window: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureSettings::default())
    }
}

impl FeatureExtractor {
    pub fn new(settings: FeatureSettings) -> Self {
        Self {
            window: settings.window.max(2),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Statistics for every full trailing window; empty when the series is
    /// shorter than one window.
    pub fn rolling_stats(&self, values: &[f64]) -> Vec<RollingStats> {
        if values.len() < self.window {
            return Vec::new();
        }
        values
            .windows(self.window)
            .map(|w| {
                let n = w.len() as f64;
                let mean = w.iter().sum::<f64>() / n;
                let variance = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
                RollingStats {
                    mean,
                    std_dev: variance.sqrt(),
                    momentum: w[w.len() - 1] - w[0],
                }
            })
            .collect()
    }

    /// Rolling moving-average feature (the mean column of `rolling_stats`).
    pub fn moving_average(&self, values: &[f64]) -> Vec<f64> {
        self.rolling_stats(values).iter().map(|s| s.mean).collect()
    }

    /// Mean of the last full window, if one exists.
    pub fn latest_moving_average(&self, values: &[f64]) -> Option<f64> {
        if values.len() < self.window {
            return None;
        }
        let tail = &values[values.len() - self.window..];
        Some(tail.iter().sum::<f64>() / self.window as f64)
    }

    /// Absolute Pearson correlation over the aligned tails of two series.
    ///
    /// Returns 0.0 for degenerate input (fewer than 2 aligned points, or
    /// zero variance on either side) rather than NaN.
    pub fn correlation_strength(&self, xs: &[f64], ys: &[f64]) -> f64 {
        let n = xs.len().min(ys.len());
        if n < 2 {
            debug!(aligned = n, "correlation degenerate: too few points");
            return 0.0;
        }
        let xs = &xs[xs.len() - n..];
        let ys = &ys[ys.len() - n..];

        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for i in 0..n {
            let dx = xs[i] - mean_x;
            let dy = ys[i] - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        let denom = (var_x * var_y).sqrt();
        if denom == 0.0 {
            debug!("correlation degenerate: zero variance");
            return 0.0;
        }
        (cov / denom).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(window: usize) -> FeatureExtractor {
        FeatureExtractor::new(FeatureSettings { window })
    }

    #[test]
    fn test_rolling_stats_positions() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = extractor(3).rolling_stats(&values);
        assert_eq!(stats.len(), 3);
        assert!((stats[0].mean - 2.0).abs() < 1e-9);
        assert!((stats[2].mean - 4.0).abs() < 1e-9);
        assert!((stats[0].momentum - 2.0).abs() < 1e-9);
        // Sample std of [1,2,3] is 1
        assert!((stats[0].std_dev - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_stats_short_series() {
        assert!(extractor(5).rolling_stats(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_window_floor() {
        assert_eq!(extractor(0).window(), 2);
    }

    #[test]
    fn test_latest_moving_average() {
        let ex = extractor(3);
        let values = vec![1.0, 2.0, 3.0, 6.0, 9.0];
        assert!((ex.latest_moving_average(&values).unwrap() - 6.0).abs() < 1e-9);
        assert!(ex.latest_moving_average(&[1.0]).is_none());
    }

    #[test]
    fn test_correlation_strength_bounds() {
        let ex = extractor(3);
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 + 1.0).collect();
        assert!((ex.correlation_strength(&xs, &ys) - 1.0).abs() < 1e-9);

        // Inverse relationship still reports strength, not sign
        let inv: Vec<f64> = (0..10).map(|i| -2.0 * i as f64).collect();
        assert!((ex.correlation_strength(&xs, &inv) - 1.0).abs() < 1e-9);

        assert_eq!(ex.correlation_strength(&xs, &[5.0; 10]), 0.0);
        assert_eq!(ex.correlation_strength(&[1.0], &[2.0]), 0.0);
    }

    #[test]
    fn test_correlation_aligns_tails() {
        let ex = extractor(3);
        // Different lengths: compare last 3 of each
        let xs = vec![100.0, 1.0, 2.0, 3.0];
        let ys = vec![2.0, 4.0, 6.0];
        assert!((ex.correlation_strength(&xs, &ys) - 1.0).abs() < 1e-9);
    }
}
