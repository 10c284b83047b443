use serde::{Deserialize, Serialize};
use tracing::debug;

use super::smoothing::coefficient_of_variation;

/// Ordinary least squares summary over `(x, y)` pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionSummary {
    pub slope: f64,
    pub intercept: f64,
    pub r2: f64,
    pub standard_error: f64,
    pub mean_x: f64,
    pub mean_y: f64,
}

impl RegressionSummary {
    /// Degenerate fit returned for fewer than 2 usable points or a vertical
    /// line. Callers treat this as "insufficient signal", not an error.
    fn degenerate(mean_x: f64, mean_y: f64) -> Self {
        Self {
            slope: 0.0,
            intercept: mean_y,
            r2: 0.0,
            standard_error: 0.0,
            mean_x,
            mean_y,
        }
    }
}

/// Least-squares line through the finite points of `points`.
///
/// Pairs with any non-finite coordinate are filtered out first.
pub fn linear_regression(points: &[(f64, f64)]) -> RegressionSummary {
    let usable: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    if usable.len() < 2 {
        let (mean_x, mean_y) = usable.first().copied().unwrap_or((0.0, 0.0));
        debug!(points = usable.len(), "regression under-determined");
        return RegressionSummary::degenerate(mean_x, mean_y);
    }

    let n = usable.len() as f64;
    let mean_x = usable.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = usable.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = usable.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = usable
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    if sxx == 0.0 {
        debug!("regression degenerate: zero x-variance");
        return RegressionSummary::degenerate(mean_x, mean_y);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = usable
        .iter()
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let ss_tot: f64 = usable.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();

    let r2 = if ss_tot == 0.0 {
        // Constant y: no variance to explain
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };
    let standard_error = (ss_res / (n - 2.0).max(1.0)).sqrt();

    RegressionSummary {
        slope,
        intercept,
        r2,
        standard_error,
        mean_x,
        mean_y,
    }
}

/// Slope of each length-`window` sliding window of `points`.
///
/// Empty when `window < 2` or there are fewer points than `window`.
pub fn rolling_slopes(points: &[(f64, f64)], window: usize) -> Vec<f64> {
    if window < 2 || points.len() < window {
        return Vec::new();
    }
    points
        .windows(window)
        .map(|w| linear_regression(w).slope)
        .collect()
}

/// Change-point / plateau judgment over a value series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateauSummary {
    pub is_plateau: bool,
    pub mean_slope: f64,
    /// Coefficient of variation of the raw values.
    pub variation: f64,
}

const PLATEAU_MAX_VARIATION: f64 = 0.05;

/// Flags a plateau when every rolling slope stays inside the dead-zone and
/// the series' relative variation is small. Consumed by the coaching
/// messaging layer.
pub fn plateau_summary(values: &[f64], window: usize, slope_epsilon: f64) -> PlateauSummary {
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();
    let slopes = rolling_slopes(&points, window);
    let variation = coefficient_of_variation(values);

    if slopes.is_empty() {
        return PlateauSummary {
            is_plateau: false,
            mean_slope: 0.0,
            variation,
        };
    }

    let mean_slope = slopes.iter().sum::<f64>() / slopes.len() as f64;
    let is_plateau = slopes.iter().all(|s| s.abs() < slope_epsilon)
        && variation.abs() < PLATEAU_MAX_VARIATION;

    PlateauSummary {
        is_plateau,
        mean_slope,
        variation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_exact_line() {
        // y = 2x + 1
        let points: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let fit = linear_regression(&points);
        assert!((fit.slope - 2.0).abs() < 1e-9, "slope = {}", fit.slope);
        assert!(
            (fit.intercept - 1.0).abs() < 1e-9,
            "intercept = {}",
            fit.intercept
        );
        assert!((fit.r2 - 1.0).abs() < 1e-9, "r2 = {}", fit.r2);
        assert!(fit.standard_error < 1e-9);
    }

    #[test]
    fn test_regression_filters_non_finite() {
        let points = vec![
            (0.0, 1.0),
            (f64::NAN, 5.0),
            (1.0, 3.0),
            (2.0, f64::INFINITY),
            (2.0, 5.0),
        ];
        let fit = linear_regression(&points);
        assert!((fit.slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_degenerate_inputs() {
        let single = linear_regression(&[(3.0, 7.0)]);
        assert_eq!(single.slope, 0.0);
        assert_eq!(single.intercept, 7.0);

        let empty = linear_regression(&[]);
        assert_eq!(empty.slope, 0.0);
        assert_eq!(empty.intercept, 0.0);

        // Vertical line: zero x-variance
        let vertical = linear_regression(&[(1.0, 2.0), (1.0, 4.0)]);
        assert_eq!(vertical.slope, 0.0);
        assert!((vertical.intercept - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_slopes_window_handling() {
        let points: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, 3.0 * i as f64)).collect();
        let slopes = rolling_slopes(&points, 3);
        assert_eq!(slopes.len(), 4);
        for s in &slopes {
            assert!((s - 3.0).abs() < 1e-9);
        }

        assert!(rolling_slopes(&points, 7).is_empty());
        assert!(rolling_slopes(&points, 1).is_empty());
    }

    #[test]
    fn test_plateau_detection() {
        let flat = vec![100.0, 100.4, 99.8, 100.1, 99.9, 100.2, 100.0, 99.7];
        let summary = plateau_summary(&flat, 4, 0.5);
        assert!(summary.is_plateau);

        let rising: Vec<f64> = (0..8).map(|i| 100.0 + 3.0 * i as f64).collect();
        let summary = plateau_summary(&rising, 4, 0.5);
        assert!(!summary.is_plateau);
        assert!(summary.mean_slope > 2.0);

        let short = plateau_summary(&[100.0, 100.0], 4, 0.5);
        assert!(!short.is_plateau);
    }
}
