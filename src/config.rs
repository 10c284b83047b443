use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    pub engine: EngineSettings,
    pub features: FeatureSettings,
    pub validation: ValidationSettings,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            features: FeatureSettings::default(),
            validation: ValidationSettings::default(),
        }
    }
}

impl ForecastSettings {
    /// Parse settings from a TOML document and reject hard inconsistencies.
    ///
    /// Out-of-range smoothing constants are not rejected here; the engine
    /// clamps them at construction.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw).map_err(|e| ForecastError::InvalidSettings {
            reason: e.to_string(),
        })?;
        settings
            .validate()
            .map_err(|errors| ForecastError::InvalidSettings {
                reason: errors.join(", "),
            })?;
        Ok(settings)
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.validation.required_accuracy) {
            errors.push("required_accuracy must be between 0 and 1".to_string());
        }
        if !self.validation.drift_threshold.is_finite() || self.validation.drift_threshold <= 0.0 {
            errors.push("drift_threshold must be > 0".to_string());
        }
        if self.validation.splits == 0 {
            errors.push("splits must be > 0".to_string());
        }
        if self.features.window == 0 {
            errors.push("feature window must be > 0".to_string());
        }
        if !self.engine.directional_epsilon.is_finite() || self.engine.directional_epsilon < 0.0 {
            errors.push("directional_epsilon must be >= 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Construction-time smoothing configuration for the prediction engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Level smoothing constant, clamped into [0.01, 0.99].
    pub alpha: f64,
    /// Trend smoothing constant, clamped into [0.01, 0.99].
    pub beta: f64,
    /// Seasonal smoothing constant, clamped into [0.01, 0.99].
    pub gamma: f64,
    /// Samples per repeating cycle, floored at 3.
    pub season_length: usize,
    /// Configured minimum history length. The effective minimum is
    /// `max(2 * season_length, min_data_points, 12)`.
    pub min_data_points: usize,
    /// Magnitude below which a change counts as flat.
    pub directional_epsilon: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.05,
            season_length: 7,
            min_data_points: 12,
            directional_epsilon: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// Rolling window length for engineered features, floored at 2.
    pub window: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self { window: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Mean directional accuracy required to surface a forecast.
    pub required_accuracy: f64,
    /// Relative shift of the rolling average that counts as drift.
    pub drift_threshold: f64,
    /// Number of walk-forward folds.
    pub splits: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            required_accuracy: 0.75,
            drift_threshold: 0.15,
            splits: 3,
        }
    }
}

/// Named smoothing presets for common coaching situations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineProfile {
    /// Default weighting; tracks week-scale seasonality without chasing
    /// single-session noise.
    Balanced,
    /// Reacts quickly to recent sessions; wider swings in the forecast.
    Responsive,
    /// Heavily smoothed; for athletes with noisy day-to-day numbers.
    Stable,
}

impl EngineProfile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Responsive => "Responsive",
            Self::Stable => "Stable",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Balanced => "Default weighting for weekly training cycles.",
            Self::Responsive => "Fast reaction to recent sessions, wider forecast swings.",
            Self::Stable => "Heavy smoothing for noisy day-to-day performance.",
        }
    }

    pub fn settings(&self) -> EngineSettings {
        match self {
            Self::Balanced => EngineSettings::default(),
            Self::Responsive => EngineSettings {
                alpha: 0.5,
                beta: 0.2,
                gamma: 0.1,
                ..EngineSettings::default()
            },
            Self::Stable => EngineSettings {
                alpha: 0.15,
                beta: 0.05,
                gamma: 0.02,
                ..EngineSettings::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ForecastSettings::default().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let settings = ForecastSettings {
            validation: ValidationSettings {
                required_accuracy: 1.5,
                drift_threshold: 0.0,
                splits: 0,
            },
            ..ForecastSettings::default()
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_from_toml_str() {
        let settings = ForecastSettings::from_toml_str(
            r#"
            [engine]
            alpha = 0.4
            beta = 0.1
            gamma = 0.05
            season_length = 7
            min_data_points = 12
            directional_epsilon = 0.5

            [features]
            window = 4

            [validation]
            required_accuracy = 0.8
            drift_threshold = 0.15
            splits = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings.engine.alpha, 0.4);
        assert_eq!(settings.features.window, 4);

        assert!(ForecastSettings::from_toml_str("not toml at all [").is_err());
    }

    #[test]
    fn test_profiles_differ_in_reactivity() {
        let responsive = EngineProfile::Responsive.settings();
        let stable = EngineProfile::Stable.settings();
        assert!(responsive.alpha > stable.alpha);
        assert_eq!(EngineProfile::Balanced.settings().season_length, 7);
    }
}
