//! Performance forecasting and model validation for fitness coaching.
//!
//! Forecasts a user's future performance metric (lift load, pace) from a
//! historical series using Holt-Winters triple exponential smoothing, and
//! validates forecast quality with leakage-free walk-forward
//! cross-validation, directional-accuracy scoring, and rolling-average
//! drift detection.
//!
//! The storage, UI and routing layers of the application are external
//! collaborators: they inject series as [`RawSample`] lists and consume the
//! reports. All computation is synchronous and recomputed per call; engines
//! and validators hold only their construction-time configuration.

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod trend;
pub mod types;
pub mod validation;

pub use config::{
    EngineProfile, EngineSettings, FeatureSettings, ForecastSettings, ValidationSettings,
};
pub use engine::PredictionEngine;
pub use error::{ForecastError, Result};
pub use features::{FeatureExtractor, RollingStats};
pub use types::*;
pub use validation::ModelValidator;
