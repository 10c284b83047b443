pub mod backtest;
pub mod predictor;

pub use predictor::PredictionEngine;
