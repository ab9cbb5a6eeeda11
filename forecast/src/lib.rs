//! # Forecast
//!
//! Case-series forecasting for outbreak regions.
//!
//! The service stores one daily case-count series per region. This crate
//! fits a smoothing model to such a series, projects it over a horizon,
//! wraps the projection in a residual-based confidence band, and labels the
//! result with a qualitative risk level.
//!
//! Two models are registered:
//!
//! - `level-smoothing`: exponential level smoothing, flat projection. For
//!   regions with stable counts.
//! - `trend-smoothing`: level + trend smoothing, linear projection. The
//!   default for epidemic curves.
//!
//! Projections and band edges are clamped at zero; a case count cannot be
//! negative.

pub mod confidence;
pub mod error;
pub mod registry;
pub mod risk;
pub mod smoothing;

pub use confidence::PredictionBand;
pub use error::{ForecastError, Result};
pub use registry::{make_model, ModelRegistry, DEFAULT_MODEL_ID, LEVEL_MODEL_ID, TREND_MODEL_ID};
pub use risk::risk_level;
pub use smoothing::{Forecaster, LevelModel, TrendModel};

use models::RiskLevel;

/// Everything a caller needs to assemble a prediction record.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub predicted: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub confidence_level: f64,
    pub risk_level: RiskLevel,
    pub model_id: String,
}

/// Fit `model_id` to `counts` and project `horizon` days ahead.
pub fn run_forecast(
    counts: &[f64],
    horizon: usize,
    model_id: &str,
    confidence_level: f64,
) -> Result<ForecastOutcome> {
    let mut model = registry::make_model(model_id)?;
    model.fit(counts)?;

    let predicted = model.project(horizon)?;
    let band = PredictionBand::from_residuals(&predicted, model.residuals(), confidence_level);
    let risk = risk_level(model.level(), model.trend_per_day());

    Ok(ForecastOutcome {
        predicted,
        lower: band.lower,
        upper: band.upper,
        confidence_level,
        risk_level: risk,
        model_id: model_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_forecast_end_to_end() {
        let counts: Vec<f64> = (0..14).map(|d| 20.0 + 3.0 * d as f64).collect();
        let outcome = run_forecast(&counts, 7, DEFAULT_MODEL_ID, 0.95).unwrap();

        assert_eq!(outcome.predicted.len(), 7);
        assert_eq!(outcome.lower.len(), 7);
        assert_eq!(outcome.upper.len(), 7);
        for i in 0..7 {
            assert!(outcome.lower[i] <= outcome.predicted[i]);
            assert!(outcome.predicted[i] <= outcome.upper[i]);
        }
    }

    #[test]
    fn test_unknown_model_is_an_error() {
        let counts = vec![1.0, 2.0, 3.0, 4.0];
        assert!(matches!(
            run_forecast(&counts, 3, "gradient-boosted-swarm", 0.95),
            Err(ForecastError::UnknownModel(_))
        ));
    }
}
