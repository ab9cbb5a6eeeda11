//! Model registry: the catalog behind the model listing, retraining, and
//! performance-metrics operations.

use std::collections::HashMap;

use chrono::Utc;
use models::{ModelInfo, ModelMetrics};

use crate::error::{ForecastError, Result};
use crate::smoothing::{Forecaster, LevelModel, TrendModel};

pub const LEVEL_MODEL_ID: &str = "level-smoothing";
pub const TREND_MODEL_ID: &str = "trend-smoothing";
pub const DEFAULT_MODEL_ID: &str = TREND_MODEL_ID;

/// Smoothing parameters shared by every instantiation of the built-ins.
const ALPHA: f64 = 0.4;
const BETA: f64 = 0.2;

/// Instantiate a registered model by id.
pub fn make_model(model_id: &str) -> Result<Box<dyn Forecaster>> {
    match model_id {
        LEVEL_MODEL_ID => Ok(Box::new(LevelModel::new(ALPHA)?)),
        TREND_MODEL_ID => Ok(Box::new(TrendModel::new(ALPHA, BETA)?)),
        other => Err(ForecastError::UnknownModel(other.to_string())),
    }
}

/// Catalog of registered models and their last-known metrics.
pub struct ModelRegistry {
    models: HashMap<String, ModelInfo>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        let mut models = HashMap::new();
        for (id, name) in [
            (LEVEL_MODEL_ID, "Exponential level smoothing"),
            (TREND_MODEL_ID, "Level and trend smoothing"),
        ] {
            models.insert(
                id.to_string(),
                ModelInfo {
                    id: id.to_string(),
                    name: name.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    trained_at: None,
                    metrics: None,
                },
            );
        }
        Self { models }
    }

    pub fn list(&self) -> Vec<ModelInfo> {
        let mut infos: Vec<ModelInfo> = self.models.values().cloned().collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub fn get(&self, model_id: &str) -> Result<&ModelInfo> {
        self.models
            .get(model_id)
            .ok_or_else(|| ForecastError::UnknownModel(model_id.to_string()))
    }

    /// Refit `model_id` on `counts` with an 80/20 holdout split and refresh
    /// its metrics. Needs enough data for both the fit minimum and at least
    /// one holdout point.
    pub fn retrain(&mut self, model_id: &str, counts: &[f64]) -> Result<ModelInfo> {
        if !self.models.contains_key(model_id) {
            return Err(ForecastError::UnknownModel(model_id.to_string()));
        }

        let split = (counts.len() * 4) / 5;
        let holdout = &counts[split..];
        if split < 3 || holdout.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 5,
                actual: counts.len(),
            });
        }

        let mut model = make_model(model_id)?;
        model.fit(&counts[..split])?;
        let projected = model.project(holdout.len())?;

        let metrics = holdout_metrics(&projected, holdout);

        let info = self
            .models
            .get_mut(model_id)
            .ok_or_else(|| ForecastError::UnknownModel(model_id.to_string()))?;
        info.trained_at = Some(Utc::now());
        info.metrics = Some(metrics);
        Ok(info.clone())
    }
}

fn holdout_metrics(projected: &[f64], actual: &[f64]) -> ModelMetrics {
    let n = actual.len() as f64;
    let mae = projected
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / n;
    let mape = projected
        .iter()
        .zip(actual)
        .map(|(p, a)| ((p - a) / a.max(1.0)).abs())
        .sum::<f64>()
        / n
        * 100.0;

    ModelMetrics {
        mae,
        mape,
        sample_size: actual.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_builtins() {
        let registry = ModelRegistry::new();
        let ids: Vec<String> = registry.list().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![LEVEL_MODEL_ID, TREND_MODEL_ID]);
    }

    #[test]
    fn test_fresh_models_are_untrained() {
        let registry = ModelRegistry::new();
        let info = registry.get(TREND_MODEL_ID).unwrap();
        assert!(info.trained_at.is_none());
        assert!(info.metrics.is_none());
    }

    #[test]
    fn test_retrain_refreshes_metrics() {
        let mut registry = ModelRegistry::new();
        let counts: Vec<f64> = (0..20).map(|d| 30.0 + 2.0 * d as f64).collect();

        let info = registry.retrain(TREND_MODEL_ID, &counts).unwrap();
        assert!(info.trained_at.is_some());
        let metrics = info.metrics.unwrap();
        assert!(metrics.mae >= 0.0);
        assert_eq!(metrics.sample_size, 4);

        // Registry keeps the refreshed state.
        assert!(registry.get(TREND_MODEL_ID).unwrap().metrics.is_some());
    }

    #[test]
    fn test_retrain_unknown_model() {
        let mut registry = ModelRegistry::new();
        assert!(matches!(
            registry.retrain("nope", &[1.0; 20]),
            Err(ForecastError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_retrain_needs_enough_data() {
        let mut registry = ModelRegistry::new();
        assert!(matches!(
            registry.retrain(TREND_MODEL_ID, &[1.0, 2.0, 3.0]),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_make_model_unknown_id() {
        assert!(make_model("arima-9000").is_err());
    }
}
