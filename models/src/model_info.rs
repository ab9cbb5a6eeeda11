use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Holdout error for one registered model, measured at its last retrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute error, in cases/day.
    pub mae: f64,
    /// Mean absolute percentage error, in percent.
    pub mape: f64,
    /// Observations the metrics were computed over.
    pub sample_size: usize,
}

/// Catalog entry for a registered forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub trained_at: Option<DateTime<Utc>>,
    pub metrics: Option<ModelMetrics>,
}

/// Row of the performance-metrics listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub model_id: String,
    pub trained_at: Option<DateTime<Utc>>,
    pub metrics: Option<ModelMetrics>,
}

impl From<ModelInfo> for ModelPerformance {
    fn from(info: ModelInfo) -> Self {
        Self {
            model_id: info.id,
            trained_at: info.trained_at,
            metrics: info.metrics,
        }
    }
}
