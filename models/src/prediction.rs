use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bounds::GeographicBounds;

pub const MIN_HORIZON_DAYS: u32 = 1;
pub const MAX_HORIZON_DAYS: u32 = 30;
pub const DEFAULT_HORIZON_DAYS: u32 = 7;

/// One forecast day with its confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub predicted_cases: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Qualitative risk label attached to a forecast.
///
/// Ordered: `Low < Moderate < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

/// A generated forecast over a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlPrediction {
    pub id: String,
    pub bounds: GeographicBounds,
    pub disease_type: Option<String>,
    pub horizon_days: u32,
    pub points: Vec<PredictionPoint>,
    pub confidence_level: f64,
    pub risk_level: RiskLevel,
    pub model_id: String,
    pub generated_at: DateTime<Utc>,
}

impl MlPrediction {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Body of `POST /api/v1/predictions` and of the `prediction:request`
/// realtime command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub bounds_north: f64,
    pub bounds_south: f64,
    pub bounds_east: f64,
    pub bounds_west: f64,
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_type: Option<String>,
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_DAYS
}

impl PredictionRequest {
    pub fn bounds(&self) -> GeographicBounds {
        GeographicBounds::new(
            self.bounds_north,
            self.bounds_south,
            self.bounds_east,
            self.bounds_west,
        )
    }

    /// Range-check every field; returns the validated bounds.
    pub fn validate(&self) -> Result<GeographicBounds, String> {
        let bounds = self.bounds();
        if !bounds.is_valid() {
            return Err(format!(
                "bounds out of range: north={} south={} east={} west={}",
                self.bounds_north, self.bounds_south, self.bounds_east, self.bounds_west
            ));
        }
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(format!(
                "horizon_days must be between {} and {}, got {}",
                MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, self.horizon_days
            ));
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PredictionRequest {
        PredictionRequest {
            bounds_north: 45.0,
            bounds_south: 40.0,
            bounds_east: -70.0,
            bounds_west: -75.0,
            horizon_days: 7,
            disease_type: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_horizon_bounds() {
        let mut req = request();
        req.horizon_days = 0;
        assert!(req.validate().is_err());

        req.horizon_days = 31;
        assert!(req.validate().is_err());

        req.horizon_days = 1;
        assert!(req.validate().is_ok());
        req.horizon_days = 30;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_latitude_range() {
        let mut req = request();
        req.bounds_north = 90.5;
        assert!(req.validate().is_err());

        req.bounds_north = 45.0;
        req.bounds_south = -91.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_longitude_range() {
        let mut req = request();
        req.bounds_east = 180.5;
        assert!(req.validate().is_err());

        req.bounds_east = -70.0;
        req.bounds_west = -200.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_horizon_defaults_to_seven() {
        let req: PredictionRequest = serde_json::from_str(
            r#"{"bounds_north":45.0,"bounds_south":40.0,"bounds_east":-70.0,"bounds_west":-75.0}"#,
        )
        .unwrap();
        assert_eq!(req.horizon_days, DEFAULT_HORIZON_DAYS);
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Moderate);
        assert!(RiskLevel::Moderate < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_risk_level_wire_names() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"critical\""
        );
    }
}
