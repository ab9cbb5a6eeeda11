use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bounds::GeographicBounds;
use crate::prediction::RiskLevel;

/// A single symptom report submitted from the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomReport {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_suspected: Option<String>,
    pub reporter: String,
    pub reported_at: DateTime<Utc>,
}

/// An alert issued over a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub id: String,
    pub title: String,
    pub message: String,
    pub risk_level: RiskLevel,
    pub bounds: GeographicBounds,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl HealthAlert {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }
}

/// Storage schema for user map annotations.
///
/// The listing endpoint for these is a stub that always answers with an
/// empty set; the record shape is kept so ingest and future consumers
/// agree on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapAnnotation {
    pub id: String,
    pub author: String,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_alert_expiry() {
        let now = Utc::now();
        let alert = HealthAlert {
            id: "a1".into(),
            title: "boil water".into(),
            message: "suspected contamination".into(),
            risk_level: RiskLevel::High,
            bounds: GeographicBounds::new(45.0, 40.0, -70.0, -75.0),
            issued_by: "health-dept".into(),
            issued_at: now,
            expires_at: Some(now + Duration::hours(12)),
        };

        assert!(!alert.is_expired(now));
        assert!(alert.is_expired(now + Duration::hours(13)));
    }

    #[test]
    fn test_alert_without_expiry_never_expires() {
        let now = Utc::now();
        let alert = HealthAlert {
            id: "a2".into(),
            title: "advisory".into(),
            message: "monitor symptoms".into(),
            risk_level: RiskLevel::Low,
            bounds: GeographicBounds::new(1.0, 0.0, 1.0, 0.0),
            issued_by: "health-dept".into(),
            issued_at: now,
            expires_at: None,
        };

        assert!(!alert.is_expired(now + Duration::days(365)));
    }
}
