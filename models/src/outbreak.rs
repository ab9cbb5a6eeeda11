use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bounds::GeographicBounds;

/// A geographically located aggregate of reported cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutbreakCluster {
    pub id: String,
    pub name: String,
    pub disease_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub case_count: u64,
    /// Severity rating, 1 (minimal) through 5 (critical).
    pub severity: u8,
    /// Reporting confidence in [0, 1].
    pub confidence: f64,
    pub symptoms: Vec<String>,
    pub reported_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

impl OutbreakCluster {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Severity must sit in 1..=5 and confidence in [0, 1].
    pub fn is_valid(&self) -> bool {
        (1..=5).contains(&self.severity)
            && (0.0..=1.0).contains(&self.confidence)
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Search-index projection of a cluster: what the map's search box shows
/// before the full record is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutbreakSummary {
    pub id: String,
    pub name: String,
    pub disease_type: String,
    pub severity: u8,
    pub case_count: u64,
    pub symptoms: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&OutbreakCluster> for OutbreakSummary {
    fn from(cluster: &OutbreakCluster) -> Self {
        Self {
            id: cluster.id.clone(),
            name: cluster.name.clone(),
            disease_type: cluster.disease_type.clone(),
            severity: cluster.severity,
            case_count: cluster.case_count,
            symptoms: cluster.symptoms.clone(),
            latitude: cluster.latitude,
            longitude: cluster.longitude,
        }
    }
}

/// Map filter selection, mirrored by the outbreak list query parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Empty means "all diseases".
    pub disease_types: Vec<String>,
    pub min_severity: Option<u8>,
    pub active_only: bool,
    pub bounds: Option<GeographicBounds>,
    /// Drop clusters reported below this confidence.
    pub confidence_floor: Option<f64>,
}

impl FilterState {
    pub fn matches(&self, cluster: &OutbreakCluster) -> bool {
        if !self.disease_types.is_empty()
            && !self
                .disease_types
                .iter()
                .any(|d| d.eq_ignore_ascii_case(&cluster.disease_type))
        {
            return false;
        }
        if let Some(min) = self.min_severity {
            if cluster.severity < min {
                return false;
            }
        }
        if self.active_only && !cluster.active {
            return false;
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.contains(cluster.latitude, cluster.longitude) {
                return false;
            }
        }
        if let Some(floor) = self.confidence_floor {
            if cluster.confidence < floor {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cluster() -> OutbreakCluster {
        OutbreakCluster {
            id: OutbreakCluster::new_id(),
            name: "riverside cluster".into(),
            disease_type: "influenza".into(),
            latitude: 42.0,
            longitude: -72.0,
            case_count: 120,
            severity: 3,
            confidence: 0.8,
            symptoms: vec!["fever".into(), "cough".into()],
            reported_at: Utc::now(),
            updated_at: Utc::now(),
            active: true,
        }
    }

    #[test]
    fn test_validity() {
        let mut c = cluster();
        assert!(c.is_valid());

        c.severity = 0;
        assert!(!c.is_valid());
        c.severity = 6;
        assert!(!c.is_valid());

        c.severity = 3;
        c.confidence = 1.2;
        assert!(!c.is_valid());
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(FilterState::default().matches(&cluster()));
    }

    #[test]
    fn test_disease_filter_case_insensitive() {
        let filter = FilterState {
            disease_types: vec!["Influenza".into()],
            ..Default::default()
        };
        assert!(filter.matches(&cluster()));

        let filter = FilterState {
            disease_types: vec!["cholera".into()],
            ..Default::default()
        };
        assert!(!filter.matches(&cluster()));
    }

    #[test]
    fn test_severity_and_confidence_floor() {
        let filter = FilterState {
            min_severity: Some(4),
            ..Default::default()
        };
        assert!(!filter.matches(&cluster()));

        let filter = FilterState {
            confidence_floor: Some(0.9),
            ..Default::default()
        };
        assert!(!filter.matches(&cluster()));
    }

    #[test]
    fn test_bounds_filter() {
        let filter = FilterState {
            bounds: Some(GeographicBounds::new(45.0, 40.0, -70.0, -75.0)),
            ..Default::default()
        };
        assert!(filter.matches(&cluster()));

        let filter = FilterState {
            bounds: Some(GeographicBounds::new(10.0, 5.0, 10.0, 5.0)),
            ..Default::default()
        };
        assert!(!filter.matches(&cluster()));
    }

    #[test]
    fn test_active_only() {
        let mut c = cluster();
        c.active = false;

        let filter = FilterState {
            active_only: true,
            ..Default::default()
        };
        assert!(!filter.matches(&c));
    }
}
