//! Request bodies and response envelopes shared by the server and the
//! client library, so both sides agree on the wire without a schema file.

use serde::{Deserialize, Serialize};

use crate::prediction::RiskLevel;

/// Standard list envelope: `{"data": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataList<T> {
    pub data: Vec<T>,
}

impl<T> DataList<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }

    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }
}

/// Body of `POST /api/v1/outbreaks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOutbreak {
    pub name: String,
    pub disease_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub case_count: u64,
    pub severity: u8,
    pub confidence: f64,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

/// Body of `PUT /api/v1/outbreaks/{id}`; absent fields keep their stored
/// values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutbreakPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Body of `POST /api/v1/reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub latitude: f64,
    pub longitude: f64,
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_suspected: Option<String>,
}

/// Body of `POST /api/v1/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    pub risk_level: RiskLevel,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let list = DataList::new(vec![1u32, 2, 3]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"{"data":[1,2,3]}"#);
        let back: DataList<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_patch_defaults_to_no_changes() {
        let patch: OutbreakPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch, OutbreakPatch::default());
    }

    #[test]
    fn test_new_outbreak_symptoms_optional_on_wire() {
        let body: NewOutbreak = serde_json::from_str(
            r#"{"name":"n","disease_type":"d","latitude":1.0,"longitude":2.0,
                "case_count":3,"severity":2,"confidence":0.5}"#,
        )
        .unwrap();
        assert!(body.symptoms.is_empty());
    }
}
