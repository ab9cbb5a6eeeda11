use serde::{Deserialize, Serialize};

use crate::bounds::GeographicBounds;
use crate::outbreak::OutbreakCluster;
use crate::prediction::{MlPrediction, PredictionRequest};

/// Server-to-client realtime frame.
///
/// Serialized as `{"event": <name>, "data": <payload>}` so every consumer
/// can dispatch on the name before touching the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
    #[serde(rename = "outbreak:created")]
    OutbreakCreated(OutbreakCluster),
    #[serde(rename = "outbreak:updated")]
    OutbreakUpdated(OutbreakCluster),
    #[serde(rename = "outbreak:deleted")]
    OutbreakDeleted { id: String },
    #[serde(rename = "prediction:ready")]
    PredictionReady(MlPrediction),
    #[serde(rename = "system:maintenance")]
    SystemMaintenance { message: String },
    #[serde(rename = "system:error")]
    SystemError { message: String },
    /// Emitted locally by the realtime client once its reconnect budget is
    /// spent; never sent by the server.
    #[serde(rename = "connection:failed")]
    ConnectionFailed { attempts: u32 },
}

impl Event {
    /// The wire name, for handler registries keyed by event name.
    pub fn name(&self) -> &'static str {
        match self {
            Event::OutbreakCreated(_) => "outbreak:created",
            Event::OutbreakUpdated(_) => "outbreak:updated",
            Event::OutbreakDeleted { .. } => "outbreak:deleted",
            Event::PredictionReady(_) => "prediction:ready",
            Event::SystemMaintenance { .. } => "system:maintenance",
            Event::SystemError { .. } => "system:error",
            Event::ConnectionFailed { .. } => "connection:failed",
        }
    }

    /// Position of the event on the map, when it has one. Used by the
    /// realtime hub to honor map subscriptions.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Event::OutbreakCreated(c) | Event::OutbreakUpdated(c) => {
                Some((c.latitude, c.longitude))
            }
            _ => None,
        }
    }
}

/// Client-to-server realtime frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    #[serde(rename = "map:subscribe")]
    MapSubscribe { bounds: GeographicBounds },
    #[serde(rename = "map:unsubscribe")]
    MapUnsubscribe,
    #[serde(rename = "prediction:request")]
    PredictionRequest(PredictionRequest),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = Event::OutbreakDeleted { id: "abc".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "outbreak:deleted");
        assert_eq!(json["data"]["id"], "abc");
    }

    #[test]
    fn test_event_name_matches_serialization() {
        let event = Event::SystemMaintenance {
            message: "rolling restart".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }

    #[test]
    fn test_command_round_trip() {
        let cmd = ClientCommand::MapSubscribe {
            bounds: GeographicBounds::new(45.0, 40.0, -70.0, -75.0),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: ClientCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
    }

    #[test]
    fn test_unsubscribe_has_no_payload_requirement() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"event":"map:unsubscribe"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::MapUnsubscribe);
    }

    #[test]
    fn test_position_only_for_located_events() {
        let deleted = Event::OutbreakDeleted { id: "x".into() };
        assert!(deleted.position().is_none());
    }
}
