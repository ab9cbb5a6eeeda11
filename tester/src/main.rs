use std::fs;

use models::{ClientCommand, GeographicBounds, NewOutbreak, PredictionRequest};

/// Writes sample request payloads for manual curl/websocat runs against a
/// local server.
fn main() {
    let prediction = PredictionRequest {
        bounds_north: 45.0,
        bounds_south: 40.0,
        bounds_east: -70.0,
        bounds_west: -75.0,
        horizon_days: 7,
        disease_type: Some("influenza".to_string()),
    };

    let outbreak = NewOutbreak {
        name: "Test cluster".to_string(),
        disease_type: "influenza".to_string(),
        latitude: 42.38,
        longitude: -72.52,
        case_count: 25,
        severity: 2,
        confidence: 0.6,
        symptoms: vec!["fever".to_string()],
    };

    let subscribe = ClientCommand::MapSubscribe {
        bounds: GeographicBounds::new(45.0, 40.0, -70.0, -75.0),
    };

    fs::write(
        "../prediction.json",
        serde_json::to_string_pretty(&prediction).unwrap(),
    )
    .unwrap();
    fs::write(
        "../outbreak.json",
        serde_json::to_string_pretty(&outbreak).unwrap(),
    )
    .unwrap();
    fs::write(
        "../subscribe.json",
        serde_json::to_string(&subscribe).unwrap(),
    )
    .unwrap();

    println!("{}", serde_json::to_string_pretty(&prediction).unwrap());
}
