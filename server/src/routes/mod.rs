//! API route handlers, one module per resource area.

use axum::Json;

pub mod alerts;
pub mod annotations;
pub mod exports;
pub mod outbreaks;
pub mod predictions;
pub mod reports;

pub use models::DataList;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
