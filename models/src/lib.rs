//! # Epiwatch Models
//!
//! Shared records between the server, the ingest tool, and the client
//! library. Everything here is a plain serde struct: these are wire and
//! storage shapes, not services.
//!
//! ## Conventions
//!
//! - Ids are UUID v4 strings so they survive any transport untouched.
//! - Timestamps are `chrono::DateTime<Utc>` serialized as RFC 3339.
//! - Realtime frames are `{"event": <name>, "data": <payload>}` — see
//!   [`Event`] and [`ClientCommand`].
//! - List responses wrap their rows in the [`DataList`] envelope.

pub mod audit;
pub mod bounds;
pub mod events;
pub mod identity;
pub mod model_info;
pub mod outbreak;
pub mod payloads;
pub mod prediction;
pub mod reports;
pub mod series;

pub use audit::{AuditEntry, AuditOutcome};
pub use bounds::GeographicBounds;
pub use events::{ClientCommand, Event};
pub use identity::Identity;
pub use model_info::{ModelInfo, ModelMetrics, ModelPerformance};
pub use outbreak::{FilterState, OutbreakCluster, OutbreakSummary};
pub use payloads::{DataList, NewAlert, NewOutbreak, NewReport, OutbreakPatch};
pub use prediction::{MlPrediction, PredictionPoint, PredictionRequest, RiskLevel};
pub use reports::{HealthAlert, MapAnnotation, SymptomReport};
pub use series::CaseSeries;
