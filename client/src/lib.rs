//! # Epiwatch Client
//!
//! Consumer library for the epiwatch backend: a typed REST client and a
//! realtime subscription client.
//!
//! ## Overall Payloads
//!
//! Everything on the wire is the JSON shapes from the models crate. List
//! responses arrive in the `{"data": [...]}` envelope; realtime frames are
//! `{"event": <name>, "data": <payload>}`.
//!
//! ## Auth
//!
//! - REST: `Authorization: Bearer <token>` on every call
//! - Realtime: the same token as a `?token=` query parameter at dial time
//! - Any 401 clears the stored token once and fires the registered
//!   `on_unauthorized` hook; what "go to login" means is the consumer's
//!   decision

pub mod api;
pub mod error;
pub mod realtime;

pub use api::ApiClient;
pub use error::ApiError;
pub use realtime::RealtimeClient;
