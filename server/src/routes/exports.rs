//! Data exports.
//!
//! A stub: the call is accepted, audited, and answered with a fixed
//! message. Kept behind the write permission so enabling the real
//! implementation later does not change the contract.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde_json::json;

use models::{AuditEntry, AuditOutcome};

use crate::audit::{authorize, record};
use crate::auth::{permissions, Identity};
use crate::error::AppError;
use crate::state::SharedState;

const RESOURCE: &str = "exports";

pub async fn create_export(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    authorize(&state, &identity, permissions::EXPORTS_WRITE, "exports.create", RESOURCE).await?;

    record(
        &state,
        AuditEntry::new(&identity.actor, "exports.create", RESOURCE, AuditOutcome::Success),
    )
    .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "export generation is not implemented yet" })),
    ))
}
