//! Map annotations.
//!
//! Listing is intentionally a stub: it authenticates, audits, and answers
//! with an empty set. The record shape lives in the models crate so the
//! eventual implementation and today's consumers agree on it.

use axum::{extract::State, Extension, Json};

use models::{AuditEntry, AuditOutcome, MapAnnotation};

use crate::audit::{authorize, record};
use crate::auth::{permissions, Identity};
use crate::error::AppError;
use crate::state::SharedState;

use super::DataList;

const RESOURCE: &str = "map_annotations";

pub async fn list_annotations(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DataList<MapAnnotation>>, AppError> {
    authorize(&state, &identity, permissions::ANNOTATIONS_READ, "annotations.list", RESOURCE)
        .await?;

    record(
        &state,
        AuditEntry::new(&identity.actor, "annotations.list", RESOURCE, AuditOutcome::Success),
    )
    .await;

    Ok(Json(DataList::empty()))
}
