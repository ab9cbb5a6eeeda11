//! Health alerts over a region.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use models::{GeographicBounds, HealthAlert, NewAlert};

use crate::audit::{authorize, finish};
use crate::auth::{permissions, Identity};
use crate::database;
use crate::error::AppError;
use crate::state::SharedState;

use super::DataList;

const RESOURCE: &str = "alerts";

/// Active (unexpired) alerts, newest first.
pub async fn list_alerts(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DataList<HealthAlert>>, AppError> {
    authorize(&state, &identity, permissions::ALERTS_READ, "alerts.list", RESOURCE).await?;

    let now = Utc::now();
    let mut alerts: Vec<HealthAlert> =
        database::all_json(state.redis_connection.clone(), database::ALERTS_KEY).await?;
    alerts.retain(|alert| !alert.is_expired(now));
    alerts.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));

    Ok(Json(DataList::new(alerts)))
}

pub async fn create_alert(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<NewAlert>,
) -> Result<(StatusCode, Json<HealthAlert>), AppError> {
    authorize(&state, &identity, permissions::ALERTS_WRITE, "alerts.create", RESOURCE).await?;

    let result = async {
        let bounds = GeographicBounds::new(body.north, body.south, body.east, body.west);
        if !bounds.is_valid() {
            return Err(AppError::Validation("bounds out of range".to_string()));
        }
        if body.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }

        let alert = HealthAlert {
            id: Uuid::new_v4().to_string(),
            title: body.title,
            message: body.message,
            risk_level: body.risk_level,
            bounds,
            issued_by: identity.actor.clone(),
            issued_at: Utc::now(),
            expires_at: body.expires_at,
        };

        database::put_json(
            state.redis_connection.clone(),
            database::ALERTS_KEY,
            &alert.id,
            &alert,
        )
        .await?;
        Ok(alert)
    }
    .await;

    finish(&state, &identity, "alerts.create", RESOURCE, result)
        .await
        .map(|alert| (StatusCode::CREATED, Json(alert)))
}
