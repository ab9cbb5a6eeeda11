//! Symptom report intake. Records only; clustering them into outbreaks is
//! a separate concern this service does not own.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use models::{NewReport, SymptomReport};

use crate::audit::{authorize, finish};
use crate::auth::{permissions, Identity};
use crate::database;
use crate::error::AppError;
use crate::state::SharedState;

use super::DataList;

const RESOURCE: &str = "reports";

pub async fn list_reports(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DataList<SymptomReport>>, AppError> {
    authorize(&state, &identity, permissions::REPORTS_READ, "reports.list", RESOURCE).await?;

    let mut reports: Vec<SymptomReport> =
        database::all_json(state.redis_connection.clone(), database::REPORTS_KEY).await?;
    reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));

    Ok(Json(DataList::new(reports)))
}

pub async fn create_report(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<NewReport>,
) -> Result<(StatusCode, Json<SymptomReport>), AppError> {
    authorize(&state, &identity, permissions::REPORTS_WRITE, "reports.create", RESOURCE).await?;

    let result = async {
        if body.symptoms.is_empty() {
            return Err(AppError::Validation(
                "a report needs at least one symptom".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&body.latitude) || !(-180.0..=180.0).contains(&body.longitude) {
            return Err(AppError::Validation("coordinates out of range".to_string()));
        }

        let report = SymptomReport {
            id: Uuid::new_v4().to_string(),
            latitude: body.latitude,
            longitude: body.longitude,
            symptoms: body.symptoms,
            disease_suspected: body.disease_suspected,
            reporter: identity.actor.clone(),
            reported_at: Utc::now(),
        };

        database::put_json(
            state.redis_connection.clone(),
            database::REPORTS_KEY,
            &report.id,
            &report,
        )
        .await?;
        Ok(report)
    }
    .await;

    finish(&state, &identity, "reports.create", RESOURCE, result)
        .await
        .map(|report| (StatusCode::CREATED, Json(report)))
}
