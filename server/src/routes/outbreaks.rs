//! Outbreak cluster CRUD, search, and the region timeline.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use models::{
    CaseSeries, Event, FilterState, GeographicBounds, NewOutbreak, OutbreakCluster,
    OutbreakPatch, OutbreakSummary,
};

use crate::audit::{authorize, finish};
use crate::auth::{permissions, Identity};
use crate::database;
use crate::error::AppError;
use crate::search;
use crate::state::SharedState;

use super::DataList;

const RESOURCE: &str = "outbreaks";

/// Query parameters mirroring the client's `FilterState`.
#[derive(Debug, Default, Deserialize)]
pub struct OutbreakQuery {
    pub disease_type: Option<String>,
    pub min_severity: Option<u8>,
    pub active_only: Option<bool>,
    pub confidence_floor: Option<f64>,
    pub north: Option<f64>,
    pub south: Option<f64>,
    pub east: Option<f64>,
    pub west: Option<f64>,
}

impl OutbreakQuery {
    /// Bounds require all four edges; a partial box is a caller bug worth
    /// rejecting rather than guessing at.
    pub fn filter(&self) -> Result<FilterState, AppError> {
        let edges = [self.north, self.south, self.east, self.west];
        let present = edges.iter().filter(|e| e.is_some()).count();

        let bounds = match present {
            0 => None,
            4 => {
                let bounds = GeographicBounds::new(
                    self.north.unwrap(),
                    self.south.unwrap(),
                    self.east.unwrap(),
                    self.west.unwrap(),
                );
                if !bounds.is_valid() {
                    return Err(AppError::Validation("bounds out of range".to_string()));
                }
                Some(bounds)
            }
            _ => {
                return Err(AppError::Validation(
                    "bounds need all of north, south, east, west".to_string(),
                ))
            }
        };

        Ok(FilterState {
            disease_types: self.disease_type.iter().cloned().collect(),
            min_severity: self.min_severity,
            active_only: self.active_only.unwrap_or(false),
            bounds,
            confidence_floor: self.confidence_floor,
        })
    }
}

pub async fn list_outbreaks(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<OutbreakQuery>,
) -> Result<Json<DataList<OutbreakCluster>>, AppError> {
    authorize(&state, &identity, permissions::OUTBREAKS_READ, "outbreaks.list", RESOURCE).await?;

    let result = async {
        let filter = query.filter()?;
        let clusters: Vec<OutbreakCluster> =
            database::all_json(state.redis_connection.clone(), database::OUTBREAKS_KEY).await?;

        Ok(clusters
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect::<Vec<_>>())
    }
    .await;

    finish(&state, &identity, "outbreaks.list", RESOURCE, result)
        .await
        .map(|clusters| Json(DataList::new(clusters)))
}

pub async fn get_outbreak(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<OutbreakCluster>, AppError> {
    authorize(&state, &identity, permissions::OUTBREAKS_READ, "outbreaks.get", RESOURCE).await?;

    let cluster: OutbreakCluster =
        database::get_json(state.redis_connection.clone(), database::OUTBREAKS_KEY, &id)
            .await?
            .ok_or(AppError::NotFound("outbreak"))?;

    Ok(Json(cluster))
}

pub async fn create_outbreak(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<NewOutbreak>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&state, &identity, permissions::OUTBREAKS_WRITE, "outbreaks.create", RESOURCE)
        .await?;

    let now = Utc::now();
    let cluster = OutbreakCluster {
        id: OutbreakCluster::new_id(),
        name: body.name,
        disease_type: body.disease_type,
        latitude: body.latitude,
        longitude: body.longitude,
        case_count: body.case_count,
        severity: body.severity,
        confidence: body.confidence,
        symptoms: body.symptoms,
        reported_at: now,
        updated_at: now,
        active: true,
    };

    let result = async {
        if !cluster.is_valid() {
            return Err(AppError::Validation(
                "severity must be 1-5, confidence 0-1, coordinates in range".to_string(),
            ));
        }

        database::put_json(
            state.redis_connection.clone(),
            database::OUTBREAKS_KEY,
            &cluster.id,
            &cluster,
        )
        .await?;
        search::upsert_outbreaks(state.meili_client.clone(), std::slice::from_ref(&cluster))
            .await?;

        state.hub.publish(Event::OutbreakCreated(cluster.clone()));
        Ok(cluster)
    }
    .await;

    finish(&state, &identity, "outbreaks.create", RESOURCE, result)
        .await
        .map(|cluster| (StatusCode::CREATED, Json(cluster)))
}

pub async fn update_outbreak(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<OutbreakPatch>,
) -> Result<Json<OutbreakCluster>, AppError> {
    authorize(&state, &identity, permissions::OUTBREAKS_WRITE, "outbreaks.update", RESOURCE)
        .await?;

    let result = async {
        let mut cluster: OutbreakCluster =
            database::get_json(state.redis_connection.clone(), database::OUTBREAKS_KEY, &id)
                .await?
                .ok_or(AppError::NotFound("outbreak"))?;

        if let Some(name) = body.name {
            cluster.name = name;
        }
        if let Some(case_count) = body.case_count {
            cluster.case_count = case_count;
        }
        if let Some(severity) = body.severity {
            cluster.severity = severity;
        }
        if let Some(confidence) = body.confidence {
            cluster.confidence = confidence;
        }
        if let Some(symptoms) = body.symptoms {
            cluster.symptoms = symptoms;
        }
        if let Some(active) = body.active {
            cluster.active = active;
        }
        cluster.updated_at = Utc::now();

        if !cluster.is_valid() {
            return Err(AppError::Validation(
                "severity must be 1-5, confidence 0-1".to_string(),
            ));
        }

        database::put_json(
            state.redis_connection.clone(),
            database::OUTBREAKS_KEY,
            &cluster.id,
            &cluster,
        )
        .await?;
        search::upsert_outbreaks(state.meili_client.clone(), std::slice::from_ref(&cluster))
            .await?;

        state.hub.publish(Event::OutbreakUpdated(cluster.clone()));
        Ok(cluster)
    }
    .await;

    finish(&state, &identity, "outbreaks.update", RESOURCE, result)
        .await
        .map(Json)
}

pub async fn delete_outbreak(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize(&state, &identity, permissions::OUTBREAKS_WRITE, "outbreaks.delete", RESOURCE)
        .await?;

    let result = async {
        let removed =
            database::delete_field(state.redis_connection.clone(), database::OUTBREAKS_KEY, &id)
                .await?;
        if !removed {
            return Err(AppError::NotFound("outbreak"));
        }

        search::remove_outbreak(state.meili_client.clone(), &id).await?;
        state.hub.publish(Event::OutbreakDeleted { id });
        Ok(())
    }
    .await;

    finish(&state, &identity, "outbreaks.delete", RESOURCE, result)
        .await
        .map(|_| StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub disease_type: Option<String>,
}

pub async fn search_outbreaks(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DataList<OutbreakSummary>>, AppError> {
    authorize(&state, &identity, permissions::OUTBREAKS_READ, "outbreaks.search", RESOURCE)
        .await?;

    let hits = search::search_outbreaks(
        state.meili_client.clone(),
        &query.q,
        query.disease_type.as_deref(),
    )
    .await?;

    Ok(Json(DataList::new(hits)))
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub region: String,
}

/// Stored daily case series for a region; the raw material behind the
/// map's time-lapse playback.
pub async fn region_timeline(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<CaseSeries>, AppError> {
    authorize(&state, &identity, permissions::OUTBREAKS_READ, "outbreaks.timeline", RESOURCE)
        .await?;

    let series = database::get_case_series(state.redis_connection.clone(), &query.region)
        .await?
        .ok_or(AppError::NotFound("case series"))?;

    Ok(Json(series))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_without_bounds() {
        let filter = OutbreakQuery::default().filter().unwrap();
        assert!(filter.bounds.is_none());
        assert!(filter.disease_types.is_empty());
    }

    #[test]
    fn test_query_with_full_bounds() {
        let query = OutbreakQuery {
            north: Some(45.0),
            south: Some(40.0),
            east: Some(-70.0),
            west: Some(-75.0),
            ..Default::default()
        };
        assert!(query.filter().unwrap().bounds.is_some());
    }

    #[test]
    fn test_query_with_partial_bounds_rejected() {
        let query = OutbreakQuery {
            north: Some(45.0),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_query_with_out_of_range_bounds_rejected() {
        let query = OutbreakQuery {
            north: Some(99.0),
            south: Some(40.0),
            east: Some(-70.0),
            west: Some(-75.0),
            ..Default::default()
        };
        assert!(matches!(query.filter(), Err(AppError::Validation(_))));
    }
}
