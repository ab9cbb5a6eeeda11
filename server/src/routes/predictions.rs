//! Prediction generation and the model-management surface.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};

use forecast::DEFAULT_MODEL_ID;
use models::{
    Event, MlPrediction, ModelInfo, ModelPerformance, PredictionPoint, PredictionRequest,
};

use crate::audit::{authorize, finish};
use crate::auth::{permissions, Identity};
use crate::database;
use crate::error::AppError;
use crate::state::{AppState, SharedState};

use super::DataList;

const RESOURCE: &str = "predictions";
const CONFIDENCE_LEVEL: f64 = 0.95;

/// Cache fingerprint for a request. Bounds are rounded to two decimals so
/// a map nudge of a few meters still hits the cache.
pub fn cache_fingerprint(request: &PredictionRequest) -> String {
    format!(
        "n{:.2}_s{:.2}_e{:.2}_w{:.2}_h{}_d{}",
        request.bounds_north,
        request.bounds_south,
        request.bounds_east,
        request.bounds_west,
        request.horizon_days,
        request.disease_type.as_deref().unwrap_or("any"),
    )
}

/// Validate, forecast, and store one prediction. Shared by the REST
/// handler and the realtime `prediction:request` command; announcing the
/// result on the hub is the caller's job, so a cache hit is announced the
/// same way as a fresh run.
pub async fn generate(
    state: &AppState,
    identity: &Identity,
    request: &PredictionRequest,
) -> Result<MlPrediction, AppError> {
    let bounds = request.validate().map_err(AppError::Validation)?;

    let fingerprint = cache_fingerprint(request);
    if let Some(cached) =
        database::cache_get::<MlPrediction>(state.redis_connection.clone(), &fingerprint).await?
    {
        tracing::debug!(actor = %identity.actor, "Serving cached prediction {}", cached.id);
        return Ok(cached);
    }

    let series = database::series_for_bounds(state.redis_connection.clone(), &bounds).await?;
    let outcome = forecast::run_forecast(
        &series.counts,
        request.horizon_days as usize,
        DEFAULT_MODEL_ID,
        CONFIDENCE_LEVEL,
    )?;

    let first_forecast_day = series
        .last_date()
        .map(|d| d + Duration::days(1))
        .unwrap_or_else(|| Utc::now().date_naive());

    let points = outcome
        .predicted
        .iter()
        .enumerate()
        .map(|(day, &predicted)| PredictionPoint {
            date: first_forecast_day + Duration::days(day as i64),
            predicted_cases: predicted,
            lower_bound: outcome.lower[day],
            upper_bound: outcome.upper[day],
        })
        .collect();

    let prediction = MlPrediction {
        id: MlPrediction::new_id(),
        bounds,
        disease_type: request.disease_type.clone(),
        horizon_days: request.horizon_days,
        points,
        confidence_level: outcome.confidence_level,
        risk_level: outcome.risk_level,
        model_id: outcome.model_id,
        generated_at: Utc::now(),
    };

    database::put_json(
        state.redis_connection.clone(),
        database::PREDICTIONS_KEY,
        &prediction.id,
        &prediction,
    )
    .await?;
    database::cache_put(
        state.redis_connection.clone(),
        &fingerprint,
        &prediction,
        state.config.cache_ttl_secs,
    )
    .await?;

    Ok(prediction)
}

pub async fn create_prediction(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<PredictionRequest>,
) -> Result<(StatusCode, Json<MlPrediction>), AppError> {
    authorize(&state, &identity, permissions::PREDICTIONS_WRITE, "predictions.create", RESOURCE)
        .await?;

    let result = generate(&state, &identity, &request).await;

    finish(&state, &identity, "predictions.create", RESOURCE, result)
        .await
        .map(|prediction| {
            state.hub.publish(Event::PredictionReady(prediction.clone()));
            (StatusCode::CREATED, Json(prediction))
        })
}

pub async fn get_prediction(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<MlPrediction>, AppError> {
    authorize(&state, &identity, permissions::PREDICTIONS_READ, "predictions.get", RESOURCE)
        .await?;

    let prediction: MlPrediction =
        database::get_json(state.redis_connection.clone(), database::PREDICTIONS_KEY, &id)
            .await?
            .ok_or(AppError::NotFound("prediction"))?;

    Ok(Json(prediction))
}

pub async fn list_models(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DataList<ModelInfo>>, AppError> {
    authorize(&state, &identity, permissions::PREDICTIONS_READ, "predictions.models", RESOURCE)
        .await?;

    let models = state.registry.read().await.list();
    Ok(Json(DataList::new(models)))
}

pub async fn retrain_model(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ModelInfo>, AppError> {
    authorize(&state, &identity, permissions::PREDICTIONS_WRITE, "predictions.retrain", RESOURCE)
        .await?;

    let result = async {
        // Retraining uses the widest series available.
        let series =
            database::get_case_series(state.redis_connection.clone(), database::GLOBAL_REGION)
                .await?
                .ok_or(AppError::NotFound("case series"))?;

        let info = state.registry.write().await.retrain(&id, &series.counts)?;
        Ok(info)
    }
    .await;

    finish(&state, &identity, "predictions.retrain", RESOURCE, result)
        .await
        .map(Json)
}

pub async fn performance_metrics(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DataList<ModelPerformance>>, AppError> {
    authorize(&state, &identity, permissions::PREDICTIONS_READ, "predictions.metrics", RESOURCE)
        .await?;

    let models = state.registry.read().await.list();
    let performance = models.into_iter().map(ModelPerformance::from).collect();

    Ok(Json(DataList::new(performance)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PredictionRequest {
        PredictionRequest {
            bounds_north: 45.0,
            bounds_south: 40.0,
            bounds_east: -70.0,
            bounds_west: -75.0,
            horizon_days: 7,
            disease_type: None,
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(cache_fingerprint(&request()), cache_fingerprint(&request()));
    }

    #[test]
    fn test_fingerprint_separates_horizons() {
        let mut other = request();
        other.horizon_days = 14;
        assert_ne!(cache_fingerprint(&request()), cache_fingerprint(&other));
    }

    #[test]
    fn test_fingerprint_separates_diseases() {
        let mut other = request();
        other.disease_type = Some("cholera".into());
        assert_ne!(cache_fingerprint(&request()), cache_fingerprint(&other));
    }

    #[test]
    fn test_fingerprint_rounds_tiny_nudges_together() {
        let mut nudged = request();
        nudged.bounds_north += 0.0001;
        assert_eq!(cache_fingerprint(&request()), cache_fingerprint(&nudged));
    }
}
