//! Typed REST client.
//!
//! One error policy lives here, not in callers: a 401 from any endpoint
//! clears the stored token (exactly once per response) and fires the
//! `on_unauthorized` hook; every other non-success status becomes
//! [`ApiError::Status`] with a best-effort message pulled from the JSON
//! error body.

use std::sync::{Arc, Mutex};

use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use models::{
    CaseSeries, DataList, FilterState, HealthAlert, MapAnnotation, MlPrediction, ModelInfo,
    ModelPerformance, NewAlert, NewOutbreak, NewReport, OutbreakCluster, OutbreakPatch,
    OutbreakSummary, PredictionRequest, SymptomReport,
};

use crate::error::ApiError;

type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Mutex<Option<String>>,
    on_unauthorized: Mutex<Option<UnauthorizedHook>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Mutex::new(None),
            on_unauthorized: Mutex::new(None),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.lock().unwrap() = Some(token.into());
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    /// Register what "redirect to login" means for this consumer.
    pub fn on_unauthorized(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_unauthorized.lock().unwrap() = Some(Arc::new(hook));
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Apply the central 401/error policy to a raw response.
    async fn check(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_error_message(status, &body),
            });
        }
        Ok(response)
    }

    /// Clear the stored token. `take` makes the clearing idempotent: a
    /// second 401 on a parallel call finds nothing left to clear.
    fn handle_unauthorized(&self) {
        if self.token.lock().unwrap().take().is_some() {
            debug!("Cleared stored token after 401");
        }
        let hook = self.on_unauthorized.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(self.url(path)).query(query);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut request = self.http.request(method, self.url(path)).json(body);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    // ---- outbreaks ----

    pub async fn list_outbreaks(
        &self,
        filter: &FilterState,
    ) -> Result<Vec<OutbreakCluster>, ApiError> {
        let list: DataList<OutbreakCluster> = self
            .get_json("/api/v1/outbreaks", &filter_query(filter))
            .await?;
        Ok(list.data)
    }

    pub async fn get_outbreak(&self, id: &str) -> Result<OutbreakCluster, ApiError> {
        self.get_json(&format!("/api/v1/outbreaks/{id}"), &[]).await
    }

    pub async fn create_outbreak(&self, body: &NewOutbreak) -> Result<OutbreakCluster, ApiError> {
        self.send_json(reqwest::Method::POST, "/api/v1/outbreaks", body)
            .await
    }

    pub async fn update_outbreak(
        &self,
        id: &str,
        patch: &OutbreakPatch,
    ) -> Result<OutbreakCluster, ApiError> {
        self.send_json(reqwest::Method::PUT, &format!("/api/v1/outbreaks/{id}"), patch)
            .await
    }

    pub async fn delete_outbreak(&self, id: &str) -> Result<(), ApiError> {
        let mut request = self.http.delete(self.url(&format!("/api/v1/outbreaks/{id}")));
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        self.check(request.send().await?).await?;
        Ok(())
    }

    pub async fn search_outbreaks(
        &self,
        q: &str,
        disease_type: Option<&str>,
    ) -> Result<Vec<OutbreakSummary>, ApiError> {
        let mut query = vec![("q".to_string(), q.to_string())];
        if let Some(disease) = disease_type {
            query.push(("disease_type".to_string(), disease.to_string()));
        }
        let list: DataList<OutbreakSummary> =
            self.get_json("/api/v1/outbreaks/search", &query).await?;
        Ok(list.data)
    }

    pub async fn region_timeline(&self, region: &str) -> Result<CaseSeries, ApiError> {
        self.get_json(
            "/api/v1/outbreaks/timeline",
            &[("region".to_string(), region.to_string())],
        )
        .await
    }

    // ---- predictions ----

    pub async fn request_prediction(
        &self,
        request: &PredictionRequest,
    ) -> Result<MlPrediction, ApiError> {
        self.send_json(reqwest::Method::POST, "/api/v1/predictions", request)
            .await
    }

    pub async fn get_prediction(&self, id: &str) -> Result<MlPrediction, ApiError> {
        self.get_json(&format!("/api/v1/predictions/{id}"), &[]).await
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let list: DataList<ModelInfo> =
            self.get_json("/api/v1/predictions/models/list", &[]).await?;
        Ok(list.data)
    }

    pub async fn retrain_model(&self, model_id: &str) -> Result<ModelInfo, ApiError> {
        self.send_json(
            reqwest::Method::POST,
            &format!("/api/v1/predictions/models/{model_id}/retrain"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn performance_metrics(&self) -> Result<Vec<ModelPerformance>, ApiError> {
        let list: DataList<ModelPerformance> = self
            .get_json("/api/v1/predictions/performance/metrics", &[])
            .await?;
        Ok(list.data)
    }

    // ---- reports, alerts, annotations, exports ----

    pub async fn list_reports(&self) -> Result<Vec<SymptomReport>, ApiError> {
        let list: DataList<SymptomReport> = self.get_json("/api/v1/reports", &[]).await?;
        Ok(list.data)
    }

    pub async fn create_report(&self, body: &NewReport) -> Result<SymptomReport, ApiError> {
        self.send_json(reqwest::Method::POST, "/api/v1/reports", body)
            .await
    }

    pub async fn list_alerts(&self) -> Result<Vec<HealthAlert>, ApiError> {
        let list: DataList<HealthAlert> = self.get_json("/api/v1/alerts", &[]).await?;
        Ok(list.data)
    }

    pub async fn create_alert(&self, body: &NewAlert) -> Result<HealthAlert, ApiError> {
        self.send_json(reqwest::Method::POST, "/api/v1/alerts", body)
            .await
    }

    pub async fn list_annotations(&self) -> Result<Vec<MapAnnotation>, ApiError> {
        let list: DataList<MapAnnotation> =
            self.get_json("/api/v1/map_annotations", &[]).await?;
        Ok(list.data)
    }

    pub async fn request_export(&self) -> Result<String, ApiError> {
        let body: serde_json::Value = self
            .send_json(reqwest::Method::POST, "/api/v1/exports", &serde_json::json!({}))
            .await?;
        Ok(body["message"].as_str().unwrap_or_default().to_string())
    }
}

/// Best-effort human-readable message from an error body: the `error`
/// key, then `message`, then the canonical status reason.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(message) = value[key].as_str() {
                return message.to_string();
            }
        }
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

/// Translate a `FilterState` into the outbreak list query parameters.
fn filter_query(filter: &FilterState) -> Vec<(String, String)> {
    let mut query = Vec::new();
    for disease in &filter.disease_types {
        query.push(("disease_type".to_string(), disease.clone()));
    }
    if let Some(min) = filter.min_severity {
        query.push(("min_severity".to_string(), min.to_string()));
    }
    if filter.active_only {
        query.push(("active_only".to_string(), "true".to_string()));
    }
    if let Some(floor) = filter.confidence_floor {
        query.push(("confidence_floor".to_string(), floor.to_string()));
    }
    if let Some(bounds) = &filter.bounds {
        query.push(("north".to_string(), bounds.north.to_string()));
        query.push(("south".to_string(), bounds.south.to_string()));
        query.push(("east".to_string(), bounds.east.to_string()));
        query.push(("west".to_string(), bounds.west.to_string()));
    }
    query
}
