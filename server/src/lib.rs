//! # Epiwatch Server
//!
//! Disease-outbreak monitoring backend.
//!
//! # General Infrastructure
//! - REST surface under `/api/v1`, realtime WebSocket under `/ws`
//! - Redis holds every record family (outbreaks, predictions, reports,
//!   alerts, case series, tokens, audit trail)
//! - Meilisearch holds the outbreak search index, synced on every write
//! - Every authenticated call leaves an audit entry, denials included
//!
//! # Notes
//!
//! ## Redis + Meilisearch
//! Redis is the system of record: atomic hash writes, O(1) lookups, and
//! the bounded audit list. Meilisearch is fundamentally a search engine,
//! not a database, so it only ever carries a projection of the outbreak
//! hash for the map's search box. The two are synced on write rather than
//! on a timer; losing Meilisearch loses search, nothing else.
//!
//! ## Realtime
//! One broadcast channel fans events out to every socket task. Map
//! subscriptions are a per-socket bounds filter, applied before a frame is
//! sent, so a client zoomed into one region never sees another region's
//! churn.

use std::time::Duration;

use axum::{
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod audit;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod realtime;
pub mod routes;
pub mod search;
pub mod state;

use models::Event;
use routes::{alerts, annotations, exports, outbreaks, predictions, reports};
use state::{AppState, SharedState};

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let app = router(state.clone()).layer(TraceLayer::new_for_http()).layer(cors);

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .unwrap();

    println!("Server shutting down...");
}

/// Full application router. Everything under `/api/v1` passes the bearer
/// token middleware; `/health` and `/ws` authenticate on their own terms.
pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        .route(
            "/outbreaks",
            get(outbreaks::list_outbreaks).post(outbreaks::create_outbreak),
        )
        .route("/outbreaks/search", get(outbreaks::search_outbreaks))
        .route("/outbreaks/timeline", get(outbreaks::region_timeline))
        .route(
            "/outbreaks/{id}",
            get(outbreaks::get_outbreak)
                .put(outbreaks::update_outbreak)
                .delete(outbreaks::delete_outbreak),
        )
        .route("/predictions", post(predictions::create_prediction))
        .route("/predictions/{id}", get(predictions::get_prediction))
        .route("/predictions/models/list", get(predictions::list_models))
        .route(
            "/predictions/models/{id}/retrain",
            post(predictions::retrain_model),
        )
        .route(
            "/predictions/performance/metrics",
            get(predictions::performance_metrics),
        )
        .route(
            "/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route("/alerts", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/map_annotations", get(annotations::list_annotations))
        .route("/exports", post(exports::create_export))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .route("/ws", get(realtime::ws_handler))
        .nest("/api/v1", api)
        .with_state(state)
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    // Let connected clients know before their sockets drop.
    state.hub.publish(Event::SystemMaintenance {
        message: "server is shutting down".to_string(),
    });
}
