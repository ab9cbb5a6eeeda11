use std::sync::Arc;

use meilisearch_sdk::client::Client;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tracing::info;

use forecast::ModelRegistry;
use models::OutbreakCluster;

use crate::auth::Identity;
use crate::config::Config;
use crate::database::{self, init_redis};
use crate::realtime::Hub;
use crate::search::init_meilisearch;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub redis_connection: ConnectionManager,
    pub meili_client: Arc<Client>,
    pub hub: Hub,
    pub registry: RwLock<ModelRegistry>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let redis_connection = init_redis(&config.redis_url).await;

        // The admin token always resolves, so a fresh deployment is usable
        // before ingest has seeded anything.
        database::store_token(
            redis_connection.clone(),
            &config.admin_token,
            &Identity::admin("admin"),
        )
        .await
        .unwrap();

        let clusters: Vec<OutbreakCluster> =
            database::all_json(redis_connection.clone(), database::OUTBREAKS_KEY)
                .await
                .unwrap();
        info!("Indexing {} outbreak clusters", clusters.len());

        let meili_client = init_meilisearch(&config.meili_url, &config.meili_key, &clusters).await;

        Arc::new(Self {
            config,
            redis_connection,
            meili_client,
            hub: Hub::new(),
            registry: RwLock::new(ModelRegistry::new()),
        })
    }
}
