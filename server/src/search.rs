//! # Meilisearch
//!
//! Search engine behind the map's outbreak search box.
//!
//! ## Schema
//! - Index for all outbreak clusters
//! - Fields: name, disease type, symptoms (searchable), severity and
//!   disease type (filterable), severity and case count (sortable)
//!
//! ## Sync
//! The index is rebuilt from the Redis outbreak hash at startup and
//! updated on every outbreak write, so it trails the system of record by
//! one request at most.

use std::sync::Arc;

use meilisearch_sdk::{
    client::Client,
    settings::{MinWordSizeForTypos, Settings, TypoToleranceSettings},
};
use models::{OutbreakCluster, OutbreakSummary};

use crate::error::AppError;

pub const OUTBREAK_INDEX: &str = "outbreaks";
pub const OUTBREAK_ID: &str = "id";
pub const OUTBREAK_NAME: &str = "name";
pub const OUTBREAK_DISEASE: &str = "disease_type";
pub const OUTBREAK_SEVERITY: &str = "severity";
pub const OUTBREAK_CASES: &str = "case_count";
pub const OUTBREAK_SYMPTOMS: &str = "symptoms";

pub async fn init_meilisearch(
    meili_url: &str,
    meili_admin_key: &str,
    clusters: &[OutbreakCluster],
) -> Arc<Client> {
    let meili_client = Arc::new(Client::new(meili_url, Some(meili_admin_key)).unwrap());

    meili_client
        .index(OUTBREAK_INDEX)
        .set_settings(&init_settings())
        .await
        .unwrap();

    upsert_outbreaks(meili_client.clone(), clusters)
        .await
        .unwrap();

    meili_client
}

pub async fn upsert_outbreaks(
    meili_client: Arc<Client>,
    clusters: &[OutbreakCluster],
) -> Result<(), AppError> {
    if clusters.is_empty() {
        return Ok(());
    }

    let documents: Vec<OutbreakSummary> = clusters.iter().map(OutbreakSummary::from).collect();

    meili_client
        .index(OUTBREAK_INDEX)
        .add_or_update(&documents, Some(OUTBREAK_ID))
        .await?
        .wait_for_completion(&meili_client, None, None)
        .await?;

    Ok(())
}

pub async fn remove_outbreak(meili_client: Arc<Client>, id: &str) -> Result<(), AppError> {
    meili_client
        .index(OUTBREAK_INDEX)
        .delete_document(id)
        .await?
        .wait_for_completion(&meili_client, None, None)
        .await?;

    Ok(())
}

pub async fn search_outbreaks(
    meili_client: Arc<Client>,
    query: &str,
    disease_type: Option<&str>,
) -> Result<Vec<OutbreakSummary>, AppError> {
    let index = meili_client.index(OUTBREAK_INDEX);
    let mut search = index.search();
    search.with_query(query);

    let filter = disease_type.map(|d| format!("{OUTBREAK_DISEASE} = \"{d}\""));
    if let Some(filter) = &filter {
        search.with_filter(filter);
    }

    let results = search.execute::<OutbreakSummary>().await?;
    Ok(results.hits.into_iter().map(|hit| hit.result).collect())
}

fn init_settings() -> Settings {
    Settings::new()
        .with_ranking_rules([
            "words",
            "typo",
            "proximity",
            "exactness",
            "attribute",
            "sort",
        ])
        .with_filterable_attributes([OUTBREAK_DISEASE, OUTBREAK_SEVERITY])
        .with_searchable_attributes([OUTBREAK_NAME, OUTBREAK_DISEASE, OUTBREAK_SYMPTOMS])
        .with_sortable_attributes([OUTBREAK_SEVERITY, OUTBREAK_CASES])
        .with_typo_tolerance(TypoToleranceSettings {
            enabled: Some(true),
            disable_on_attributes: None,
            disable_on_words: None,
            min_word_size_for_typos: Some(MinWordSizeForTypos {
                one_typo: Some(5),
                two_typos: Some(9),
            }),
        })
}
