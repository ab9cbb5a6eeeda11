//! # Ingest
//!
//! Seeds the backend's Redis with a working dataset: API tokens, outbreak
//! clusters, and daily case series. Run it once against a fresh
//! deployment, or point it at a scenario file to load real data.
//!
//! The server rebuilds its search index from Redis at startup, so this
//! tool only ever talks to Redis.

use chrono::{Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde::{Deserialize, Serialize};

use epiwatch::database;
use models::{CaseSeries, Identity, OutbreakCluster};

/// One API token and what it resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub actor: String,
    pub permissions: Vec<String>,
}

/// Everything a seeding run writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub tokens: Vec<TokenGrant>,
    pub outbreaks: Vec<OutbreakCluster>,
    pub series: Vec<CaseSeries>,
}

pub fn load_scenario(path: &str) -> Scenario {
    let json = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&json).unwrap()
}

pub async fn seed(redis_url: &str, scenario: &Scenario) {
    let conn = database::init_redis(redis_url).await;

    let total = scenario.tokens.len() + scenario.outbreaks.len() + scenario.series.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap()
        .progress_chars("=> "),
    );

    for grant in &scenario.tokens {
        pb.set_message(format!("token for {}", grant.actor));
        let identity = Identity::new(&grant.actor, grant.permissions.clone());
        database::store_token(conn.clone(), &grant.token, &identity)
            .await
            .unwrap();
        pb.inc(1);
    }

    for cluster in &scenario.outbreaks {
        pb.set_message(format!("outbreak {}", cluster.name));
        database::put_json(conn.clone(), database::OUTBREAKS_KEY, &cluster.id, cluster)
            .await
            .unwrap();
        pb.inc(1);
    }

    for series in &scenario.series {
        pb.set_message(format!("series {}", series.region));
        database::put_case_series(conn.clone(), series).await.unwrap();
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    println!("Seeded Tokens: {}", scenario.tokens.len());
    println!("Seeded Outbreaks: {}", scenario.outbreaks.len());
    println!("Seeded Series: {}", scenario.series.len());
}

/// Deterministic demo dataset: two named regions plus the global
/// aggregate, each with `days` of history and an outbreak cluster.
pub fn demo_scenario(days: u32) -> Scenario {
    let days = days.max(7) as usize;
    let start_date = Utc::now().date_naive() - Duration::days(days as i64 - 1);
    let now = Utc::now();

    let riverside = daily_counts(days, 120.0, 4.0);
    let harbor = daily_counts(days, 45.0, 1.0);
    let global: Vec<f64> = riverside
        .iter()
        .zip(harbor.iter())
        .map(|(a, b)| a + b)
        .collect();

    let series = vec![
        CaseSeries {
            region: region_key("Riverside"),
            start_date,
            counts: riverside,
        },
        CaseSeries {
            region: region_key("Harbor District"),
            start_date,
            counts: harbor,
        },
        CaseSeries {
            region: database::GLOBAL_REGION.to_string(),
            start_date,
            counts: global,
        },
    ];

    let outbreaks = vec![
        OutbreakCluster {
            id: "11111111-1111-4111-8111-111111111111".to_string(),
            name: "Riverside cluster".to_string(),
            disease_type: "influenza".to_string(),
            latitude: 42.38,
            longitude: -72.52,
            case_count: 340,
            severity: 4,
            confidence: 0.85,
            symptoms: vec!["fever".to_string(), "cough".to_string()],
            reported_at: now,
            updated_at: now,
            active: true,
        },
        OutbreakCluster {
            id: "22222222-2222-4222-8222-222222222222".to_string(),
            name: "Harbor District cluster".to_string(),
            disease_type: "norovirus".to_string(),
            latitude: 42.36,
            longitude: -71.05,
            case_count: 90,
            severity: 2,
            confidence: 0.7,
            symptoms: vec!["nausea".to_string()],
            reported_at: now,
            updated_at: now,
            active: true,
        },
    ];

    let tokens = vec![
        TokenGrant {
            token: "demo-analyst".to_string(),
            actor: "analyst".to_string(),
            permissions: vec![
                "outbreaks:read".to_string(),
                "predictions:read".to_string(),
                "predictions:write".to_string(),
                "reports:read".to_string(),
                "reports:write".to_string(),
                "alerts:read".to_string(),
                "annotations:read".to_string(),
            ],
        },
        TokenGrant {
            token: "demo-viewer".to_string(),
            actor: "viewer".to_string(),
            permissions: vec![
                "outbreaks:read".to_string(),
                "alerts:read".to_string(),
                "annotations:read".to_string(),
            ],
        },
    ];

    Scenario {
        tokens,
        outbreaks,
        series,
    }
}

/// Rising series with a deterministic weekly wiggle; no randomness so
/// repeated runs produce identical data.
fn daily_counts(days: usize, base: f64, trend: f64) -> Vec<f64> {
    (0..days)
        .map(|d| {
            let wiggle = ((d % 7) as f64 - 3.0).abs() * 2.0;
            (base + trend * d as f64 + wiggle).max(0.0)
        })
        .collect()
}

pub fn region_key(name: &str) -> String {
    sanitize(name).replace(' ', "-")
}

pub fn sanitize(input: &str) -> String {
    let replace = Regex::new(r"[_]").unwrap();
    let mut s = replace.replace_all(input, " ").into_owned();

    let clean_re = Regex::new(r"[^A-Za-z0-9- ]").unwrap();
    s = clean_re.replace_all(&s, "").into_owned();

    s = s.trim().to_string();

    let collapse = Regex::new(r" +").unwrap();
    collapse.replace_all(&s, " ").into_owned().to_lowercase()
}
