use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub meili_url: String,
    pub meili_key: String,
    /// Bootstrap token seeded into the token store with full permissions.
    pub admin_token: String,
    /// Audit trail keeps at most this many entries.
    pub audit_limit: usize,
    /// Seconds a cached prediction stays valid.
    pub cache_ttl_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("EPIWATCH_PORT", "8080"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            meili_url: try_load("MEILI_URL", "http://127.0.0.1:7700"),
            meili_key: read_secret("MEILI_ADMIN_KEY"),
            admin_token: read_secret("EPIWATCH_ADMIN_TOKEN"),
            audit_limit: try_load("EPIWATCH_AUDIT_LIMIT", "1000"),
            cache_ttl_secs: try_load("EPIWATCH_CACHE_TTL_SECS", "300"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Secrets come from the mounted secrets directory, with a plain env var
/// fallback for local runs.
fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            env::var(secret_name)
        })
        .map_err(|e| {
            warn!("{secret_name} not in environment either: {e}");
        })
        .expect("Secrets misconfigured!")
}
