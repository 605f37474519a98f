use std::fs;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CANOPY_API_URL: &str = "https://graphql.canopyapi.co/";
const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub canopy_api_key: Option<String>,
    pub canopy_api_url: String,
    pub password_hash_cost: u32,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            database_url: "sqlite://./data/app.db".into(),
            canopy_api_key: None,
            canopy_api_url: DEFAULT_CANOPY_API_URL.into(),
            password_hash_cost: 10,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Keys accepted in `server.toml`. Anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    canopy_api_key: Option<String>,
    canopy_api_url: Option<String>,
    password_hash_cost: Option<u32>,
    max_body_bytes: Option<usize>,
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml`, then environment variables.
pub(crate) fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.bind_addr {
                    settings.server_bind = v;
                }
                if let Some(v) = file_cfg.database_url {
                    settings.database_url = v;
                }
                if let Some(v) = file_cfg.canopy_api_key {
                    settings.canopy_api_key = Some(v);
                }
                if let Some(v) = file_cfg.canopy_api_url {
                    settings.canopy_api_url = v;
                }
                if let Some(v) = file_cfg.password_hash_cost {
                    settings.password_hash_cost = v;
                }
                if let Some(v) = file_cfg.max_body_bytes {
                    settings.max_body_bytes = v;
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable {SETTINGS_FILE}"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("CANOPY_API_KEY").filter(|v| !v.trim().is_empty()) {
        settings.canopy_api_key = Some(v);
    }
    if let Some(v) = env("CANOPY_API_URL") {
        settings.canopy_api_url = v;
    }

    if let Some(v) = env("APP__PASSWORD_HASH_COST") {
        match v.parse::<u32>() {
            Ok(parsed) => settings.password_hash_cost = parsed,
            Err(error) => warn!(%error, value = %v, "invalid APP__PASSWORD_HASH_COST"),
        }
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    storage::ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
