use std::env;

use anyhow::Context;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use server_api::table::{default_table_configs, TableConfig};

pub const SETTINGS_FILE: &str = "server.toml";

const DEFAULT_DATABASE_URL: &str = "sqlite://./data/sales_admin.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub log_filter: String,
    pub max_body_bytes: usize,
    /// Replaces the built-in table set when present.
    #[serde(default)]
    pub tables: Option<Vec<TableConfig>>,
}

impl Settings {
    pub fn table_configs(&self) -> Vec<TableConfig> {
        self.tables.clone().unwrap_or_else(default_table_configs)
    }

    pub fn normalized_database_url(&self) -> String {
        normalize_database_url(&self.database_url)
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(SETTINGS_FILE, env::vars().collect())
}

/// Defaults, then the optional settings file, then legacy variables
/// (`DATABASE_URL`, `SERVER_BIND`), then `APP__*` variables.
pub(crate) fn load_settings_from(
    settings_file: &str,
    vars: Map<String, String>,
) -> anyhow::Result<Settings> {
    let mut legacy = Map::new();
    if let Some(url) = vars.get("DATABASE_URL") {
        legacy.insert("database_url".to_string(), url.clone());
    }
    if let Some(bind) = vars.get("SERVER_BIND") {
        legacy.insert("bind_addr".to_string(), bind.clone());
    }
    let prefixed = vars
        .into_iter()
        .filter(|(key, _)| key.starts_with("APP__"))
        .collect();

    Config::builder()
        .set_default("bind_addr", "127.0.0.1:8080")?
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("log_filter", "info")?
        .set_default("max_body_bytes", 65_536_i64)?
        .add_source(File::with_name(settings_file).required(false))
        .add_source(Environment::default().source(Some(legacy)))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .source(Some(prefixed)),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>())
        .with_context(|| format!("failed to load settings (file '{settings_file}')"))
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if is_windows_drive_path(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    if is_windows_drive_path(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn is_windows_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
