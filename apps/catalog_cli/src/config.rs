use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::SearchMethod;
use tracing::debug;

const CONFIG_DIR_NAME: &str = "catalog";
const CONFIG_FILE_NAME: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: u32,
    pub filter_debounce_ms: u64,
    pub search_method: SearchMethod,
    pub top_k: u32,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".into(),
            page_size: 20,
            filter_debounce_ms: 300,
            search_method: SearchMethod::Hybrid,
            top_k: 10,
            request_timeout_secs: None,
            log_filter: "warn".into(),
        }
    }
}

impl Settings {
    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Every key is optional; missing keys keep the earlier layer's value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    page_size: Option<u32>,
    filter_debounce_ms: Option<u64>,
    search_method: Option<SearchMethod>,
    top_k: Option<u32>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Defaults, then the TOML file, then the process environment.
///
/// An explicit `config_path` must exist; the default location is only read
/// when present.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.is_file()),
    };
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(path) = config_path {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        apply_file(&mut settings, file_cfg);
    }

    apply_env(&mut settings, env);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.filter_debounce_ms {
        settings.filter_debounce_ms = v;
    }
    if let Some(v) = file_cfg.search_method {
        settings.search_method = v;
    }
    if let Some(v) = file_cfg.top_k {
        settings.top_k = v;
    }
    if file_cfg.request_timeout_secs.is_some() {
        settings.request_timeout_secs = file_cfg.request_timeout_secs;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("CATALOG_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(parsed) = env("APP__PAGE_SIZE").and_then(|v| v.trim().parse().ok()) {
        settings.page_size = parsed;
    }
    if let Some(parsed) = env("APP__FILTER_DEBOUNCE_MS").and_then(|v| v.trim().parse().ok()) {
        settings.filter_debounce_ms = parsed;
    }
    if let Some(parsed) = env("APP__SEARCH_METHOD").and_then(|v| v.parse().ok()) {
        settings.search_method = parsed;
    }
    if let Some(parsed) = env("APP__TOP_K").and_then(|v| v.trim().parse().ok()) {
        settings.top_k = parsed;
    }
    if let Some(parsed) = env("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
        settings.request_timeout_secs = Some(parsed);
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
