use std::env;
use std::fs;
use std::path::Path;

use carfinder_core::config::{discover_config_file, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = discover_config_file();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries = [
        ("database.url", config.database.url.clone(), "CARFINDER_DATABASE_URL"),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            "CARFINDER_DATABASE_MAX_CONNECTIONS",
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            "CARFINDER_DATABASE_TIMEOUT_SECS",
        ),
        ("llm.provider", format!("{:?}", config.llm.provider), "CARFINDER_LLM_PROVIDER"),
        ("llm.model", config.llm.model.clone(), "CARFINDER_LLM_MODEL"),
        (
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            "CARFINDER_LLM_BASE_URL",
        ),
        (
            "llm.api_key",
            config
                .llm
                .api_key
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |key| redact_key(key.expose_secret())),
            "CARFINDER_LLM_API_KEY",
        ),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), "CARFINDER_LLM_TIMEOUT_SECS"),
        ("llm.max_retries", config.llm.max_retries.to_string(), "CARFINDER_LLM_MAX_RETRIES"),
        (
            "search.max_results",
            config.search.max_results.to_string(),
            "CARFINDER_SEARCH_MAX_RESULTS",
        ),
        (
            "search.min_results",
            config.search.min_results.to_string(),
            "CARFINDER_SEARCH_MIN_RESULTS",
        ),
        ("logging.level", config.logging.level.clone(), "CARFINDER_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "CARFINDER_LOGGING_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in entries {
        let source = field_source(
            key,
            env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key, &value, &source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: &str) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a recognisable prefix (`sk-`, `sk-ant-`) and hides the rest.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.rsplit_once('-') {
        Some((prefix, _)) => format!("{prefix}-***"),
        None => "<redacted>".to_string(),
    }
}
