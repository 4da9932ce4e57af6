//! Settings for every carfinder binary.
//!
//! Values are resolved in layers: built-in defaults, then the TOML file, then
//! `CARFINDER_*` environment variables, then programmatic overrides. Each
//! layer is a [`ConfigOverrides`]; an unset field leaves the layer below
//! untouched.

use std::env;
use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_CANDIDATES: [&str; 2] = ["carfinder.toml", "config/carfinder.toml"];
const TIMEOUT_SECS: RangeInclusive<u64> = 1..=300;
const MAX_RESULTS: RangeInclusive<u32> = 1..=100;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Catalog query sizing for the search-and-relax phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Record cap sent with every search call.
    pub max_results: u32,
    /// Below this many records the hard relaxation is attempted.
    pub min_results: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// One layer of settings, as read from the file or the environment or set
/// by a caller.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub database: DatabaseLayer,
    pub llm: LlmLayer,
    pub search: SearchLayer,
    pub logging: LoggingLayer,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseLayer {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmLayer {
    pub provider: Option<LlmProvider>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl fmt::Debug for LlmLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmLayer")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchLayer {
    pub max_results: Option<u32>,
    pub min_results: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingLayer {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Explicit file; it must exist. Without one the working directory is searched.
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid carfinder TOML: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("`${{{var}}}` is referenced in the config file but not set")]
    MissingEnvInterpolation { var: String },
    #[error("`${{` without a closing `}}` in the config file")]
    UnterminatedInterpolation,
    #[error("`{key}` must be a non-negative integer, got `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("missing required credential `{key}`: {hint}")]
    MissingCredential { key: &'static str, hint: &'static str },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

type EnvSetter = fn(&mut ConfigOverrides, &str, &str) -> Result<(), ConfigError>;

/// Environment variables and the field each one sets. The `CARFINDER_LOG_*`
/// aliases come before their canonical names, which therefore win.
const ENV_VARS: [(&str, EnvSetter); 15] = [
    ("CARFINDER_DATABASE_URL", |layer, _, value| {
        layer.database.url = Some(value.to_string());
        Ok(())
    }),
    ("CARFINDER_DATABASE_MAX_CONNECTIONS", |layer, key, value| {
        layer.database.max_connections = Some(parse_env(key, value)?);
        Ok(())
    }),
    ("CARFINDER_DATABASE_TIMEOUT_SECS", |layer, key, value| {
        layer.database.timeout_secs = Some(parse_env(key, value)?);
        Ok(())
    }),
    ("CARFINDER_LLM_PROVIDER", |layer, _, value| {
        layer.llm.provider = Some(value.parse()?);
        Ok(())
    }),
    ("CARFINDER_LLM_API_KEY", |layer, _, value| {
        layer.llm.api_key = Some(value.to_string());
        Ok(())
    }),
    ("CARFINDER_LLM_BASE_URL", |layer, _, value| {
        layer.llm.base_url = Some(value.to_string());
        Ok(())
    }),
    ("CARFINDER_LLM_MODEL", |layer, _, value| {
        layer.llm.model = Some(value.to_string());
        Ok(())
    }),
    ("CARFINDER_LLM_TIMEOUT_SECS", |layer, key, value| {
        layer.llm.timeout_secs = Some(parse_env(key, value)?);
        Ok(())
    }),
    ("CARFINDER_LLM_MAX_RETRIES", |layer, key, value| {
        layer.llm.max_retries = Some(parse_env(key, value)?);
        Ok(())
    }),
    ("CARFINDER_SEARCH_MAX_RESULTS", |layer, key, value| {
        layer.search.max_results = Some(parse_env(key, value)?);
        Ok(())
    }),
    ("CARFINDER_SEARCH_MIN_RESULTS", |layer, key, value| {
        layer.search.min_results = Some(parse_env(key, value)?);
        Ok(())
    }),
    ("CARFINDER_LOG_LEVEL", set_log_level),
    ("CARFINDER_LOGGING_LEVEL", set_log_level),
    ("CARFINDER_LOG_FORMAT", set_log_format),
    ("CARFINDER_LOGGING_FORMAT", set_log_format),
];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://carfinder.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            search: SearchConfig { max_results: 50, min_results: 3 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let choices =
            [("openai", Self::OpenAi), ("anthropic", Self::Anthropic), ("ollama", Self::Ollama)];
        choose("llm.provider", value, &choices)
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let choices = [("compact", Self::Compact), ("pretty", Self::Pretty), ("json", Self::Json)];
        choose("logging.format", value, &choices)
    }
}

impl ConfigOverrides {
    /// Reads a TOML layer, expanding `${VAR}` references first.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&interpolate_env_vars(&raw)?)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    /// Collects every non-blank `CARFINDER_*` variable into a layer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut layer = Self::default();
        for (key, set) in ENV_VARS {
            if let Some(value) = env::var(key).ok().filter(|value| !value.trim().is_empty()) {
                set(&mut layer, key, &value)?;
            }
        }
        Ok(layer)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let file = match options.config_path {
            Some(path) if path.exists() => Some(path),
            Some(path) => return Err(ConfigError::MissingConfigFile(path)),
            None => discover_config_file(),
        };
        if let Some(path) = file {
            config.merge(ConfigOverrides::from_file(&path)?);
        }
        config.merge(ConfigOverrides::from_env()?);
        config.merge(options.overrides);

        config.validate()?;
        Ok(config)
    }

    /// Lays `layer` on top of the current values.
    pub fn merge(&mut self, layer: ConfigOverrides) {
        let ConfigOverrides { database, llm, search, logging } = layer;

        replace(&mut self.database.url, database.url);
        replace(&mut self.database.max_connections, database.max_connections);
        replace(&mut self.database.timeout_secs, database.timeout_secs);

        replace(&mut self.llm.provider, llm.provider);
        if let Some(key) = llm.api_key {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if llm.base_url.is_some() {
            self.llm.base_url = llm.base_url;
        }
        replace(&mut self.llm.model, llm.model);
        replace(&mut self.llm.timeout_secs, llm.timeout_secs);
        replace(&mut self.llm.max_retries, llm.max_retries);

        replace(&mut self.search.max_results, search.max_results);
        replace(&mut self.search.min_results, search.min_results);

        replace(&mut self.logging.level, logging.level);
        replace(&mut self.logging.format, logging.format);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.database.url.trim();
        require(
            url.starts_with("sqlite:") || url == ":memory:",
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
        )?;
        require(self.database.max_connections > 0, "database.max_connections must be positive")?;
        require(
            TIMEOUT_SECS.contains(&self.database.timeout_secs),
            "database.timeout_secs must be in range 1..=300",
        )?;

        require(
            TIMEOUT_SECS.contains(&self.llm.timeout_secs),
            "llm.timeout_secs must be in range 1..=300",
        )?;
        require(!self.llm.model.trim().is_empty(), "llm.model must not be empty")?;
        self.validate_llm_endpoint()?;

        require(
            MAX_RESULTS.contains(&self.search.max_results),
            "search.max_results must be in range 1..=100",
        )?;
        require(self.search.min_results > 0, "search.min_results must be positive")?;

        let level = self.logging.level.trim().to_ascii_lowercase();
        require(
            LOG_LEVELS.contains(&level.as_str()),
            "logging.level must be one of trace|debug|info|warn|error",
        )
    }

    fn validate_llm_endpoint(&self) -> Result<(), ConfigError> {
        let filled = |value: Option<&str>| value.is_some_and(|value| !value.trim().is_empty());
        let base_url = self.llm.base_url.as_deref();

        match self.llm.provider {
            LlmProvider::OpenAi | LlmProvider::Anthropic => {
                if !filled(self.llm.api_key.as_ref().map(|key| key.expose_secret())) {
                    return Err(ConfigError::MissingCredential {
                        key: "llm.api_key",
                        hint: "set CARFINDER_LLM_API_KEY or [llm].api_key for openai/anthropic",
                    });
                }
            }
            LlmProvider::Ollama => {
                require(filled(base_url), "llm.base_url is required for the ollama provider")?;
            }
        }

        require(
            base_url.map_or(true, |url| url.starts_with("http://") || url.starts_with("https://")),
            "llm.base_url must start with http:// or https://",
        )
    }
}

/// First config file found in the working directory, if any.
pub fn discover_config_file() -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists())
}

/// Case-insensitive lookup of `value` among named choices.
fn choose<T: Copy>(field: &str, value: &str, choices: &[(&str, T)]) -> Result<T, ConfigError> {
    let wanted = value.trim();
    if let Some((_, choice)) = choices.iter().find(|(name, _)| name.eq_ignore_ascii_case(wanted)) {
        return Ok(*choice);
    }
    let names: Vec<_> = choices.iter().map(|(name, _)| *name).collect();
    Err(ConfigError::Validation(format!(
        "{field} must be one of {}, got `{wanted}`",
        names.join("|")
    )))
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn require(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Validation(message.to_string()))
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn set_log_level(layer: &mut ConfigOverrides, _: &str, value: &str) -> Result<(), ConfigError> {
    layer.logging.level = Some(value.to_string());
    Ok(())
}

fn set_log_format(layer: &mut ConfigOverrides, _: &str, value: &str) -> Result<(), ConfigError> {
    layer.logging.format = Some(value.parse()?);
    Ok(())
}

/// Replaces every `${NAME}` with the value of that environment variable.
fn interpolate_env_vars(raw: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let name = &after[..end];
        let value = env::var(name)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: name.to_string() })?;
        expanded.push_str(&value);
        rest = &after[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}
