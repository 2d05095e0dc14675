//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `PRIMEGATE_LOG_LEVEL` and `PRIMEGATE_LOAD_TIMEOUT_MS` env
//! overrides.

use std::{env, fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::AppError;

/// Table backend configuration.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Simulated load latency.
    pub load_delay: Duration,
}

/// Backend selection (`[backend]` in the TOML).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Which backend to load (e.g. `"table"`). Maps to `default` in
    /// `[backend]` — named `default` there to signal that other backend
    /// sections can coexist without being loaded.
    pub provider: String,
    /// Config for the table backend (`[backend.table]`).
    pub table: TableConfig,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Upper bound on the backend load step. `None` leaves the load
    /// unbounded — only reachable by explicitly configuring `0`.
    pub load_timeout: Option<Duration>,
    pub backend: BackendConfig,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    service: RawService,
    #[serde(default)]
    backend: RawBackend,
}

#[derive(Deserialize)]
struct RawService {
    #[serde(default = "default_log_level")]
    log_level: String,
    /// Milliseconds; `0` disables the bound.
    #[serde(default = "default_load_timeout_ms")]
    load_timeout_ms: u64,
}

impl Default for RawService {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

#[derive(Deserialize)]
struct RawBackend {
    #[serde(rename = "default", default = "default_provider")]
    provider: String,
    #[serde(default)]
    table: RawTable,
}

impl Default for RawBackend {
    fn default() -> Self {
        Self { provider: default_provider(), table: RawTable::default() }
    }
}

#[derive(Deserialize, Default)]
struct RawTable {
    #[serde(default)]
    load_delay_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_load_timeout_ms() -> u64 {
    10_000
}

fn default_provider() -> String {
    "table".to_string()
}

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let log_level_override = env::var("PRIMEGATE_LOG_LEVEL").ok();
    let load_timeout_override = env::var("PRIMEGATE_LOAD_TIMEOUT_MS").ok();
    load_from(
        Path::new("config/default.toml"),
        log_level_override.as_deref(),
        load_timeout_override.as_deref(),
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    load_timeout_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("cannot parse {}: {e}", path.display())))?;

    let log_level = match log_level_override {
        Some(level) => level.to_string(),
        None => parsed.service.log_level,
    };

    let load_timeout_ms = match load_timeout_override {
        Some(ms) => ms
            .parse::<u64>()
            .map_err(|e| AppError::Config(format!("PRIMEGATE_LOAD_TIMEOUT_MS: {e}")))?,
        None => parsed.service.load_timeout_ms,
    };

    Ok(Config {
        log_level,
        load_timeout: (load_timeout_ms > 0).then(|| Duration::from_millis(load_timeout_ms)),
        backend: BackendConfig {
            provider: parsed.backend.provider,
            table: TableConfig {
                load_delay: Duration::from_millis(parsed.backend.table.load_delay_ms),
            },
        },
    })
}
