//! TOML configuration. Every field has a default, so an empty file (or
//! no file at all) describes the standard deployment layout.

use anyhow::Context;
use cdm_bulletin::fetcher::{DEFAULT_BASE_URL, DEFAULT_HISTORICAL_MONTHS, DEFAULT_TIMEOUT_SECS};
use cdm_bulletin::persistence::DEFAULT_SEARCH_DEPTH;
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "cdm.toml";

/// Upper bound for `api.historical_months` (ten years of bulletins).
pub const MAX_HISTORICAL_MONTHS: u32 = 120;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub paths: PathsConfig,
    pub persistence: PersistenceConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub historical_months: u32,
}

impl Default for ApiConfig {
    fn default() -> ApiConfig {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            historical_months: DEFAULT_HISTORICAL_MONTHS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub base_geojson: PathBuf,
    pub fallback: PathBuf,
    /// Commune to station mapping; the bundled map is used when unset
    pub commune_map: Option<PathBuf>,
    pub indices_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> PathsConfig {
        PathsConfig {
            base_geojson: PathBuf::from("public/maps/data/valp.geojson"),
            fallback: PathBuf::from("public/maps/data/dummy_api_data.json"),
            commune_map: None,
            indices_root: PathBuf::from("public/maps/data/salida"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Index family read for the map (`spi` or `spei`)
    pub family: String,
    pub search_depth: u32,
}

impl Default for PersistenceConfig {
    fn default() -> PersistenceConfig {
        PersistenceConfig {
            family: "spi".to_string(),
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub families: Vec<SyncFamily>,
}

impl Default for SyncConfig {
    fn default() -> SyncConfig {
        SyncConfig {
            families: ["spei", "spi"]
                .iter()
                .map(|name| SyncFamily {
                    name: name.to_string(),
                    source: PathBuf::from(format!("prueba/{name}")),
                    destination: PathBuf::from(format!("public/maps/data/salida/{name}/txt")),
                    pattern: default_pattern(),
                })
                .collect(),
        }
    }
}

/// One index family copied by `sync-indices`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncFamily {
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    "*.txt".to_string()
}

impl Config {
    pub fn from_toml(raw: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(raw)?;
        if config.api.historical_months > MAX_HISTORICAL_MONTHS {
            anyhow::bail!(
                "api.historical_months = {} exceeds the maximum of {}",
                config.api.historical_months,
                MAX_HISTORICAL_MONTHS
            );
        }
        Ok(config)
    }

    /// Read `path`; a missing default config file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
            info!("No {} found, using default configuration", DEFAULT_CONFIG_PATH);
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Config::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Directory holding the monthly index files of the configured family.
    pub fn indices_dir(&self) -> PathBuf {
        self.paths
            .indices_root
            .join(&self.persistence.family)
            .join("txt")
    }
}
