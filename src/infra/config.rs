//! Configuration loading from TOML files
//!
//! Config file is selected via `--config <path>` (default: config/park.toml).
//! The attraction and visitor lists are the park configuration supplied at
//! startup and on refresh.

use crate::domain::error::{AdmissionError, AdmissionResult};
use crate::domain::types::{AttractionId, VisitorId};
use anyhow::Context;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default config path used by the binaries
pub const DEFAULT_CONFIG_PATH: &str = "config/park.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttractionConfig {
    pub id: AttractionId,
    pub name: String,
    pub max_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VisitorConfig {
    pub id: VisitorId,
    pub name: String,
    pub surname: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
    /// Prometheus metrics HTTP port (0 to disable)
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval(), prometheus_port: default_prometheus_port() }
    }
}

fn default_metrics_interval() -> u64 {
    10
}

fn default_prometheus_port() -> u16 {
    9100
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RankingConfig {
    /// Limit applied when a ranking is requested without one (None = all)
    #[serde(default)]
    pub default_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_id")]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { id: default_site_id() }
    }
}

fn default_site_id() -> String {
    "park".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub attractions: Vec<AttractionConfig>,
    #[serde(default)]
    pub visitors: Vec<VisitorConfig>,
}

/// Reject zero capacities and duplicate attraction ids
pub fn validate_attractions(configs: &[AttractionConfig]) -> AdmissionResult<()> {
    let mut seen = FxHashSet::default();
    for cfg in configs {
        if cfg.max_capacity == 0 {
            return Err(AdmissionError::InvalidCapacity {
                attraction_id: cfg.id,
                max_capacity: cfg.max_capacity,
            });
        }
        if !seen.insert(cfg.id) {
            return Err(AdmissionError::DuplicateAttraction { attraction_id: cfg.id });
        }
    }
    Ok(())
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    metrics_interval_secs: u64,
    prometheus_port: u16,
    ranking_default_limit: Option<usize>,
    attractions: Vec<AttractionConfig>,
    visitors: Vec<VisitorConfig>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            metrics_interval_secs: default_metrics_interval(),
            prometheus_port: default_prometheus_port(),
            ranking_default_limit: None,
            attractions: Vec::new(),
            visitors: Vec::new(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_attractions(&toml_config.attractions)
            .with_context(|| format!("Invalid attractions in {}", path.display()))?;

        Ok(Self {
            site_id: toml_config.site.id,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            prometheus_port: toml_config.metrics.prometheus_port,
            ranking_default_limit: toml_config.ranking.default_limit,
            attractions: toml_config.attractions,
            visitors: toml_config.visitors,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn prometheus_port(&self) -> u16 {
        self.prometheus_port
    }

    pub fn ranking_default_limit(&self) -> Option<usize> {
        self.ranking_default_limit
    }

    pub fn attractions(&self) -> &[AttractionConfig] {
        &self.attractions
    }

    pub fn visitors(&self) -> &[VisitorConfig] {
        &self.visitors
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests and the simulator
    pub fn with_attractions(mut self, attractions: Vec<AttractionConfig>) -> Self {
        self.attractions = attractions;
        self
    }

    /// Builder method for tests and the simulator
    pub fn with_visitors(mut self, visitors: Vec<VisitorConfig>) -> Self {
        self.visitors = visitors;
        self
    }

    pub fn with_ranking_default_limit(mut self, limit: Option<usize>) -> Self {
        self.ranking_default_limit = limit;
        self
    }
}
