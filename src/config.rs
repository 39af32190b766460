use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::agent::LoopConfig;
use crate::exec::ExecConfig;
use crate::retrieval::RetrievalConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub storage: StorageConfig,
    pub retrieval: RetrievalSettings,
    pub agent: AgentSettings,
    pub exec: ExecSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("questor")
                .join("questor.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub lexical_weight: f64,
    pub semantic_weight: f64,
    pub max_candidates: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        let defaults = RetrievalConfig::default();
        Self {
            lexical_weight: defaults.lexical_weight,
            semantic_weight: defaults.semantic_weight,
            max_candidates: defaults.max_candidates,
        }
    }
}

impl RetrievalSettings {
    pub fn to_retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            lexical_weight: self.lexical_weight,
            semantic_weight: self.semantic_weight,
            max_candidates: self.max_candidates,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_steps: usize,
    pub max_wall_ms: u64,
    pub retry_budget: usize,
    pub category: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        let defaults = LoopConfig::default();
        Self {
            max_steps: defaults.max_steps,
            max_wall_ms: defaults.max_wall_ms,
            retry_budget: defaults.retry_budget,
            category: defaults.category,
        }
    }
}

impl AgentSettings {
    pub fn to_loop_config(&self) -> LoopConfig {
        LoopConfig {
            max_steps: self.max_steps,
            max_wall_ms: self.max_wall_ms,
            retry_budget: self.retry_budget,
            category: self.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecSettings {
    pub builtin_timeout_ms: u64,
    pub bridge_timeout_ms: u64,
}

impl Default for ExecSettings {
    fn default() -> Self {
        let defaults = ExecConfig::default();
        Self {
            builtin_timeout_ms: defaults.builtin_timeout_ms,
            bridge_timeout_ms: defaults.bridge_timeout_ms,
        }
    }
}

impl ExecSettings {
    pub fn to_exec_config(&self) -> ExecConfig {
        ExecConfig {
            builtin_timeout_ms: self.builtin_timeout_ms,
            bridge_timeout_ms: self.bridge_timeout_ms,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            storage: StorageConfig::default(),
            retrieval: RetrievalSettings::default(),
            agent: AgentSettings::default(),
            exec: ExecSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
