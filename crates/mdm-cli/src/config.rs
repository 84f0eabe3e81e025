//! CLI configuration file

use anyhow::Context;
use mdm_engine::EngineConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings read from `--config`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
    pub engine: EngineConfig,
}

impl CliConfig {
    /// Load from a JSON file (`.json`) or YAML file (anything else)
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?
        };
        Ok(config)
    }

    /// Filter directive for the tracing subscriber
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }
}
