use ruvector_gcn_prep::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub pretty: bool,
    pub precision: Precision,
}

/// Floating-point width used for the whole pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    F32,
    #[default]
    F64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty: true,
            precision: Precision::F64,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(p) = path {
        let content = std::fs::read_to_string(p)?;
        return parse_config(&content);
    }

    // Try default locations
    let default_paths = ["ruvector-gcn-prep.toml", "config/ruvector-gcn-prep.toml"];
    for path in &default_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            tracing::debug!(path, "loaded configuration");
            return parse_config(&content);
        }
    }

    Ok(Config::default())
}

fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.pipeline.validate()?;
    Ok(config)
}
