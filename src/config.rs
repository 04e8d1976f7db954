//! Configuration management for the MC2000 mapping
//!
//! Loads the YAML configuration file.

use crate::engine::EngineSettings;
use crate::scratch::ScratchProfile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub midi: MidiConfig,
    /// Override for the embedded control table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controls_csv: Option<String>,
    #[serde(default)]
    pub scratch: ScratchProfile,
}

/// MIDI port configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Substring of the controller's input port name
    #[serde(default = "default_port")]
    pub input_port: String,
    /// Substring of the controller's output port name
    #[serde(default = "default_port")]
    pub output_port: String,
}

fn default_port() -> String {
    "MC2000".to_string()
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let scratch = &self.scratch;
        if scratch.resolution == 0 {
            anyhow::bail!("scratch.resolution must be positive");
        }
        if scratch.rpm <= 0.0 || scratch.shift_rpm <= 0.0 {
            anyhow::bail!("scratch rpm values must be positive");
        }
        if !scratch.alpha.is_finite() || scratch.alpha <= 0.0 {
            anyhow::bail!("scratch.alpha must be a positive number");
        }
        if scratch.beta_divisor <= 0.0 {
            anyhow::bail!("scratch.beta_divisor must be positive");
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scratch: self.scratch,
        }
    }
}
