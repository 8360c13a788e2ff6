use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub control: ControlConfig,
    pub capture: CaptureConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Processing server endpoint that receives the recorded audio.
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Local port for the start/stop/status control API.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Encoding to ask the capture platform for. Unsupported values fall
    /// back to the platform default without surfacing an error.
    pub preferred_encoding: String,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Keep a local copy of each assembled recording before submission.
    pub keep_recordings: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/process_voice".to_string(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { port: 4747 }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            preferred_encoding: "audio/wav".to_string(),
            sample_rate: 16000,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            keep_recordings: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.endpoint, "http://127.0.0.1:5000/process_voice");
        assert_eq!(config.control.port, 4747);
        assert_eq!(config.capture.preferred_encoding, "audio/wav");
        assert_eq!(config.capture.sample_rate, 16000);
        assert!(!config.behavior.keep_recordings);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            endpoint = "http://notes.example/process_voice"

            [behavior]
            keep_recordings = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.endpoint, "http://notes.example/process_voice");
        assert!(config.behavior.keep_recordings);
        assert_eq!(config.control.port, 4747);
    }

    #[test]
    fn defaults_survive_serialization() {
        let content = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.capture.sample_rate, 16000);
        assert_eq!(parsed.server.endpoint, Config::default().server.endpoint);
    }
}
