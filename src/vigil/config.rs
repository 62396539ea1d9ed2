// SPDX-License-Identifier: MIT

//! Configuration loading
//!
//! Settings come from an optional YAML file, then environment overrides:
//! `VIGIL_CONFIG` (file path), `VIGIL_HOST`, `VIGIL_PORT`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{Result, VigilError};
use super::perception::{ModelHandle, ScriptedAudioModel, ScriptedVisionModel};
use super::pipeline::{Perception, AUDIO, VISION};
use super::schemas::{AudioEvent, VisionEvent};

pub const CONFIG_ENV: &str = "VIGIL_CONFIG";
pub const HOST_ENV: &str = "VIGIL_HOST";
pub const PORT_ENV: &str = "VIGIL_PORT";

const DEFAULT_DECIBEL_LEVEL: f64 = 45.0;

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VigilConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub vision: VisionModelConfig,
    pub audio: AudioModelConfig,
}

/// Which vision model backs the vision node
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisionModelConfig {
    #[default]
    Disabled,
    Scripted {
        #[serde(default)]
        objects: Vec<String>,
        #[serde(default)]
        anomalies: Vec<String>,
    },
}

impl VisionModelConfig {
    pub fn handle(&self) -> ModelHandle<VisionEvent> {
        match self {
            VisionModelConfig::Disabled => ModelHandle::disabled(VISION),
            VisionModelConfig::Scripted { objects, anomalies } => {
                let model = ScriptedVisionModel::new(objects.clone(), anomalies.clone());
                ModelHandle::ready(VISION, Arc::new(model))
            }
        }
    }
}

/// Which audio model backs the audio node
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioModelConfig {
    #[default]
    Disabled,
    Scripted {
        #[serde(default)]
        sounds: Vec<String>,
        #[serde(default = "default_decibel_level")]
        decibel_level: f64,
    },
}

fn default_decibel_level() -> f64 {
    DEFAULT_DECIBEL_LEVEL
}

impl AudioModelConfig {
    pub fn handle(&self) -> ModelHandle<AudioEvent> {
        match self {
            AudioModelConfig::Disabled => ModelHandle::disabled(AUDIO),
            AudioModelConfig::Scripted {
                sounds,
                decibel_level,
            } => {
                let model = ScriptedAudioModel::new(sounds.clone(), *decibel_level);
                ModelHandle::ready(AUDIO, Arc::new(model))
            }
        }
    }
}

impl VigilConfig {
    /// Load from `path`, or from `VIGIL_CONFIG`, or fall back to defaults,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| VigilError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_yaml(&content)
    }

    pub fn parse_yaml(content: &str) -> Result<Self> {
        let config: VigilConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Apply host and port overrides from a key lookup (normally the environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV) {
            self.server.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .parse()
                .map_err(|_| VigilError::Config(format!("{} is not a port: {}", PORT_ENV, port)))?;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| VigilError::Config(format!("Invalid host: {}", self.server.host)))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Build the perception capabilities this config describes
    pub fn perception(&self) -> Perception {
        Perception::new(self.models.vision.handle(), self.models.audio.handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = VigilConfig::parse_yaml("{}").unwrap();
        assert_eq!(config, VigilConfig::default());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.models.vision, VisionModelConfig::Disabled);
    }

    #[test]
    fn test_parse_scripted_models() {
        let yaml = r#"
server:
  host: 0.0.0.0
  port: 9100
models:
  vision:
    kind: scripted
    objects: [person]
    anomalies: [unattended_bag]
  audio:
    kind: scripted
    sounds: [glass_breaking]
"#;
        let config = VigilConfig::parse_yaml(yaml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert_eq!(
            config.models.vision,
            VisionModelConfig::Scripted {
                objects: vec!["person".to_string()],
                anomalies: vec!["unattended_bag".to_string()],
            }
        );
        match &config.models.audio {
            AudioModelConfig::Scripted {
                sounds,
                decibel_level,
            } => {
                assert_eq!(sounds, &vec!["glass_breaking".to_string()]);
                assert_eq!(*decibel_level, 45.0);
            }
            other => panic!("Expected scripted audio, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_model_kind_is_rejected() {
        let yaml = "models:\n  vision:\n    kind: transformer\n";
        assert!(matches!(
            VigilConfig::parse_yaml(yaml),
            Err(VigilError::Yaml(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = VigilConfig::default();
        config
            .apply_overrides(|key| match key {
                HOST_ENV => Some("10.0.0.5".to_string()),
                PORT_ENV => Some("9000".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            config.socket_addr().unwrap(),
            "10.0.0.5:9000".parse::<SocketAddr>().unwrap()
        );

        let err = config
            .apply_overrides(|key| (key == PORT_ENV).then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = VigilConfig::from_file("/nonexistent/vigil.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vigil.yaml"));
    }

    #[tokio::test]
    async fn test_perception_from_config() {
        let config = VigilConfig {
            models: ModelsConfig {
                vision: VisionModelConfig::Disabled,
                audio: AudioModelConfig::Scripted {
                    sounds: vec!["footsteps".to_string()],
                    decibel_level: 50.0,
                },
            },
            ..VigilConfig::default()
        };
        let perception = config.perception();

        assert!(perception.vision.analyze(Some(&b"x"[..])).await.is_err());
        let audio = perception.audio.analyze(Some(&b"x"[..])).await.unwrap();
        assert!(audio.hears("footsteps"));
        assert_eq!(audio.decibel_level, 50.0);
    }
}
