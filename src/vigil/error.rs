// SPDX-License-Identifier: MIT

//! Application-level errors

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::GraphDefinitionError;

#[derive(Debug, Error)]
pub enum VigilError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pipeline graph: {0}")]
    Graph(#[from] GraphDefinitionError),

    #[error("Invalid {field} payload: {source}")]
    Payload {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

pub type Result<T> = std::result::Result<T, VigilError>;
