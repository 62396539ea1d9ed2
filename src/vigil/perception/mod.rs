// SPDX-License-Identifier: MIT

//! Perception capabilities used by the vision and audio nodes
//!
//! A model either returns an event or reports [`Unavailable`]; it never
//! fails the pipeline. Models are reached through a [`ModelHandle`], which
//! loads them once and caches the outcome.

mod handle;
mod models;

pub use handle::{DisabledLoader, ModelHandle, ReadyLoader};
pub use models::{
    fallback_audio, fallback_vision, now_seconds, ScriptedAudioModel, ScriptedVisionModel,
};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Why a perception result could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unavailable {
    /// The state carried no payload for this modality
    #[error("No {0} payload supplied")]
    NoPayload(String),

    /// No model is configured for this modality
    #[error("{0} model is not configured")]
    NotConfigured(String),

    /// Loading the model failed; the failure is cached
    #[error("{model} model failed to load: {reason}")]
    LoadFailed { model: String, reason: String },

    /// The model could not make sense of the payload
    #[error("{model} model could not analyze payload: {reason}")]
    AnalysisFailed { model: String, reason: String },
}

/// A loaded model for one modality
#[async_trait]
pub trait PerceptionModel<E>: Send + Sync {
    async fn analyze(&self, payload: &[u8]) -> Result<E, Unavailable>;
}

/// Produces a model on first use
#[async_trait]
pub trait ModelLoader<E>: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn PerceptionModel<E>>, Unavailable>;
}
