// SPDX-License-Identifier: MIT

//! Built-in models and fallback observations

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{PerceptionModel, Unavailable};
use crate::vigil::schemas::{AudioEvent, VisionEvent};

pub const VISION_SOURCE: &str = "camera_01";
pub const AUDIO_SOURCE: &str = "mic_01";

const FALLBACK_FRAME_ID: u64 = 101;
const FALLBACK_CHUNK_ID: u64 = 202;
const FALLBACK_DECIBEL_LEVEL: f64 = 45.0;

/// Wall-clock time as fractional seconds since the Unix epoch
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Label-free vision observation used when no model result is available
pub fn fallback_vision(reason: &Unavailable) -> VisionEvent {
    log::warn!("Vision degraded: {}", reason);
    VisionEvent {
        timestamp: now_seconds(),
        source: VISION_SOURCE.to_string(),
        detected_objects: BTreeSet::new(),
        anomalies: BTreeSet::new(),
        frame_id: FALLBACK_FRAME_ID,
        degraded: true,
    }
}

/// Label-free audio observation used when no model result is available
pub fn fallback_audio(reason: &Unavailable) -> AudioEvent {
    log::warn!("Audio degraded: {}", reason);
    AudioEvent {
        timestamp: now_seconds(),
        source: AUDIO_SOURCE.to_string(),
        detected_sounds: BTreeSet::new(),
        decibel_level: FALLBACK_DECIBEL_LEVEL,
        chunk_id: FALLBACK_CHUNK_ID,
        degraded: true,
    }
}

fn label_set<I, T>(labels: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    labels.into_iter().map(Into::into).collect()
}

/// Vision model that reports the same labels for every non-empty frame
#[derive(Debug)]
pub struct ScriptedVisionModel {
    objects: BTreeSet<String>,
    anomalies: BTreeSet<String>,
    next_frame: AtomicU64,
}

impl ScriptedVisionModel {
    pub fn new<I, J, T, U>(objects: I, anomalies: J) -> Self
    where
        I: IntoIterator<Item = T>,
        J: IntoIterator<Item = U>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            objects: label_set(objects),
            anomalies: label_set(anomalies),
            next_frame: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl PerceptionModel<VisionEvent> for ScriptedVisionModel {
    async fn analyze(&self, payload: &[u8]) -> Result<VisionEvent, Unavailable> {
        if payload.is_empty() {
            return Err(Unavailable::AnalysisFailed {
                model: "vision".to_string(),
                reason: "empty frame".to_string(),
            });
        }
        Ok(VisionEvent {
            timestamp: now_seconds(),
            source: VISION_SOURCE.to_string(),
            detected_objects: self.objects.clone(),
            anomalies: self.anomalies.clone(),
            frame_id: self.next_frame.fetch_add(1, Ordering::Relaxed),
            degraded: false,
        })
    }
}

/// Audio model that reports the same sounds for every non-empty chunk
#[derive(Debug)]
pub struct ScriptedAudioModel {
    sounds: BTreeSet<String>,
    decibel_level: f64,
    next_chunk: AtomicU64,
}

impl ScriptedAudioModel {
    pub fn new<I, T>(sounds: I, decibel_level: f64) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            sounds: label_set(sounds),
            decibel_level,
            next_chunk: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl PerceptionModel<AudioEvent> for ScriptedAudioModel {
    async fn analyze(&self, payload: &[u8]) -> Result<AudioEvent, Unavailable> {
        if payload.is_empty() {
            return Err(Unavailable::AnalysisFailed {
                model: "audio".to_string(),
                reason: "empty chunk".to_string(),
            });
        }
        Ok(AudioEvent {
            timestamp: now_seconds(),
            source: AUDIO_SOURCE.to_string(),
            detected_sounds: self.sounds.clone(),
            decibel_level: self.decibel_level,
            chunk_id: self.next_chunk.fetch_add(1, Ordering::Relaxed),
            degraded: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_are_label_free() {
        let reason = Unavailable::NoPayload("vision".to_string());
        let vision = fallback_vision(&reason);
        assert_eq!(vision.source, "camera_01");
        assert_eq!(vision.frame_id, 101);
        assert!(vision.detected_objects.is_empty());
        assert!(vision.anomalies.is_empty());
        assert!(vision.degraded);

        let audio = fallback_audio(&reason);
        assert_eq!(audio.source, "mic_01");
        assert_eq!(audio.chunk_id, 202);
        assert_eq!(audio.decibel_level, 45.0);
        assert!(audio.detected_sounds.is_empty());
        assert!(audio.degraded);
    }

    #[tokio::test]
    async fn test_scripted_vision_increments_frames() {
        let model = ScriptedVisionModel::new(["person"], ["unattended_bag"]);
        let first = model.analyze(b"frame").await.unwrap();
        let second = model.analyze(b"frame").await.unwrap();
        assert!(first.sees("person"));
        assert!(first.has_anomaly("unattended_bag"));
        assert!(!first.degraded);
        assert_eq!(second.frame_id, first.frame_id + 1);
        assert!(second.timestamp >= first.timestamp);
    }

    #[tokio::test]
    async fn test_scripted_audio_rejects_empty_chunk() {
        let model = ScriptedAudioModel::new(["glass_breaking"], 80.0);
        let event = model.analyze(&[0, 0, 0, 0]).await.unwrap();
        assert!(event.hears("glass_breaking"));
        assert_eq!(event.decibel_level, 80.0);

        let err = model.analyze(&[]).await.unwrap_err();
        assert!(matches!(err, Unavailable::AnalysisFailed { .. }));
    }
}
