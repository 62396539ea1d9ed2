// SPDX-License-Identifier: MIT

//! Perception events and threat assessments

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Output of the vision analysis for one frame
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VisionEvent {
    pub timestamp: f64,
    pub source: String,
    pub detected_objects: BTreeSet<String>,
    pub anomalies: BTreeSet<String>,
    pub frame_id: u64,
    /// Set when the event is a fallback rather than a model result
    #[serde(default)]
    pub degraded: bool,
}

impl VisionEvent {
    pub fn sees(&self, object: &str) -> bool {
        self.detected_objects.contains(object)
    }

    pub fn has_anomaly(&self, anomaly: &str) -> bool {
        self.anomalies.contains(anomaly)
    }
}

/// Output of the audio analysis for one chunk
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AudioEvent {
    pub timestamp: f64,
    pub source: String,
    pub detected_sounds: BTreeSet<String>,
    pub decibel_level: f64,
    pub chunk_id: u64,
    #[serde(default)]
    pub degraded: bool,
}

impl AudioEvent {
    pub fn hears(&self, sound: &str) -> bool {
        self.detected_sounds.contains(sound)
    }
}

/// Either kind of perception event
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum PerceptionEvent {
    Vision(VisionEvent),
    Audio(AudioEvent),
}

impl PerceptionEvent {
    pub fn source(&self) -> &str {
        match self {
            PerceptionEvent::Vision(e) => &e.source,
            PerceptionEvent::Audio(e) => &e.source,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            PerceptionEvent::Vision(e) => e.timestamp,
            PerceptionEvent::Audio(e) => e.timestamp,
        }
    }

    pub fn is_degraded(&self) -> bool {
        match self {
            PerceptionEvent::Vision(e) => e.degraded,
            PerceptionEvent::Audio(e) => e.degraded,
        }
    }
}

impl From<VisionEvent> for PerceptionEvent {
    fn from(event: VisionEvent) -> Self {
        PerceptionEvent::Vision(event)
    }
}

impl From<AudioEvent> for PerceptionEvent {
    fn from(event: AudioEvent) -> Self {
        PerceptionEvent::Audio(event)
    }
}

/// Threat severity, ordered `Low < Medium < High`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined verdict produced by the fusion node
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThreatAssessment {
    pub threat_level: ThreatLevel,
    pub reasoning: String,
    /// Recommended actions in rule order; duplicates are kept
    pub actions: Vec<String>,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_vision_event() {
        let event = VisionEvent {
            timestamp: 1.0,
            source: "camera_01".to_string(),
            detected_objects: labels(&["person"]),
            anomalies: labels(&[]),
            frame_id: 1,
            degraded: false,
        };
        assert_eq!(event.source, "camera_01");
        assert!(event.sees("person"));
        assert!(!event.has_anomaly("unattended_bag"));
    }

    #[test]
    fn test_audio_event_deserialize_defaults_degraded() {
        let json = r#"{
            "timestamp": 2.5,
            "source": "mic_01",
            "detected_sounds": ["glass_break"],
            "decibel_level": 85.5,
            "chunk_id": 1
        }"#;
        let event: AudioEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.decibel_level, 85.5);
        assert!(event.hears("glass_break"));
        assert!(!event.degraded);
    }

    #[test]
    fn test_perception_event_accessors() {
        let event: PerceptionEvent = AudioEvent {
            timestamp: 3.0,
            source: "mic_01".to_string(),
            detected_sounds: labels(&["silence"]),
            decibel_level: 45.0,
            chunk_id: 202,
            degraded: true,
        }
        .into();
        assert_eq!(event.source(), "mic_01");
        assert_eq!(event.timestamp(), 3.0);
        assert!(event.is_degraded());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["modality"], "audio");
    }

    #[test]
    fn test_threat_level_order_and_labels() {
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert_eq!(ThreatLevel::High.max(ThreatLevel::Medium), ThreatLevel::High);
        assert_eq!(ThreatLevel::default(), ThreatLevel::Low);

        assert_eq!(ThreatLevel::Medium.to_string(), "MEDIUM");
        assert_eq!(
            serde_json::to_value(ThreatLevel::High).unwrap(),
            serde_json::json!("HIGH")
        );
        let parsed: ThreatLevel = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(parsed, ThreatLevel::Low);
    }
}
