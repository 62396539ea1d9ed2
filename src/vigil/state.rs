// SPDX-License-Identifier: MIT

//! Pipeline state container and its merge policy

use serde::Serialize;

use super::schemas::{AudioEvent, PerceptionEvent, ThreatAssessment, VisionEvent};
use crate::engine::GraphState;

/// Label reported when no assessment was produced
pub const NO_THREAT_LEVEL: &str = "NONE";

/// State threaded through one pipeline invocation
///
/// Raw payloads are fixed at construction. Derived fields start unset and
/// change only through [`StatePatch`]es merged by the executor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineState {
    #[serde(skip)]
    image_data: Option<Vec<u8>>,
    #[serde(skip)]
    audio_data: Option<Vec<u8>>,
    visual_observation: Option<VisionEvent>,
    audio_observation: Option<AudioEvent>,
    assessment: Option<ThreatAssessment>,
    action_log: Vec<String>,
}

impl PipelineState {
    pub fn new(image_data: Option<Vec<u8>>, audio_data: Option<Vec<u8>>) -> Self {
        Self {
            image_data,
            audio_data,
            ..Self::default()
        }
    }

    pub fn image_data(&self) -> Option<&[u8]> {
        self.image_data.as_deref()
    }

    pub fn audio_data(&self) -> Option<&[u8]> {
        self.audio_data.as_deref()
    }

    pub fn visual_observation(&self) -> Option<&VisionEvent> {
        self.visual_observation.as_ref()
    }

    pub fn audio_observation(&self) -> Option<&AudioEvent> {
        self.audio_observation.as_ref()
    }

    pub fn assessment(&self) -> Option<&ThreatAssessment> {
        self.assessment.as_ref()
    }

    pub fn action_log(&self) -> &[String] {
        &self.action_log
    }

    /// All observations written so far, vision first
    pub fn observations(&self) -> Vec<PerceptionEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(vision) = &self.visual_observation {
            events.push(PerceptionEvent::Vision(vision.clone()));
        }
        if let Some(audio) = &self.audio_observation {
            events.push(PerceptionEvent::Audio(audio.clone()));
        }
        events
    }

    /// `"LOW"`, `"MEDIUM"`, `"HIGH"`, or `"NONE"` without an assessment
    pub fn threat_level_label(&self) -> &'static str {
        self.assessment
            .as_ref()
            .map(|a| a.threat_level.as_str())
            .unwrap_or(NO_THREAT_LEVEL)
    }
}

/// A partial update to [`PipelineState`], one variant per derived field
#[derive(Debug, Clone, PartialEq)]
pub enum StatePatch {
    VisualObservation(VisionEvent),
    AudioObservation(AudioEvent),
    Assessment(ThreatAssessment),
    /// Entries appended to the action log
    ActionLog(Vec<String>),
}

impl GraphState for PipelineState {
    type Patch = StatePatch;

    fn apply(&mut self, patch: StatePatch) {
        match patch {
            StatePatch::VisualObservation(event) => self.visual_observation = Some(event),
            StatePatch::AudioObservation(event) => self.audio_observation = Some(event),
            StatePatch::Assessment(assessment) => self.assessment = Some(assessment),
            StatePatch::ActionLog(entries) => self.action_log.extend(entries),
        }
    }
}
