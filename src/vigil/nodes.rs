// SPDX-License-Identifier: MIT

//! The four pipeline nodes

use async_trait::async_trait;
use std::sync::Arc;

use super::fusion;
use super::perception::{fallback_audio, fallback_vision, ModelHandle};
use super::schemas::{AudioEvent, VisionEvent};
use super::state::{PipelineState, StatePatch};
use crate::engine::{Node, NodeError};

/// Analyzes the image payload, falling back to a degraded observation
pub struct VisionNode {
    model: Arc<ModelHandle<VisionEvent>>,
}

impl VisionNode {
    pub fn new(model: Arc<ModelHandle<VisionEvent>>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node<PipelineState> for VisionNode {
    async fn run(&self, state: &PipelineState) -> Result<StatePatch, NodeError> {
        let event = match self.model.analyze(state.image_data()).await {
            Ok(event) => event,
            Err(reason) => fallback_vision(&reason),
        };
        log::debug!(
            "Vision: objects={:?} anomalies={:?}",
            event.detected_objects,
            event.anomalies
        );
        Ok(StatePatch::VisualObservation(event))
    }
}

/// Analyzes the audio payload, falling back to a degraded observation
pub struct AudioNode {
    model: Arc<ModelHandle<AudioEvent>>,
}

impl AudioNode {
    pub fn new(model: Arc<ModelHandle<AudioEvent>>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Node<PipelineState> for AudioNode {
    async fn run(&self, state: &PipelineState) -> Result<StatePatch, NodeError> {
        let event = match self.model.analyze(state.audio_data()).await {
            Ok(event) => event,
            Err(reason) => fallback_audio(&reason),
        };
        log::debug!("Audio: sounds={:?}", event.detected_sounds);
        Ok(StatePatch::AudioObservation(event))
    }
}

/// Combines both observations into a threat assessment
pub struct FusionNode;

#[async_trait]
impl Node<PipelineState> for FusionNode {
    async fn run(&self, state: &PipelineState) -> Result<StatePatch, NodeError> {
        let assessment = fusion::assess(state.visual_observation(), state.audio_observation());
        log::info!(
            "Threat assessment: {} ({})",
            assessment.threat_level,
            assessment.reasoning
        );
        Ok(StatePatch::Assessment(assessment))
    }
}

/// Executes the recommended actions and records them
pub struct ActionNode;

#[async_trait]
impl Node<PipelineState> for ActionNode {
    async fn run(&self, state: &PipelineState) -> Result<StatePatch, NodeError> {
        let mut log_entries = Vec::new();
        match state.assessment() {
            Some(assessment) if !assessment.actions.is_empty() => {
                log::info!(
                    "Executing actions for threat level: {}",
                    assessment.threat_level
                );
                for action in &assessment.actions {
                    log::info!(">> EXECUTING: {}", action);
                    log_entries.push(format!("Executed: {}", action));
                }
            }
            _ => log::info!("No actions to execute."),
        }
        Ok(StatePatch::ActionLog(log_entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphState;
    use crate::vigil::perception::{ScriptedAudioModel, ScriptedVisionModel};
    use crate::vigil::schemas::{ThreatAssessment, ThreatLevel};

    fn vision_node(objects: &[&str], anomalies: &[&str]) -> VisionNode {
        let model = ScriptedVisionModel::new(objects.to_vec(), anomalies.to_vec());
        let handle = ModelHandle::<VisionEvent>::ready("vision", Arc::new(model));
        VisionNode::new(Arc::new(handle))
    }

    #[tokio::test]
    async fn test_vision_node_uses_model() {
        let node = vision_node(&["person"], &[]);
        let state = PipelineState::new(Some(vec![1, 2, 3]), None);
        match node.run(&state).await.unwrap() {
            StatePatch::VisualObservation(event) => {
                assert!(event.sees("person"));
                assert!(!event.degraded);
            }
            other => panic!("Expected a visual observation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_vision_node_falls_back_without_payload() {
        let node = vision_node(&["person"], &["unattended_bag"]);
        let state = PipelineState::new(None, None);
        match node.run(&state).await.unwrap() {
            StatePatch::VisualObservation(event) => {
                assert!(event.degraded);
                assert!(event.detected_objects.is_empty());
                assert_eq!(event.frame_id, 101);
            }
            other => panic!("Expected a visual observation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_audio_node_falls_back_when_disabled() {
        let node = AudioNode::new(Arc::new(ModelHandle::<AudioEvent>::disabled("audio")));
        let state = PipelineState::new(None, Some(vec![0; 8]));
        match node.run(&state).await.unwrap() {
            StatePatch::AudioObservation(event) => {
                assert!(event.degraded);
                assert_eq!(event.source, "mic_01");
                assert_eq!(event.chunk_id, 202);
            }
            other => panic!("Expected an audio observation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fusion_node_reads_observations() {
        let audio = ScriptedAudioModel::new(["glass_breaking"], 80.0);
        let handle = ModelHandle::<AudioEvent>::ready("audio", Arc::new(audio));
        let audio_node = AudioNode::new(Arc::new(handle));

        let mut state = PipelineState::new(None, Some(vec![1]));
        let patch = audio_node.run(&state).await.unwrap();
        state.apply(patch);

        match FusionNode.run(&state).await.unwrap() {
            StatePatch::Assessment(assessment) => {
                assert_eq!(assessment.threat_level, ThreatLevel::High)
            }
            other => panic!("Expected an assessment, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_action_node_logs_in_order() {
        let mut state = PipelineState::default();
        state.apply(StatePatch::Assessment(ThreatAssessment {
            threat_level: ThreatLevel::High,
            reasoning: "test".to_string(),
            actions: vec!["trigger_alarm".to_string(), "lockdown_zone".to_string()],
            confidence: 0.9,
        }));

        let patch = ActionNode.run(&state).await.unwrap();
        assert_eq!(
            patch,
            StatePatch::ActionLog(vec![
                "Executed: trigger_alarm".to_string(),
                "Executed: lockdown_zone".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn test_action_node_without_assessment_logs_nothing() {
        let patch = ActionNode.run(&PipelineState::default()).await.unwrap();
        assert_eq!(patch, StatePatch::ActionLog(vec![]));
    }
}
