// SPDX-License-Identifier: MIT

//! Threat-detection pipeline topology
//!
//! ```text
//! vision -> audio -> aggregator -+-> action -> END
//!                                +-> END           (threat level below MEDIUM)
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::nodes::{ActionNode, AudioNode, FusionNode, VisionNode};
use super::perception::{ModelHandle, ScriptedAudioModel, ScriptedVisionModel};
use super::report::InvocationReport;
use super::schemas::{AudioEvent, ThreatLevel, VisionEvent};
use super::state::PipelineState;
use crate::engine::observer::{FanoutObserver, LogObserver};
use crate::engine::{
    CompiledGraph, Executor, Failure, GraphDefinitionError, Observer, Router, StateGraph, Target,
    END,
};

pub const VISION: &str = "vision";
pub const AUDIO: &str = "audio";
pub const AGGREGATOR: &str = "aggregator";
pub const ACTION: &str = "action";

/// Named routing rule for the edge leaving the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThreatRoute {
    /// Go to `then` when the assessed level is at least `level`, else end
    ThreatLevelAtLeast { level: ThreatLevel, then: String },
}

impl Router<PipelineState> for ThreatRoute {
    fn targets(&self) -> Vec<Target> {
        match self {
            ThreatRoute::ThreatLevelAtLeast { then, .. } => {
                vec![Target::node(then.as_str()), Target::End]
            }
        }
    }

    fn route(&self, state: &PipelineState) -> Target {
        match self {
            ThreatRoute::ThreatLevelAtLeast { level, then } => match state.assessment() {
                Some(assessment) if assessment.threat_level >= *level => {
                    Target::node(then.as_str())
                }
                _ => Target::End,
            },
        }
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Perception capabilities injected into the pipeline at build time
#[derive(Clone)]
pub struct Perception {
    pub vision: Arc<ModelHandle<VisionEvent>>,
    pub audio: Arc<ModelHandle<AudioEvent>>,
}

impl Perception {
    pub fn new(vision: ModelHandle<VisionEvent>, audio: ModelHandle<AudioEvent>) -> Self {
        Self {
            vision: Arc::new(vision),
            audio: Arc::new(audio),
        }
    }

    /// No models: every observation is a degraded fallback
    pub fn disabled() -> Self {
        Self::new(ModelHandle::disabled(VISION), ModelHandle::disabled(AUDIO))
    }

    /// Fixed-label models for both modalities
    pub fn scripted(vision: ScriptedVisionModel, audio: ScriptedAudioModel) -> Self {
        Self::new(
            ModelHandle::ready(VISION, Arc::new(vision)),
            ModelHandle::ready(AUDIO, Arc::new(audio)),
        )
    }
}

/// Wire the four nodes into the standard topology
pub fn build_graph(
    perception: &Perception,
) -> Result<CompiledGraph<PipelineState>, GraphDefinitionError> {
    let mut graph: StateGraph<PipelineState> = StateGraph::new();
    graph
        .add_node(VISION, Arc::new(VisionNode::new(perception.vision.clone())))
        .add_node(AUDIO, Arc::new(AudioNode::new(perception.audio.clone())))
        .add_node(AGGREGATOR, Arc::new(FusionNode))
        .add_node(ACTION, Arc::new(ActionNode))
        .set_entry_point(VISION)
        .add_edge(VISION, AUDIO)
        .add_edge(AUDIO, AGGREGATOR)
        .add_conditional_edges(
            AGGREGATOR,
            Arc::new(ThreatRoute::ThreatLevelAtLeast {
                level: ThreatLevel::Medium,
                then: ACTION.to_string(),
            }),
        )
        .add_edge(ACTION, END);
    graph.compile()
}

/// A compiled pipeline ready to be invoked concurrently
#[derive(Clone)]
pub struct Pipeline {
    executor: Executor<PipelineState>,
    observer: Arc<dyn Observer>,
}

impl Pipeline {
    pub fn new(perception: &Perception) -> Result<Self, GraphDefinitionError> {
        Ok(Self::from_graph(build_graph(perception)?))
    }

    /// Wrap an already compiled graph, e.g. a modified topology
    pub fn from_graph(graph: CompiledGraph<PipelineState>) -> Self {
        let observer: Arc<dyn Observer> = Arc::new(LogObserver);
        Self {
            executor: Executor::new(Arc::new(graph)).with_observer(observer.clone()),
            observer,
        }
    }

    /// Replace the observer that receives execution events
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.executor = self.executor.with_observer(observer.clone());
        self.observer = observer;
        self
    }

    /// A copy that also sends events to `extra`, e.g. for one streamed request
    pub fn observed_by(&self, extra: Arc<dyn Observer>) -> Self {
        let fanout: Arc<dyn Observer> =
            Arc::new(FanoutObserver::new(vec![self.observer.clone(), extra]));
        self.clone().with_observer(fanout)
    }

    pub fn graph(&self) -> &CompiledGraph<PipelineState> {
        self.executor.graph()
    }

    pub async fn run(
        &self,
        initial: PipelineState,
    ) -> Result<PipelineState, Failure<PipelineState>> {
        self.executor.run(initial).await
    }

    pub async fn run_with_cancel(
        &self,
        initial: PipelineState,
        cancel: CancellationToken,
    ) -> Result<PipelineState, Failure<PipelineState>> {
        self.executor.run_with_cancel(initial, cancel).await
    }

    /// Run one invocation over raw payloads and summarize it
    pub async fn assess(
        &self,
        image: Option<Vec<u8>>,
        audio: Option<Vec<u8>>,
    ) -> InvocationReport {
        self.assess_with_cancel(image, audio, CancellationToken::new())
            .await
    }

    pub async fn assess_with_cancel(
        &self,
        image: Option<Vec<u8>>,
        audio: Option<Vec<u8>>,
        cancel: CancellationToken,
    ) -> InvocationReport {
        let invocation_id = Uuid::new_v4();
        let started = Instant::now();
        let outcome = self
            .executor
            .run_as(invocation_id, PipelineState::new(image, audio), cancel)
            .await;
        InvocationReport::from_outcome(invocation_id, &outcome, started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::EdgeKind;
    use crate::engine::GraphState;
    use crate::vigil::schemas::ThreatAssessment;
    use crate::vigil::state::StatePatch;

    fn assessed(level: ThreatLevel) -> PipelineState {
        let mut state = PipelineState::default();
        state.apply(StatePatch::Assessment(ThreatAssessment {
            threat_level: level,
            reasoning: String::new(),
            actions: vec![],
            confidence: 0.9,
        }));
        state
    }

    #[test]
    fn test_threat_route_thresholds() {
        let route = ThreatRoute::ThreatLevelAtLeast {
            level: ThreatLevel::Medium,
            then: ACTION.to_string(),
        };
        assert_eq!(route.route(&assessed(ThreatLevel::Low)), Target::End);
        assert_eq!(route.route(&assessed(ThreatLevel::Medium)), Target::node(ACTION));
        assert_eq!(route.route(&assessed(ThreatLevel::High)), Target::node(ACTION));
        assert_eq!(route.route(&PipelineState::default()), Target::End);
        assert_eq!(route.targets(), vec![Target::node(ACTION), Target::End]);
    }

    #[test]
    fn test_threat_route_serializes_as_named_rule() {
        let route = ThreatRoute::ThreatLevelAtLeast {
            level: ThreatLevel::Medium,
            then: ACTION.to_string(),
        };
        let json = route.describe();
        assert_eq!(json["kind"], "threat_level_at_least");
        assert_eq!(json["level"], "MEDIUM");
        assert_eq!(json["then"], "action");

        let parsed: ThreatRoute = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, route);
    }

    #[test]
    fn test_build_graph_topology() {
        let graph = build_graph(&Perception::disabled()).unwrap();
        assert_eq!(graph.entry_point(), VISION);
        assert_eq!(
            graph.node_names().to_vec(),
            vec![VISION, AUDIO, AGGREGATOR, ACTION]
        );

        let edges = graph.describe();
        let conditional: Vec<_> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Conditional)
            .collect();
        assert_eq!(conditional.len(), 1);
        assert_eq!(conditional[0].from, AGGREGATOR);
    }

    #[tokio::test]
    async fn test_assess_without_payloads_is_low() {
        let pipeline = Pipeline::new(&Perception::disabled()).unwrap();
        let report = pipeline.assess(None, None).await;
        assert!(report.success);
        assert_eq!(report.threat_level, "LOW");
        assert!(report.action_log.is_empty());
    }
}
