// SPDX-License-Identifier: MIT

//! Invocation report handed back to callers

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::schemas::ThreatAssessment;
use super::state::{PipelineState, NO_THREAT_LEVEL};
use crate::engine::Failure;

/// Summary of one pipeline invocation
///
/// `threat_level` is `"LOW"`, `"MEDIUM"`, `"HIGH"`, or `"NONE"` when no
/// assessment was produced. A failed run always reports `"NONE"`; an
/// assessment merged before the failure is kept in `partial_assessment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationReport {
    pub invocation_id: Uuid,
    pub threat_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub actions: Vec<String>,
    pub action_log: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub duration_seconds: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_assessment: Option<ThreatAssessment>,
}

impl InvocationReport {
    pub fn from_outcome(
        invocation_id: Uuid,
        outcome: &Result<PipelineState, Failure<PipelineState>>,
        elapsed: Duration,
    ) -> Self {
        let (state, failure) = match outcome {
            Ok(state) => (state, None),
            Err(failure) => (&failure.partial, Some(failure)),
        };
        let verdict = if failure.is_none() {
            state.assessment()
        } else {
            None
        };

        Self {
            invocation_id,
            threat_level: verdict
                .map(|a| a.threat_level.as_str())
                .unwrap_or(NO_THREAT_LEVEL)
                .to_string(),
            reasoning: verdict.map(|a| a.reasoning.clone()),
            actions: verdict.map(|a| a.actions.clone()).unwrap_or_default(),
            action_log: state.action_log().to_vec(),
            confidence: verdict.map(|a| a.confidence),
            duration_seconds: elapsed.as_secs_f64(),
            success: failure.is_none(),
            failed_node: failure.map(|f| f.failed_node().to_string()),
            error: failure.map(|f| f.error.to_string()),
            partial_assessment: failure.and_then(|f| f.partial.assessment().cloned()),
        }
    }
}
