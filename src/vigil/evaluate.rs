// SPDX-License-Identifier: MIT

//! Reference evaluation suite
//!
//! Each case pins the perception output with scripted models, runs the full
//! pipeline on simulated payloads and checks the resulting threat level.

use serde::Serialize;

use super::error::Result;
use super::perception::{ScriptedAudioModel, ScriptedVisionModel};
use super::pipeline::{Perception, Pipeline};
use super::report::InvocationReport;
use super::schemas::ThreatLevel;
use super::simulator;

/// One scripted scenario and the level it must produce
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationCase {
    pub id: u32,
    pub objects: &'static [&'static str],
    pub anomalies: &'static [&'static str],
    pub sounds: &'static [&'static str],
    pub expected: ThreatLevel,
}

pub const CASES: &[EvaluationCase] = &[
    EvaluationCase {
        id: 1,
        objects: &["person"],
        anomalies: &[],
        sounds: &["glass_breaking"],
        expected: ThreatLevel::High,
    },
    EvaluationCase {
        id: 2,
        objects: &["empty_hallway"],
        anomalies: &[],
        sounds: &["silence"],
        expected: ThreatLevel::Low,
    },
    EvaluationCase {
        id: 3,
        objects: &[],
        anomalies: &["unattended_bag"],
        sounds: &["footsteps"],
        expected: ThreatLevel::Medium,
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub id: u32,
    pub expected: ThreatLevel,
    pub threat_level: String,
    pub passed: bool,
    pub duration_seconds: f64,
    pub report: InvocationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub results: Vec<CaseResult>,
    pub passed: usize,
    pub failed: usize,
    pub average_latency_seconds: f64,
}

impl EvaluationSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Run one case on its own pipeline
pub async fn run_case(case: &EvaluationCase) -> Result<CaseResult> {
    let perception = Perception::scripted(
        ScriptedVisionModel::new(case.objects.iter().copied(), case.anomalies.iter().copied()),
        ScriptedAudioModel::new(case.sounds.iter().copied(), 45.0),
    );
    let pipeline = Pipeline::new(&perception)?;

    log::info!("Running case {}...", case.id);
    let report = pipeline
        .assess(
            Some(simulator::default_video_frame()),
            Some(simulator::default_audio_chunk()),
        )
        .await;

    let passed = report.success && report.threat_level == case.expected.as_str();
    log::info!(
        " -> Case {}: {} (expected {}, {:.3}s)",
        case.id,
        report.threat_level,
        case.expected,
        report.duration_seconds
    );

    Ok(CaseResult {
        id: case.id,
        expected: case.expected,
        threat_level: report.threat_level.clone(),
        passed,
        duration_seconds: report.duration_seconds,
        report,
    })
}

/// Run every case concurrently and summarize
pub async fn run_evaluation(cases: &[EvaluationCase]) -> Result<EvaluationSummary> {
    let results = futures::future::join_all(cases.iter().map(run_case))
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let passed = results.iter().filter(|r| r.passed).count();
    let average_latency_seconds = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.duration_seconds).sum::<f64>() / results.len() as f64
    };

    Ok(EvaluationSummary {
        passed,
        failed: results.len() - passed,
        average_latency_seconds,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reference_cases_pass() {
        let summary = run_evaluation(CASES).await.unwrap();
        assert_eq!(summary.results.len(), 3);
        assert!(summary.all_passed(), "{:#?}", summary);
        assert_eq!(summary.results[0].threat_level, "HIGH");
        assert_eq!(summary.results[1].threat_level, "LOW");
        assert_eq!(summary.results[2].threat_level, "MEDIUM");
        assert!(summary.average_latency_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_wrong_expectation_is_reported() {
        let case = EvaluationCase {
            id: 9,
            objects: &[],
            anomalies: &[],
            sounds: &["silence"],
            expected: ThreatLevel::High,
        };
        let summary = run_evaluation(&[case]).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed());
        assert_eq!(summary.results[0].threat_level, "LOW");
    }

    #[tokio::test]
    async fn test_empty_suite() {
        let summary = run_evaluation(&[]).await.unwrap();
        assert_eq!(summary.passed, 0);
        assert_eq!(summary.average_latency_seconds, 0.0);
    }
}
