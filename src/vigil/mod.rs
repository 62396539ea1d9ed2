// SPDX-License-Identifier: MIT

//! Threat-detection pipeline built on the engine
//!
//! Two perception nodes observe the scene, a fusion node turns their
//! observations into a [`schemas::ThreatAssessment`], and an action node
//! runs the recommended actions when the level is MEDIUM or above.

pub mod config;
pub mod error;
pub mod evaluate;
pub mod fusion;
pub mod nodes;
pub mod perception;
pub mod pipeline;
pub mod report;
pub mod schemas;
pub mod server;
pub mod simulator;
pub mod state;

pub use config::VigilConfig;
pub use error::VigilError;
pub use pipeline::{build_graph, Perception, Pipeline, ThreatRoute};
pub use report::InvocationReport;
pub use state::{PipelineState, StatePatch};
