// SPDX-License-Identifier: MIT

//! Execution events and the observers that receive them
//!
//! Observers are fire-and-forget: `record` cannot fail and its outcome
//! never feeds back into the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// What an event measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// One node invocation
    Node,
    /// A whole graph invocation
    Invocation,
}

/// Structured record emitted around nodes and invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub invocation_id: Uuid,
    pub kind: EventKind,
    pub name: String,
    pub duration_seconds: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionEvent {
    pub fn new(
        invocation_id: Uuid,
        kind: EventKind,
        name: impl Into<String>,
        elapsed: Duration,
        error_detail: Option<String>,
    ) -> Self {
        Self {
            invocation_id,
            kind,
            name: name.into(),
            duration_seconds: elapsed.as_secs_f64(),
            success: error_detail.is_none(),
            error_detail,
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of execution events
pub trait Observer: Send + Sync {
    fn record(&self, event: &ExecutionEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn record(&self, _event: &ExecutionEvent) {}
}

/// Writes events through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn record(&self, event: &ExecutionEvent) {
        match &event.error_detail {
            None => log::info!(
                "[{}] {:?} '{}' finished in {:.3}s",
                event.invocation_id,
                event.kind,
                event.name,
                event.duration_seconds
            ),
            Some(detail) => log::warn!(
                "[{}] {:?} '{}' failed after {:.3}s: {}",
                event.invocation_id,
                event.kind,
                event.name,
                event.duration_seconds,
                detail
            ),
        }
    }
}

/// Forwards events into a tokio channel
///
/// Events are dropped when the channel is full or the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<ExecutionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<ExecutionEvent>) -> Self {
        Self { tx }
    }
}

impl Observer for ChannelObserver {
    fn record(&self, event: &ExecutionEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            log::debug!("Dropping execution event '{}': {}", event.name, e);
        }
    }
}

/// Sends every event to each inner observer in turn
#[derive(Clone, Default)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn Observer>>,
}

impl FanoutObserver {
    pub fn new(observers: Vec<Arc<dyn Observer>>) -> Self {
        Self { observers }
    }
}

impl Observer for FanoutObserver {
    fn record(&self, event: &ExecutionEvent) {
        for observer in &self.observers {
            observer.record(event);
        }
    }
}
