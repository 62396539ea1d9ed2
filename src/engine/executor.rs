//! Graph executor
//!
//! Walks a [`CompiledGraph`] from its entry point one node at a time:
//! run the node, merge its patch, then resolve the successor against the
//! merged state. The walk ends at the terminal marker or at the first
//! failure, which is returned together with the partial state.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::{ExecutionError, Failure};
use super::graph::{CompiledGraph, Target};
use super::observer::{EventKind, ExecutionEvent, NoopObserver, Observer};
use super::state::GraphState;

/// Runs one invocation of a compiled graph at a time; cheap to share
pub struct Executor<S: GraphState> {
    graph: Arc<CompiledGraph<S>>,
    observer: Arc<dyn Observer>,
}

impl<S: GraphState> Clone for Executor<S> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            observer: self.observer.clone(),
        }
    }
}

impl<S: GraphState> Executor<S> {
    pub fn new(graph: Arc<CompiledGraph<S>>) -> Self {
        Self {
            graph,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn graph(&self) -> &CompiledGraph<S> {
        &self.graph
    }

    /// Run the graph to completion
    pub async fn run(&self, initial: S) -> Result<S, Failure<S>> {
        self.run_with_cancel(initial, CancellationToken::new()).await
    }

    /// Run the graph, stopping early if `cancel` fires
    ///
    /// Cancellation is checked before each node and raced against the node
    /// in flight. State merged before the cancellation is kept.
    pub async fn run_with_cancel(
        &self,
        initial: S,
        cancel: CancellationToken,
    ) -> Result<S, Failure<S>> {
        self.run_as(Uuid::new_v4(), initial, cancel).await
    }

    /// Run under a caller-chosen invocation id, used to tag every event
    pub async fn run_as(
        &self,
        invocation_id: Uuid,
        initial: S,
        cancel: CancellationToken,
    ) -> Result<S, Failure<S>> {
        let started = Instant::now();

        log::info!(
            "[{}] Starting graph run at '{}'",
            invocation_id,
            self.graph.entry_point()
        );

        let result = self.walk(invocation_id, initial, &cancel).await;

        let error_detail = result.as_ref().err().map(|f| f.error.to_string());
        self.observer.record(&ExecutionEvent::new(
            invocation_id,
            EventKind::Invocation,
            "graph",
            started.elapsed(),
            error_detail,
        ));

        match &result {
            Ok(_) => log::info!("[{}] Graph run completed", invocation_id),
            Err(failure) => log::error!("[{}] Graph run failed: {}", invocation_id, failure),
        }

        result
    }

    async fn walk(
        &self,
        invocation_id: Uuid,
        mut state: S,
        cancel: &CancellationToken,
    ) -> Result<S, Failure<S>> {
        let mut current = self.graph.entry_point().to_string();
        let mut visited: HashSet<String> = HashSet::new();
        let mut path: Vec<String> = Vec::new();

        loop {
            if !visited.insert(current.clone()) {
                return Err(Failure::new(
                    ExecutionError::CycleDetected {
                        node: current,
                        path,
                    },
                    state,
                ));
            }
            path.push(current.clone());

            if cancel.is_cancelled() {
                return Err(Failure::new(
                    ExecutionError::Cancelled { node: current },
                    state,
                ));
            }

            // Compilation guarantees every target is registered
            let Some(node) = self.graph.node(&current) else {
                return Err(Failure::new(ExecutionError::NoSuccessor(current), state));
            };

            log::debug!("[{}] Executing node: {}", invocation_id, current);
            let node_started = Instant::now();

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = node.run(&state) => Some(result),
            };

            match outcome {
                None => {
                    self.record_node(invocation_id, &current, node_started, Some("cancelled"));
                    return Err(Failure::new(
                        ExecutionError::Cancelled { node: current },
                        state,
                    ));
                }
                Some(Err(e)) => {
                    let detail = e.to_string();
                    self.record_node(invocation_id, &current, node_started, Some(detail.as_str()));
                    log::error!("[{}] Node {} failed: {}", invocation_id, current, detail);
                    return Err(Failure::new(
                        ExecutionError::NodeFailed {
                            node: current,
                            source: e,
                        },
                        state,
                    ));
                }
                Some(Ok(patch)) => {
                    state.apply(patch);
                    self.record_node(invocation_id, &current, node_started, None);
                }
            }

            match self.graph.successor(&current, &state) {
                Ok(Target::End) => {
                    log::debug!("[{}] Node {} routed to end", invocation_id, current);
                    return Ok(state);
                }
                Ok(Target::Node(next)) => {
                    log::debug!("[{}] Node {} routed to {}", invocation_id, current, next);
                    current = next;
                }
                Err(e) => {
                    log::error!("[{}] Routing after {} failed: {}", invocation_id, current, e);
                    return Err(Failure::new(e, state));
                }
            }
        }
    }

    fn record_node(&self, invocation_id: Uuid, name: &str, started: Instant, error: Option<&str>) {
        self.observer.record(&ExecutionEvent::new(
            invocation_id,
            EventKind::Node,
            name,
            started.elapsed(),
            error.map(str::to_string),
        ));
    }
}
