// SPDX-License-Identifier: MIT

//! Node trait - a single named step of a graph

use async_trait::async_trait;

use super::error::NodeError;
use super::state::GraphState;

/// A unit of work that reads the state and returns a patch for it
///
/// A node only sees a shared reference, so it cannot mutate the container
/// it is handed. Logging and other side effects are fine as long as the
/// returned patch does not depend on them.
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    async fn run(&self, state: &S) -> Result<S::Patch, NodeError>;
}
