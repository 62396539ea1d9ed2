// SPDX-License-Identifier: MIT

//! Typed errors for graph construction and execution
//!
//! Construction problems surface as [`GraphDefinitionError`] from
//! `StateGraph::compile`. Run-time problems surface as a [`Failure`], which
//! pairs an [`ExecutionError`] with the partial state merged before the run
//! stopped.

use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Error type returned by a node's own work
pub type NodeError = Box<dyn Error + Send + Sync>;

/// Problems found while compiling a graph definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphDefinitionError {
    /// No entry point was set
    #[error("Graph has no entry point")]
    MissingEntryPoint,

    /// The entry point does not name a registered node
    #[error("Entry point '{0}' is not a registered node")]
    UnknownEntryPoint(String),

    /// Two nodes were registered under the same name
    #[error("Node '{0}' is registered more than once")]
    DuplicateNode(String),

    /// A node tried to use the terminal marker as its name
    #[error("Node name '{0}' is reserved for the terminal marker")]
    ReservedName(String),

    /// An edge leaves a node that was never registered
    #[error("Edge declared from unregistered node '{0}'")]
    UnknownSource(String),

    /// A fixed edge points at a node that was never registered
    #[error("Edge '{from}' -> '{to}' targets an unregistered node")]
    UnknownTarget { from: String, to: String },

    /// A conditional edge declares a target that was never registered
    #[error("Conditional edge from '{from}' declares unregistered target '{to}'")]
    UnknownConditionalTarget { from: String, to: String },

    /// A conditional edge declares no targets at all
    #[error("Conditional edge from '{0}' declares no targets")]
    EmptyConditionalTargets(String),

    /// More than one outgoing edge was declared for a node
    #[error("Node '{0}' already has an outgoing edge")]
    DuplicateEdge(String),

    /// A registered node has no outgoing edge
    #[error("Node '{0}' has no outgoing edge")]
    MissingEdge(String),
}

/// Reasons a single invocation stopped before reaching the terminal marker
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The walk scheduled a node it had already visited
    #[error("Cycle detected: node '{node}' revisited after {path:?}")]
    CycleDetected { node: String, path: Vec<String> },

    /// A node returned an error
    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: NodeError,
    },

    /// A routing step produced no successor for a node
    #[error("No successor defined for node '{0}'")]
    NoSuccessor(String),

    /// A router picked a target it never declared
    #[error("Node '{from}' routed to undeclared target '{to}'")]
    UndeclaredTarget { from: String, to: String },

    /// The invoker cancelled the run
    #[error("Execution cancelled before completing node '{node}'")]
    Cancelled { node: String },
}

impl ExecutionError {
    /// Name of the node the run stopped at
    pub fn node(&self) -> &str {
        match self {
            Self::CycleDetected { node, .. }
            | Self::NodeFailed { node, .. }
            | Self::Cancelled { node } => node,
            Self::NoSuccessor(node) | Self::UndeclaredTarget { from: node, .. } => node,
        }
    }
}

/// A failed invocation: the error plus whatever state had been merged so far
pub struct Failure<S> {
    pub error: ExecutionError,
    pub partial: S,
}

impl<S> Failure<S> {
    pub fn new(error: ExecutionError, partial: S) -> Self {
        Self { error, partial }
    }

    /// Name of the node at which the invocation stopped
    pub fn failed_node(&self) -> &str {
        self.error.node()
    }

    pub fn into_parts(self) -> (ExecutionError, S) {
        (self.error, self.partial)
    }
}

impl<S: fmt::Debug> fmt::Debug for Failure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("error", &self.error)
            .field("partial", &self.partial)
            .finish()
    }
}

impl<S> fmt::Display for Failure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<S: fmt::Debug> Error for Failure<S> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}
