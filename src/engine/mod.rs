// SPDX-License-Identifier: MIT

//! Workflow engine - a small state-graph runner
//!
//! This module provides the generic pieces:
//! - `GraphState` - the state container contract and its merge hook
//! - `Node` - a named step returning a patch for the state
//! - `StateGraph` / `CompiledGraph` - node registry, edge table, validation
//! - `Executor` - walks a compiled graph from entry point to terminal marker
//! - `Observer` - fire-and-forget execution events

pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod observer;
pub mod state;

pub use error::{ExecutionError, Failure, GraphDefinitionError, NodeError};
pub use executor::Executor;
pub use graph::{CompiledGraph, Router, StateGraph, Target, END};
pub use node::Node;
pub use observer::{EventKind, ExecutionEvent, Observer};
pub use state::GraphState;
