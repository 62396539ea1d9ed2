// SPDX-License-Identifier: MIT

//! Graph definition: node registry and edge table
//!
//! Graphs are assembled with [`StateGraph`] and validated into a
//! [`CompiledGraph`], which the executor walks.

mod builder;
pub mod types;

pub use builder::{CompiledGraph, StateGraph};
pub use types::{Edge, EdgeKind, EdgeSpec, Router, Target, END};
