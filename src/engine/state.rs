// SPDX-License-Identifier: MIT

//! State contract for graph execution
//!
//! The executor threads one value of a [`GraphState`] type through the
//! graph. Nodes never touch it directly; they return a patch, and the
//! state type decides how that patch is merged.

use std::fmt::Debug;

/// A state container that can absorb node patches
pub trait GraphState: Clone + Debug + Send + Sync + 'static {
    /// The partial update a node returns
    type Patch: Send + 'static;

    /// Merge a patch into the state
    fn apply(&mut self, patch: Self::Patch);
}
