//! Edge table type definitions
//!
//! This module defines successor targets, the router trait behind
//! conditional edges, and the serializable description of an edge table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Reserved name of the terminal marker
pub const END: &str = "__end__";

/// Where control goes after a node
///
/// Serialized as a plain name, with the terminal marker spelled [`END`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Run the named node next
    Node(String),
    /// Stop and return the accumulated state
    End,
}

impl Target {
    pub fn node(name: impl Into<String>) -> Self {
        Target::Node(name.into())
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Target::End)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        if name == END {
            Target::End
        } else {
            Target::Node(name.to_string())
        }
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::from(name.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Node(name) => write!(f, "{}", name),
            Target::End => write!(f, "{}", END),
        }
    }
}

impl Serialize for Target {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Target::from)
    }
}

/// Decides the successor of a node from the current state
///
/// `targets` must list every value `route` can return, so that
/// compilation can check them without running any code.
pub trait Router<S>: Send + Sync + fmt::Debug {
    /// All targets this router may choose
    fn targets(&self) -> Vec<Target>;

    /// Pick a successor for the given state
    fn route(&self, state: &S) -> Target;

    /// Serializable description of the routing rule
    fn describe(&self) -> serde_json::Value {
        serde_json::Value::String(format!("{:?}", self))
    }
}

/// Successor specification for one node
pub enum Edge<S> {
    /// Always go to the same target
    Fixed(Target),
    /// Ask a router
    Conditional(Arc<dyn Router<S>>),
}

impl<S> Edge<S> {
    /// Every target this edge can lead to
    pub fn targets(&self) -> Vec<Target> {
        match self {
            Edge::Fixed(target) => vec![target.clone()],
            Edge::Conditional(router) => router.targets(),
        }
    }

    /// Resolve the successor against a state
    pub fn resolve(&self, state: &S) -> Target {
        match self {
            Edge::Fixed(target) => target.clone(),
            Edge::Conditional(router) => router.route(state),
        }
    }

    pub fn describe(&self, from: &str) -> EdgeSpec {
        match self {
            Edge::Fixed(target) => EdgeSpec {
                from: from.to_string(),
                kind: EdgeKind::Fixed,
                targets: vec![target.clone()],
                rule: None,
            },
            Edge::Conditional(router) => EdgeSpec {
                from: from.to_string(),
                kind: EdgeKind::Conditional,
                targets: router.targets(),
                rule: Some(router.describe()),
            },
        }
    }
}

impl<S> Clone for Edge<S> {
    fn clone(&self) -> Self {
        match self {
            Edge::Fixed(target) => Edge::Fixed(target.clone()),
            Edge::Conditional(router) => Edge::Conditional(router.clone()),
        }
    }
}

/// Kind of edge in a description
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Fixed,
    Conditional,
}

/// Serializable view of one row of the edge table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EdgeSpec {
    pub from: String,
    pub kind: EdgeKind,
    pub targets: Vec<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Threshold(i64);

    impl Router<i64> for Threshold {
        fn targets(&self) -> Vec<Target> {
            vec![Target::node("big"), Target::End]
        }

        fn route(&self, state: &i64) -> Target {
            if *state >= self.0 {
                Target::node("big")
            } else {
                Target::End
            }
        }
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!(Target::from("vision"), Target::node("vision"));
        assert_eq!(Target::from(END), Target::End);
        assert!(Target::from(END.to_string()).is_end());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::node("audio").to_string(), "audio");
        assert_eq!(Target::End.to_string(), END);
    }

    #[test]
    fn test_fixed_edge_resolves_to_target() {
        let edge: Edge<i64> = Edge::Fixed(Target::node("audio"));
        assert_eq!(edge.resolve(&0), Target::node("audio"));
        assert_eq!(edge.targets(), vec![Target::node("audio")]);
    }

    #[test]
    fn test_conditional_edge_uses_router() {
        let edge: Edge<i64> = Edge::Conditional(Arc::new(Threshold(10)));
        assert_eq!(edge.resolve(&12), Target::node("big"));
        assert_eq!(edge.resolve(&3), Target::End);
        assert_eq!(edge.targets().len(), 2);
    }

    #[test]
    fn test_edge_spec_serializes() {
        let edge: Edge<i64> = Edge::Fixed(Target::End);
        let spec = edge.describe("action");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["from"], "action");
        assert_eq!(json["kind"], "fixed");
        assert_eq!(json["targets"][0], END);
        assert!(json.get("rule").is_none());
    }

    #[test]
    fn test_target_serializes_as_name() {
        let targets = vec![Target::node("action"), Target::End];
        let json = serde_json::to_value(&targets).unwrap();
        assert_eq!(json, serde_json::json!(["action", "__end__"]));

        let parsed: Vec<Target> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, targets);
    }
}
