// SPDX-License-Identifier: Apache-2.0

use crate::ids::{NetId, NodeId, PinId};

/// The entity a caller referenced that is absent from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Node(NodeId),
    Pin(PinId),
    Net(NetId),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Node(id) => write!(f, "{}", id),
            Missing::Pin(id) => write!(f, "{}", id),
            Missing::Net(id) => write!(f, "{}", id),
        }
    }
}

/// Error type for graph construction, traversal, layering and expansion.
///
/// An empty traversal or layering result is never an error; those come back
/// as `Ok` with an empty collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExploreError {
    /// The caller referenced an id that does not exist in the loaded design.
    #[error("{0} was not found in the design")]
    NotFound(Missing),
    /// The inbound design bundle is internally inconsistent.
    #[error("malformed design: {0}")]
    MalformedDesign(String),
    /// A classification pattern or configuration document is invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// Internal consistency check failed; indicates a defect in this crate.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, ExploreError>;

impl From<NodeId> for ExploreError {
    fn from(id: NodeId) -> Self {
        ExploreError::NotFound(Missing::Node(id))
    }
}

impl From<PinId> for ExploreError {
    fn from(id: PinId) -> Self {
        ExploreError::NotFound(Missing::Pin(id))
    }
}

impl From<NetId> for ExploreError {
    fn from(id: NetId) -> Self {
        ExploreError::NotFound(Missing::Net(id))
    }
}

/// Logs `msg` at error level and wraps it as an `InvariantViolation`.
pub(crate) fn invariant_violation(context: &str, msg: String) -> ExploreError {
    log::error!("[{}] {}", context, msg);
    ExploreError::InvariantViolation(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_missing_id() {
        let err = ExploreError::from(PinId(9));
        assert_eq!(err.to_string(), "pin#9 was not found in the design");
        assert!(matches!(err, ExploreError::NotFound(Missing::Pin(PinId(9)))));
    }
}
