// SPDX-License-Identifier: Apache-2.0

//! Recorded expansion and collapse commands.

use crate::ids::{NetId, NodeId, PinId};
use crate::netlist::cone::{Direction, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::SystemTime;

/// Monotonic id assigned to every command a state issues, no-ops included.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommandId(pub u64);

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Expand,
    Collapse,
}

/// Where a command was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    Pin(PinId),
    Node(NodeId),
}

/// How much a collapse removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollapseScope {
    /// Only the selected node.
    ToSelected,
    /// The selected node and whatever was expanded from it that nothing else
    /// visible still reaches.
    Subtree,
}

/// The parameters a command ran with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandPolicy {
    Expand(Scope),
    /// A single node placed directly, without traversal.
    Seed,
    Collapse(CollapseScope),
}

/// Immutable record of one state change.
///
/// The affected sets hold exactly what the command changed, which is what
/// undo and redo replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionCommand {
    id: CommandId,
    kind: CommandKind,
    nodes_affected: BTreeSet<NodeId>,
    nets_affected: BTreeSet<NetId>,
    origin: Origin,
    direction: Direction,
    policy: CommandPolicy,
    timestamp: SystemTime,
}

/// Enough of a command to label an undo or redo action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandSummary {
    pub kind: CommandKind,
    pub origin: Origin,
}

impl ExpansionCommand {
    pub(crate) fn new(
        id: CommandId,
        kind: CommandKind,
        origin: Origin,
        direction: Direction,
        policy: CommandPolicy,
    ) -> Self {
        ExpansionCommand {
            id,
            kind,
            nodes_affected: BTreeSet::new(),
            nets_affected: BTreeSet::new(),
            origin,
            direction,
            policy,
            timestamp: SystemTime::now(),
        }
    }

    pub(crate) fn with_affected(
        mut self,
        nodes: BTreeSet<NodeId>,
        nets: BTreeSet<NetId>,
    ) -> Self {
        self.nodes_affected = nodes;
        self.nets_affected = nets;
        self
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Nodes shown by an expand or hidden by a collapse.
    pub fn nodes_affected(&self) -> &BTreeSet<NodeId> {
        &self.nodes_affected
    }

    /// Nets shown by an expand or hidden by a collapse.
    pub fn nets_affected(&self) -> &BTreeSet<NetId> {
        &self.nets_affected
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn policy(&self) -> CommandPolicy {
        self.policy
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// True when the command changed nothing. No-ops are never recorded.
    pub fn is_noop(&self) -> bool {
        self.nodes_affected.is_empty() && self.nets_affected.is_empty()
    }

    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            kind: self.kind,
            origin: self.origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::cone::BoundaryPolicy;
    use maplit::btreeset;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_with_affected_sets_in_order() {
        let cmd = ExpansionCommand::new(
            CommandId(3),
            CommandKind::Expand,
            Origin::Pin(PinId(12)),
            Direction::Fanout,
            CommandPolicy::Expand(Scope::Boundary(BoundaryPolicy::Sequential)),
        )
        .with_affected(btreeset! {NodeId(5), NodeId(2)}, btreeset! {NetId(1)});

        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["id"], serde_json::json!(3));
        assert_eq!(json["nodes_affected"], serde_json::json!([2, 5]));
        assert_eq!(json["origin"], serde_json::json!({"Pin": 12}));
        assert_eq!(
            json["policy"],
            serde_json::json!({"Expand": {"Boundary": "Sequential"}})
        );

        let back: ExpansionCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn empty_command_is_noop() {
        let cmd = ExpansionCommand::new(
            CommandId(0),
            CommandKind::Collapse,
            Origin::Node(NodeId(1)),
            Direction::Fanout,
            CommandPolicy::Collapse(CollapseScope::ToSelected),
        );
        assert!(cmd.is_noop());
        assert_eq!(
            cmd.summary(),
            CommandSummary {
                kind: CommandKind::Collapse,
                origin: Origin::Node(NodeId(1)),
            }
        );
    }
}
