// SPDX-License-Identifier: Apache-2.0

//! Records describing a flattened gate-level design.
//!
//! A parser (outside this crate) produces a [`DesignBundle`]; the
//! [`ConnectivityGraph`](super::connectivity::ConnectivityGraph) takes
//! ownership of it and derives adjacency. Records refer to one another only
//! through dense ids, so `bundle.nodes[i].id == NodeId(i)` and likewise for
//! pins and nets.

use crate::ids::{NetId, NodeId, PinId};
use serde::{Deserialize, Serialize};

/// Direction of a pin as seen from the cell that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PinDirection {
    Input,
    Output,
    /// Also used when the direction is unknown, since it is the most
    /// permissive choice for traversal.
    #[default]
    Inout,
}

impl PinDirection {
    /// Parses a direction keyword; anything unrecognized becomes `Inout`.
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" | "in" | "i" => PinDirection::Input,
            "output" | "out" | "o" => PinDirection::Output,
            _ => PinDirection::Inout,
        }
    }

    /// True if a pin with this direction can drive the net it sits on.
    pub fn can_drive(self) -> bool {
        matches!(self, PinDirection::Output | PinDirection::Inout)
    }

    /// True if a pin with this direction can be driven by the net it sits on.
    pub fn can_load(self) -> bool {
        matches!(self, PinDirection::Input | PinDirection::Inout)
    }
}

/// Direction of a top-level design port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

impl PortDirection {
    /// The direction of the pin that represents this port inside the design.
    ///
    /// An input port drives the nets it touches, so its pin is an output, and
    /// vice versa.
    pub fn inner_pin_direction(self) -> PinDirection {
        match self {
            PortDirection::Input => PinDirection::Output,
            PortDirection::Output => PinDirection::Input,
            PortDirection::Inout => PinDirection::Inout,
        }
    }
}

/// Electrical classification of a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetClass {
    #[default]
    Signal,
    Power,
    Ground,
}

impl NetClass {
    /// Power and ground nets; these are skipped by default traversal.
    pub fn is_supply(self) -> bool {
        !matches!(self, NetClass::Signal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Cell {
        instance_name: String,
        cell_type: String,
        /// Latch or flip-flop; used as a traversal boundary.
        is_sequential: bool,
    },
    Port {
        name: String,
        direction: PortDirection,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Pins in declaration order. Ports carry exactly one pin.
    pub pins: Vec<PinId>,
}

impl Node {
    /// Instance name for cells, port name for ports.
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Cell { instance_name, .. } => instance_name,
            NodeKind::Port { name, .. } => name,
        }
    }

    pub fn cell_type(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Cell { cell_type, .. } => Some(cell_type),
            NodeKind::Port { .. } => None,
        }
    }

    pub fn is_sequential(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Cell {
                is_sequential: true,
                ..
            }
        )
    }

    pub fn is_port(&self) -> bool {
        matches!(self.kind, NodeKind::Port { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    /// Node that owns this pin.
    pub node: NodeId,
    pub name: String,
    pub direction: PinDirection,
    /// Position of this pin within `Node::pins` of its owner.
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    pub id: NetId,
    pub name: String,
    pub pins: Vec<PinId>,
    pub class: NetClass,
}

/// Everything the graph needs to know about a design, as produced by a
/// parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignBundle {
    pub nodes: Vec<Node>,
    pub pins: Vec<Pin>,
    pub nets: Vec<Net>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("input", PinDirection::Input; "input keyword")]
    #[test_case("OUTPUT", PinDirection::Output; "upper case output")]
    #[test_case(" inout ", PinDirection::Inout; "padded inout")]
    #[test_case("internal", PinDirection::Inout; "unknown defaults to inout")]
    #[test_case("", PinDirection::Inout; "empty defaults to inout")]
    fn pin_direction_from_keyword(s: &str, want: PinDirection) {
        assert_eq!(PinDirection::from_keyword(s), want);
    }

    #[test]
    fn inout_pins_both_drive_and_load() {
        assert!(PinDirection::Inout.can_drive());
        assert!(PinDirection::Inout.can_load());
        assert!(!PinDirection::Input.can_drive());
        assert!(!PinDirection::Output.can_load());
    }

    #[test]
    fn port_pin_direction_is_mirrored() {
        assert_eq!(
            PortDirection::Input.inner_pin_direction(),
            PinDirection::Output
        );
        assert_eq!(
            PortDirection::Output.inner_pin_direction(),
            PinDirection::Input
        );
    }
}
