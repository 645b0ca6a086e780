// SPDX-License-Identifier: Apache-2.0

//! `DesignBuilder` assembles a [`DesignBundle`] one cell, port and net at a
//! time, minting dense ids as it goes. It is what a netlist reader (or a test)
//! uses to hand a design to the graph.
//!
//! ```
//! use netscope::netlist::builder::DesignBuilder;
//! use netscope::netlist::design::{PinDirection, PortDirection};
//!
//! let mut b = DesignBuilder::new();
//! let a = b.add_port("a", PortDirection::Input);
//! let u1 = b.add_cell("u1", "INVX1", &[("A", PinDirection::Input), ("Y", PinDirection::Output)]);
//! let a_pin = b.port_pin(a);
//! let u1_a = b.pin(u1, "A").unwrap();
//! b.add_net("a", &[a_pin, u1_a]);
//! let bundle = b.build();
//! assert_eq!(bundle.nodes.len(), 2);
//! ```

use crate::ids::{NetId, NodeId, PinId};
use crate::netlist::design::{
    DesignBundle, Net, NetClass, Node, NodeKind, Pin, PinDirection, PortDirection,
};

#[derive(Debug, Default)]
pub struct DesignBuilder {
    bundle: DesignBundle,
}

impl DesignBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell instance with the given `(pin name, direction)` list.
    pub fn add_cell(
        &mut self,
        instance_name: &str,
        cell_type: &str,
        pins: &[(&str, PinDirection)],
    ) -> NodeId {
        let node = NodeId::from_index(self.bundle.nodes.len());
        let pin_ids = pins
            .iter()
            .map(|(name, dir)| self.push_pin(node, name, *dir))
            .collect();
        self.bundle.nodes.push(Node {
            id: node,
            kind: NodeKind::Cell {
                instance_name: instance_name.to_string(),
                cell_type: cell_type.to_string(),
                is_sequential: false,
            },
            pins: pin_ids,
        });
        node
    }

    /// Adds a top-level port. The port gets a single pin, named after the
    /// port, whose direction is the mirror of the port direction.
    pub fn add_port(&mut self, name: &str, direction: PortDirection) -> NodeId {
        let node = NodeId::from_index(self.bundle.nodes.len());
        let pin = self.push_pin(node, name, direction.inner_pin_direction());
        self.bundle.nodes.push(Node {
            id: node,
            kind: NodeKind::Port {
                name: name.to_string(),
                direction,
            },
            pins: vec![pin],
        });
        node
    }

    /// Adds a signal net connecting `pins`.
    pub fn add_net(&mut self, name: &str, pins: &[PinId]) -> NetId {
        self.add_net_with_class(name, pins, NetClass::Signal)
    }

    pub fn add_net_with_class(&mut self, name: &str, pins: &[PinId], class: NetClass) -> NetId {
        let id = NetId::from_index(self.bundle.nets.len());
        self.bundle.nets.push(Net {
            id,
            name: name.to_string(),
            pins: pins.to_vec(),
            class,
        });
        id
    }

    /// Marks a previously added cell as a latch/flip-flop.
    pub fn set_sequential(&mut self, node: NodeId, sequential: bool) {
        if let Some(Node {
            kind: NodeKind::Cell { is_sequential, .. },
            ..
        }) = self.bundle.nodes.get_mut(node.index())
        {
            *is_sequential = sequential;
        }
    }

    /// Looks up a pin on `node` by name.
    pub fn pin(&self, node: NodeId, name: &str) -> Option<PinId> {
        self.bundle
            .nodes
            .get(node.index())?
            .pins
            .iter()
            .copied()
            .find(|p| self.bundle.pins[p.index()].name == name)
    }

    /// The single pin of a port node.
    ///
    /// Panics if `node` was not returned by [`DesignBuilder::add_port`].
    pub fn port_pin(&self, node: NodeId) -> PinId {
        let n = &self.bundle.nodes[node.index()];
        assert!(n.is_port(), "{} is not a port", node);
        n.pins[0]
    }

    pub fn build(self) -> DesignBundle {
        self.bundle
    }

    fn push_pin(&mut self, node: NodeId, name: &str, direction: PinDirection) -> PinId {
        let id = PinId::from_index(self.bundle.pins.len());
        let index = self
            .bundle
            .pins
            .iter()
            .rev()
            .take_while(|p| p.node == node)
            .count() as u32;
        self.bundle.pins.push(Pin {
            id,
            node,
            name: name.to_string(),
            direction,
            index,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids_are_dense_and_pins_are_indexed_per_node() {
        let mut b = DesignBuilder::new();
        let u1 = b.add_cell(
            "u1",
            "NAND2X1",
            &[
                ("A", PinDirection::Input),
                ("B", PinDirection::Input),
                ("Y", PinDirection::Output),
            ],
        );
        let y = b.add_port("y", PortDirection::Output);
        let bundle = b.build();

        assert_eq!(u1, NodeId(0));
        assert_eq!(y, NodeId(1));
        let indices: Vec<u32> = bundle.pins.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 0]);
        assert_eq!(bundle.pins[3].direction, PinDirection::Input);
        assert_eq!(bundle.nodes[1].pins, vec![PinId(3)]);
    }

    #[test]
    fn set_sequential_only_touches_cells() {
        let mut b = DesignBuilder::new();
        let ff = b.add_cell("r0", "DFFX1", &[("D", PinDirection::Input)]);
        let p = b.add_port("clk", PortDirection::Input);
        b.set_sequential(ff, true);
        b.set_sequential(p, true);
        let bundle = b.build();
        assert!(bundle.nodes[0].is_sequential());
        assert!(!bundle.nodes[1].is_sequential());
    }
}
