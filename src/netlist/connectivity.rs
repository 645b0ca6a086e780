// SPDX-License-Identifier: Apache-2.0

//! Connectivity graph for a flattened gate-level design.
//!
//! The graph owns the node, pin and net tables of a [`DesignBundle`] and
//! derives, once, the per-node adjacency used by traversal: for every net,
//! each driving pin gets a fanout link to every loading pin on that net, and
//! the loading node gets the mirrored fanin link. Parallel links between the
//! same two nodes are kept distinct; callers that want a node set deduplicate.
//!
//! Inout pins count as both drivers and loads, so a net of only Inout pins
//! links every pair; Output pins are never loads, so two Output pins sharing a
//! net are not linked to each other.
//!
//! After `build` nothing in here is mutable, so a graph can be shared freely
//! across threads for read-only queries.

use crate::error::{ExploreError, Result};
use crate::ids::{NetId, NodeId, PinId};
use crate::netlist::design::{DesignBundle, Net, Node, Pin};
use std::collections::HashMap;

/// One directed connection between two nodes through a net.
///
/// In a fanout list `local_pin` is the driver pin on the node that owns the
/// list and `remote_pin` is the load pin on `node`; in a fanin list the roles
/// are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    /// The node on the far side of the link.
    pub node: NodeId,
    pub net: NetId,
    pub local_pin: PinId,
    pub remote_pin: PinId,
}

#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    nodes: Vec<Node>,
    pins: Vec<Pin>,
    nets: Vec<Net>,
    /// For each `PinId`, the nets it sits on (normally exactly one).
    pin_nets: Vec<Vec<NetId>>,
    /// For each `NodeId`, links to the nodes it drives.
    fanout: Vec<Vec<Link>>,
    /// For each `NodeId`, links from the nodes that drive it.
    fanin: Vec<Vec<Link>>,
    name_index: HashMap<String, NodeId>,
    link_count: usize,
}

impl ConnectivityGraph {
    /// Validates `bundle` and derives adjacency in time linear in the number
    /// of pin connections.
    pub fn build(bundle: DesignBundle) -> Result<Self> {
        let start = std::time::Instant::now();
        let DesignBundle { nodes, pins, nets } = bundle;
        validate_tables(&nodes, &pins, &nets)?;

        let mut pin_nets: Vec<Vec<NetId>> = vec![Vec::new(); pins.len()];
        let mut fanout: Vec<Vec<Link>> = vec![Vec::new(); nodes.len()];
        let mut fanin: Vec<Vec<Link>> = vec![Vec::new(); nodes.len()];
        let mut link_count = 0usize;

        for net in &nets {
            for pin in &net.pins {
                pin_nets[pin.index()].push(net.id);
            }
            if net.pins.len() < 2 {
                log::warn!(
                    "net '{}' ({}) connects {} pin(s); it cannot link two nodes",
                    net.name,
                    net.id,
                    net.pins.len()
                );
            }

            let drivers: Vec<&Pin> = net
                .pins
                .iter()
                .map(|p| &pins[p.index()])
                .filter(|p| p.direction.can_drive())
                .collect();
            if drivers.is_empty() {
                log::debug!(
                    "net '{}' ({}) has no driving pin; it contributes no links",
                    net.name,
                    net.id
                );
                continue;
            }

            for driver in &drivers {
                for load_id in &net.pins {
                    let load = &pins[load_id.index()];
                    if load.id == driver.id || !load.direction.can_load() {
                        continue;
                    }
                    fanout[driver.node.index()].push(Link {
                        node: load.node,
                        net: net.id,
                        local_pin: driver.id,
                        remote_pin: load.id,
                    });
                    fanin[load.node.index()].push(Link {
                        node: driver.node,
                        net: net.id,
                        local_pin: load.id,
                        remote_pin: driver.id,
                    });
                    link_count += 1;
                }
            }
        }

        let mut name_index: HashMap<String, NodeId> = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            if let Some(prev) = name_index.get(node.name()) {
                log::warn!(
                    "name '{}' is shared by {} and {}; name lookup resolves to the former",
                    node.name(),
                    prev,
                    node.id
                );
                continue;
            }
            name_index.insert(node.name().to_string(), node.id);
        }

        log::debug!(
            "connectivity graph built in {:?}: {} nodes, {} pins, {} nets, {} links",
            start.elapsed(),
            nodes.len(),
            pins.len(),
            nets.len(),
            link_count
        );

        Ok(ConnectivityGraph {
            nodes,
            pins,
            nets,
            pin_nets,
            fanout,
            fanin,
            name_index,
            link_count,
        })
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or_else(|| id.into())
    }

    pub fn pin(&self, id: PinId) -> Result<&Pin> {
        self.pins.get(id.index()).ok_or_else(|| id.into())
    }

    pub fn net(&self, id: NetId) -> Result<&Net> {
        self.nets.get(id.index()).ok_or_else(|| id.into())
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn contains_pin(&self, id: PinId) -> bool {
        id.index() < self.pins.len()
    }

    pub fn contains_net(&self, id: NetId) -> bool {
        id.index() < self.nets.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Total number of fanout links, parallel links included.
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Nets attached to `pin`.
    pub fn pin_nets(&self, pin: PinId) -> Result<&[NetId]> {
        self.pin_nets
            .get(pin.index())
            .map(Vec::as_slice)
            .ok_or_else(|| pin.into())
    }

    /// Links to the nodes driven by `node`.
    pub fn fanout_links(&self, node: NodeId) -> Result<&[Link]> {
        self.fanout
            .get(node.index())
            .map(Vec::as_slice)
            .ok_or_else(|| node.into())
    }

    /// Links from the nodes driving `node`.
    pub fn fanin_links(&self, node: NodeId) -> Result<&[Link]> {
        self.fanin
            .get(node.index())
            .map(Vec::as_slice)
            .ok_or_else(|| node.into())
    }

    /// Resolves an instance or port name to its node.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied()
    }

    /// The node that owns `pin`.
    pub fn pin_owner(&self, pin: PinId) -> Result<NodeId> {
        Ok(self.pin(pin)?.node)
    }
}

fn validate_tables(nodes: &[Node], pins: &[Pin], nets: &[Net]) -> Result<()> {
    for (what, len) in [("nodes", nodes.len()), ("pins", pins.len()), ("nets", nets.len())] {
        if len > u32::MAX as usize {
            return Err(ExploreError::MalformedDesign(format!(
                "{} {} exceed the id space",
                len, what
            )));
        }
    }

    for (i, pin) in pins.iter().enumerate() {
        if pin.id.index() != i {
            return Err(ExploreError::MalformedDesign(format!(
                "pin record at position {} carries id {}",
                i, pin.id
            )));
        }
        if pin.node.index() >= nodes.len() {
            return Err(ExploreError::MalformedDesign(format!(
                "{} '{}' is owned by unknown {}",
                pin.id, pin.name, pin.node
            )));
        }
    }

    let mut listed: Vec<bool> = vec![false; pins.len()];
    for (i, node) in nodes.iter().enumerate() {
        if node.id.index() != i {
            return Err(ExploreError::MalformedDesign(format!(
                "node record at position {} carries id {}",
                i, node.id
            )));
        }
        for pin in &node.pins {
            let Some(record) = pins.get(pin.index()) else {
                return Err(ExploreError::MalformedDesign(format!(
                    "node '{}' ({}) lists unknown {}",
                    node.name(),
                    node.id,
                    pin
                )));
            };
            if record.node != node.id {
                return Err(ExploreError::MalformedDesign(format!(
                    "node '{}' ({}) lists {} which is owned by {}",
                    node.name(),
                    node.id,
                    pin,
                    record.node
                )));
            }
            if std::mem::replace(&mut listed[pin.index()], true) {
                return Err(ExploreError::MalformedDesign(format!(
                    "{} is listed more than once by node '{}'",
                    pin,
                    node.name()
                )));
            }
        }
    }
    if let Some(unlisted) = listed.iter().position(|l| !*l) {
        return Err(ExploreError::MalformedDesign(format!(
            "{} is not listed by its owner {}",
            pins[unlisted].id, pins[unlisted].node
        )));
    }

    for (i, net) in nets.iter().enumerate() {
        if net.id.index() != i {
            return Err(ExploreError::MalformedDesign(format!(
                "net record at position {} carries id {}",
                i, net.id
            )));
        }
        if let Some(bad) = net.pins.iter().find(|p| p.index() >= pins.len()) {
            return Err(ExploreError::MalformedDesign(format!(
                "net '{}' ({}) references unknown {}",
                net.name, net.id, bad
            )));
        }
    }
    Ok(())
}
