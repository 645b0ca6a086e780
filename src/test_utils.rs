// SPDX-License-Identifier: Apache-2.0

//! Small design constructors shared by unit tests, integration tests and the
//! sample binary.

use crate::ids::{NodeId, PinId};
use crate::netlist::builder::DesignBuilder;
use crate::netlist::connectivity::ConnectivityGraph;
use crate::netlist::design::PinDirection;

/// Builds a design where every name becomes a `BUF`-like cell and every
/// `(driver, load)` pair of indices into `names` becomes a connection.
///
/// Each cell gets one input pin per incoming edge (`I0`, `I1`, ... in edge
/// order) followed by a single output pin `Y`. All loads of a cell hang off
/// one net named `n_<driver>`. Self-loops and repeated pairs are allowed.
pub fn design_from_edges(names: &[&str], edges: &[(usize, usize)]) -> (DesignBuilder, Vec<NodeId>) {
    let mut in_degree = vec![0usize; names.len()];
    for (_, load) in edges {
        in_degree[*load] += 1;
    }

    let mut b = DesignBuilder::new();
    let mut ids = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        let input_names: Vec<String> = (0..in_degree[i]).map(|k| format!("I{}", k)).collect();
        let mut pins: Vec<(&str, PinDirection)> = input_names
            .iter()
            .map(|n| (n.as_str(), PinDirection::Input))
            .collect();
        pins.push(("Y", PinDirection::Output));
        ids.push(b.add_cell(name, "BUF", &pins));
    }

    let mut next_input = vec![0usize; names.len()];
    let mut net_pins: Vec<Vec<PinId>> = ids
        .iter()
        .map(|id| vec![b.pin(*id, "Y").expect("output pin")])
        .collect();
    for (driver, load) in edges {
        let pin_name = format!("I{}", next_input[*load]);
        next_input[*load] += 1;
        let pin = b.pin(ids[*load], &pin_name).expect("input pin");
        net_pins[*driver].push(pin);
    }
    for (i, pins) in net_pins.iter().enumerate() {
        if pins.len() > 1 {
            b.add_net(&format!("n_{}", names[i]), pins);
        }
    }
    (b, ids)
}

/// [`design_from_edges`], built straight into a graph.
pub fn graph_from_edges(names: &[&str], edges: &[(usize, usize)]) -> (ConnectivityGraph, Vec<NodeId>) {
    let (b, ids) = design_from_edges(names, edges);
    let graph = ConnectivityGraph::build(b.build()).expect("edge-list design should be well formed");
    (graph, ids)
}

/// The `Y` pin of a cell built by [`design_from_edges`].
pub fn output_pin(graph: &ConnectivityGraph, node: NodeId) -> PinId {
    let n = graph.node(node).expect("node exists");
    *n.pins
        .iter()
        .find(|p| graph.pin(**p).map(|p| p.name == "Y").unwrap_or(false))
        .expect("cell has a Y pin")
}
