// SPDX-License-Identifier: Apache-2.0

//! Several exploration sessions over one shared graph, one per thread.

use lazy_static::lazy_static;
use netscope::netlist::cone::{Direction, Scope};
use netscope::{assign_layers, ConnectivityGraph, ExpansionState, LayerAssignment, NodeId};
use rayon::prelude::*;

lazy_static! {
    // Built once; threads only ever read it.
    static ref SAMPLE_GRAPH: ConnectivityGraph =
        crate::accumulator_graph().expect("sample design is well formed");
}

/// Grows a session around `node` in both directions and lays it out.
fn session_layers(node: NodeId) -> netscope::Result<LayerAssignment> {
    let graph: &'static ConnectivityGraph = &SAMPLE_GRAPH;
    let mut state = ExpansionState::new(graph);
    state.seed(node)?;
    for pin in &graph.node(node)?.pins {
        state.expand(*pin, Direction::Both, Scope::HopCount(2))?;
    }
    assign_layers(&state.visible_view()?)
}

pub fn layer_snapshots_in_parallel() -> anyhow::Result<()> {
    let nodes: Vec<NodeId> = SAMPLE_GRAPH
        .nodes()
        .iter()
        .map(|n| n.id)
        .cycle()
        .take(num_cpus::get().max(SAMPLE_GRAPH.node_count()))
        .collect();

    let parallel: Vec<LayerAssignment> = nodes
        .par_iter()
        .map(|n| session_layers(*n))
        .collect::<netscope::Result<_>>()?;

    for (node, got) in nodes.iter().zip(&parallel) {
        let want = session_layers(*node)?;
        anyhow::ensure!(
            *got == want,
            "layering around {} differs between threads",
            node
        );
        log::info!("{}: {} layer(s)", node, got.layer_count());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_snapshots_in_parallel() {
        let _ = env_logger::try_init();
        layer_snapshots_in_parallel().expect("parallel sessions should agree");
    }
}
