// SPDX-License-Identifier: Apache-2.0

//! Left-to-right layer assignment for a subgraph of the design.
//!
//! [`assign_layers`] ranks every node of a [`GraphView`] so that drivers sit
//! to the left of their loads:
//!
//! 1. Feedback edges are found with an iterative depth-first search
//!    ([`crate::topo::feedback_edges`]) and reported in
//!    [`LayerAssignment::reversed_edges`].
//! 2. Those edges are reversed in a working copy (self-loops dropped), which
//!    is then acyclic.
//! 3. Nodes are ranked by longest path from a source of the working graph, in
//!    Kahn order. Longest rather than shortest path keeps every node to the
//!    right of all its predecessors, including ones reached via detours.
//!
//! Disconnected components rank independently and isolated nodes land on
//! layer 0. The computation is pure and linear in nodes plus edges.

use crate::error::{invariant_violation, Result};
use crate::ids::NodeId;
use crate::netlist::connectivity::ConnectivityGraph;
use crate::topo;
use std::collections::{HashMap, HashSet};

/// A node set plus the driver-to-load edges among them.
///
/// Parallel edges are kept; they do not change the ranking but downstream
/// crossing counts care about them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphView {
    nodes: Vec<NodeId>,
    edges: Vec<(NodeId, NodeId)>,
}

impl GraphView {
    /// Builds a view from explicit edges, keeping only those whose endpoints
    /// are both in `nodes`. Duplicate nodes are ignored.
    pub fn from_edges(nodes: &[NodeId], edges: &[(NodeId, NodeId)]) -> Self {
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(nodes.len());
        let nodes: Vec<NodeId> = nodes.iter().copied().filter(|n| seen.insert(*n)).collect();
        let edges = edges
            .iter()
            .copied()
            .filter(|(a, b)| seen.contains(a) && seen.contains(b))
            .collect();
        GraphView { nodes, edges }
    }

    /// The subgraph of `graph` induced by `nodes`, over signal nets only.
    /// Nodes are ordered by id so results do not depend on hash order.
    pub fn induced<I>(graph: &ConnectivityGraph, nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let members: HashSet<NodeId> = nodes.into_iter().collect();
        let mut ordered: Vec<NodeId> = members.iter().copied().collect();
        ordered.sort_unstable();

        let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
        for node in &ordered {
            for link in graph.fanout_links(*node)? {
                if !members.contains(&link.node) {
                    continue;
                }
                if graph.net(link.net)?.class.is_supply() {
                    continue;
                }
                edges.push((*node, link.node));
            }
        }
        Ok(GraphView {
            nodes: ordered,
            edges,
        })
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Layer per node, plus the edges that were reversed to break cycles.
///
/// Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerAssignment {
    layer_of: HashMap<NodeId, u32>,
    reversed_edges: HashSet<(NodeId, NodeId)>,
    layer_count: usize,
}

impl LayerAssignment {
    pub fn layer(&self, node: NodeId) -> Option<u32> {
        self.layer_of.get(&node).copied()
    }

    pub fn layer_of(&self) -> &HashMap<NodeId, u32> {
        &self.layer_of
    }

    /// Feedback edges in their original (driver, load) orientation.
    pub fn reversed_edges(&self) -> &HashSet<(NodeId, NodeId)> {
        &self.reversed_edges
    }

    pub fn is_reversed(&self, from: NodeId, to: NodeId) -> bool {
        self.reversed_edges.contains(&(from, to))
    }

    /// `max(layer) + 1`, or 0 for an empty assignment.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn len(&self) -> usize {
        self.layer_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layer_of.is_empty()
    }

    /// Nodes grouped by layer, each group sorted by id.
    pub fn layers(&self) -> Vec<Vec<NodeId>> {
        let mut out: Vec<Vec<NodeId>> = vec![Vec::new(); self.layer_count];
        for (node, layer) in &self.layer_of {
            out[*layer as usize].push(*node);
        }
        for group in &mut out {
            group.sort_unstable();
        }
        out
    }
}

/// Computes a [`LayerAssignment`] for `view`.
///
/// Fails only with `InvariantViolation`, if cycle breaking did not leave an
/// acyclic graph.
pub fn assign_layers(view: &GraphView) -> Result<LayerAssignment> {
    if view.nodes.is_empty() {
        return Ok(LayerAssignment::default());
    }

    let local: HashMap<NodeId, usize> = view
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (*n, i))
        .collect();
    let mut succs: Vec<Vec<usize>> = vec![Vec::new(); view.nodes.len()];
    for (a, b) in &view.edges {
        succs[local[a]].push(local[b]);
    }

    let feedback = topo::feedback_edges(&succs);

    let mut working: Vec<Vec<usize>> = vec![Vec::new(); view.nodes.len()];
    for (a, b) in &view.edges {
        let (a, b) = (local[a], local[b]);
        if a == b {
            continue;
        }
        if feedback.contains(&(a, b)) {
            working[b].push(a);
        } else {
            working[a].push(b);
        }
    }

    let (order, cycle) = topo::topo_order_and_cycle_check(&working);
    if let Some(stuck) = cycle {
        let stuck: Vec<NodeId> = stuck.iter().map(|i| view.nodes[*i]).collect();
        return Err(invariant_violation(
            "assign_layers",
            format!(
                "graph still cyclic after reversing {} feedback edge(s); unordered nodes: {:?}",
                feedback.len(),
                stuck
            ),
        ));
    }

    let mut layer = vec![0u32; view.nodes.len()];
    for u in order {
        for &v in &working[u] {
            layer[v] = layer[v].max(layer[u] + 1);
        }
    }

    let layer_count = layer.iter().max().map_or(0, |m| *m as usize + 1);
    let layer_of = view.nodes.iter().copied().zip(layer).collect();
    let reversed_edges = feedback
        .into_iter()
        .map(|(a, b)| (view.nodes[a], view.nodes[b]))
        .collect();
    log::debug!(
        "assigned {} node(s) to {} layer(s)",
        view.nodes.len(),
        layer_count
    );
    Ok(LayerAssignment {
        layer_of,
        reversed_edges,
        layer_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::graph_from_edges;
    use maplit::{hashmap, hashset};
    use pretty_assertions::assert_eq;

    fn ids(n: u32) -> Vec<NodeId> {
        (0..n).map(NodeId).collect()
    }

    fn view(n: u32, edges: &[(u32, u32)]) -> GraphView {
        let edges: Vec<(NodeId, NodeId)> =
            edges.iter().map(|(a, b)| (NodeId(*a), NodeId(*b))).collect();
        GraphView::from_edges(&ids(n), &edges)
    }

    #[test]
    fn empty_view_has_no_layers() {
        let got = assign_layers(&GraphView::default()).unwrap();
        assert_eq!(got.layer_count(), 0);
        assert!(got.is_empty());
        assert!(got.reversed_edges().is_empty());
    }

    #[test]
    fn longest_path_governs_over_shortcut() {
        // IN -> A -> B -> C -> OUT, plus A -> OUT
        let got = assign_layers(&view(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (1, 4)])).unwrap();
        let want = hashmap! {
            NodeId(0) => 0, NodeId(1) => 1, NodeId(2) => 2, NodeId(3) => 3, NodeId(4) => 4,
        };
        assert_eq!(got.layer_of(), &want);
        assert_eq!(got.layer_count(), 5);
    }

    #[test]
    fn single_cycle_reverses_exactly_one_edge() {
        let got = assign_layers(&view(3, &[(0, 1), (1, 2), (2, 0)])).unwrap();
        assert_eq!(got.reversed_edges().len(), 1);
        assert_eq!(got.len(), 3);
        assert_eq!(got.reversed_edges(), &hashset! {(NodeId(2), NodeId(0))});
        assert_eq!(got.layers(), vec![vec![NodeId(0)], vec![NodeId(1)], vec![NodeId(2)]]);
    }

    #[test]
    fn self_loop_is_reported_and_ignored_for_ranking() {
        let got = assign_layers(&view(2, &[(0, 0), (0, 1)])).unwrap();
        assert!(got.is_reversed(NodeId(0), NodeId(0)));
        assert_eq!(got.layer(NodeId(0)), Some(0));
        assert_eq!(got.layer(NodeId(1)), Some(1));
    }

    #[test]
    fn components_and_isolated_nodes_start_at_zero() {
        // 0->1->2->3 and 4->5, 6 isolated
        let got = assign_layers(&view(7, &[(0, 1), (1, 2), (2, 3), (4, 5)])).unwrap();
        assert_eq!(got.layer(NodeId(4)), Some(0));
        assert_eq!(got.layer(NodeId(5)), Some(1));
        assert_eq!(got.layer(NodeId(6)), Some(0));
        assert_eq!(got.layer_count(), 4);
    }

    #[test]
    fn non_reversed_edges_point_right() {
        // Two interlocked loops with a tail.
        let edges = [(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2), (4, 5), (1, 5)];
        let v = view(6, &edges);
        let got = assign_layers(&v).unwrap();
        for (a, b) in v.edges() {
            if got.is_reversed(*a, *b) {
                continue;
            }
            assert!(
                got.layer(*a).unwrap() < got.layer(*b).unwrap(),
                "edge {} -> {} not left-to-right",
                a,
                b
            );
        }
    }

    #[test]
    fn from_edges_drops_edges_leaving_the_node_set() {
        let v = GraphView::from_edges(
            &[NodeId(0), NodeId(1), NodeId(1)],
            &[(NodeId(0), NodeId(1)), (NodeId(1), NodeId(9))],
        );
        assert_eq!(v.nodes(), &[NodeId(0), NodeId(1)]);
        assert_eq!(v.edges(), &[(NodeId(0), NodeId(1))]);
    }

    #[test]
    fn induced_view_keeps_parallel_edges_inside_the_set() {
        // A->B twice, B->C; view over {A, B}
        let (g, n) = graph_from_edges(&["A", "B", "C"], &[(0, 1), (0, 1), (1, 2)]);
        let v = GraphView::induced(&g, vec![n[1], n[0]]).unwrap();
        assert_eq!(v.nodes(), &[n[0], n[1]]);
        assert_eq!(v.edges(), &[(n[0], n[1]), (n[0], n[1])]);
    }
}
