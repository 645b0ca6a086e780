// SPDX-License-Identifier: Apache-2.0

//! Cone traversal over a [`ConnectivityGraph`].
//!
//! A [`ConeTraverser`] answers the questions an exploration session asks when
//! the user grows the view from a pin:
//!
//! - which nodes lie within `n` hops upstream or downstream
//!   ([`ConeTraverser::fanin`], [`ConeTraverser::fanout`]);
//! - which nodes lie between the pin and the nearest semantic boundary, such
//!   as a flop or a top-level port ([`ConeTraverser::cone_to_boundary`]);
//! - what is the shortest driver-to-load path between two pins
//!   ([`ConeTraverser::shortest_path`]).
//!
//! The traverser holds nothing but a borrow of the graph. Results are node
//! sets; ordering carries no meaning. Power and ground nets are skipped unless
//! the traverser is built with [`ConeTraverser::with_supply_nets`].
//!
//! The first hop leaves through the nets on the start pin when that pin can
//! carry signal in the traversal direction (an output or inout pin for fanout,
//! an input or inout pin for fanin). For a pin facing the other way, the first
//! hop uses every compatible pin of the owning node instead. All later hops
//! are node to node.

use crate::error::Result;
use crate::ids::{NodeId, PinId};
use crate::netlist::connectivity::{ConnectivityGraph, Link};
use crate::netlist::design::Node;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Direction to traverse from the starting pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Fanin,
    Fanout,
    Both,
}

impl Direction {
    /// The single directions this direction is made of.
    pub fn components(self) -> &'static [Direction] {
        match self {
            Direction::Fanin => &[Direction::Fanin],
            Direction::Fanout => &[Direction::Fanout],
            Direction::Both => &[Direction::Fanin, Direction::Fanout],
        }
    }

    /// Combines two directions; anything mixed becomes `Both`.
    pub fn union(self, other: Direction) -> Direction {
        if self == other {
            self
        } else {
            Direction::Both
        }
    }
}

/// Named semantic boundaries for [`ConeTraverser::cone_to_boundary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Stop at latches and flip-flops.
    Sequential,
    /// Stop at top-level ports.
    Port,
    /// Stop at either.
    SequentialOrPort,
}

impl BoundaryPolicy {
    pub fn is_boundary(self, node: &Node) -> bool {
        match self {
            BoundaryPolicy::Sequential => node.is_sequential(),
            BoundaryPolicy::Port => node.is_port(),
            BoundaryPolicy::SequentialOrPort => node.is_sequential() || node.is_port(),
        }
    }

    /// This policy as a predicate over node ids in `graph`.
    pub fn predicate(self, graph: &ConnectivityGraph) -> impl Fn(NodeId) -> bool + '_ {
        move |id| graph.node(id).map(|n| self.is_boundary(n)).unwrap_or(false)
    }
}

/// How far a cone extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Stop after this many hops. Zero yields nothing.
    HopCount(u32),
    /// Stop at (but include) nodes matching the policy.
    Boundary(BoundaryPolicy),
}

pub struct ConeTraverser<'g> {
    graph: &'g ConnectivityGraph,
    include_supply_nets: bool,
}

impl<'g> ConeTraverser<'g> {
    pub fn new(graph: &'g ConnectivityGraph) -> Self {
        ConeTraverser {
            graph,
            include_supply_nets: false,
        }
    }

    /// Also walk through power and ground nets.
    pub fn with_supply_nets(mut self, include: bool) -> Self {
        self.include_supply_nets = include;
        self
    }

    pub fn graph(&self) -> &'g ConnectivityGraph {
        self.graph
    }

    /// Nodes within `hops` levels downstream of `start`, excluding the node
    /// that owns `start`.
    pub fn fanout(&self, start: PinId, hops: u32) -> Result<HashSet<NodeId>> {
        self.bfs(start, Direction::Fanout, Some(hops), |_| false)
    }

    /// Nodes within `hops` levels upstream of `start`, excluding the node
    /// that owns `start`.
    pub fn fanin(&self, start: PinId, hops: u32) -> Result<HashSet<NodeId>> {
        self.bfs(start, Direction::Fanin, Some(hops), |_| false)
    }

    /// Nodes reachable from `start` in `direction`, where any node matching
    /// `boundary` is included but not expanded further.
    ///
    /// Terminates on cyclic graphs: every node is enqueued at most once.
    pub fn cone_to_boundary<F>(
        &self,
        start: PinId,
        direction: Direction,
        boundary: F,
    ) -> Result<HashSet<NodeId>>
    where
        F: Fn(NodeId) -> bool,
    {
        let mut out: HashSet<NodeId> = HashSet::new();
        for dir in direction.components() {
            out.extend(self.bfs(start, *dir, None, &boundary)?);
        }
        Ok(out)
    }

    /// Dispatches on `scope`; `Direction::Both` unions the fanin and fanout
    /// cones.
    pub fn cone(&self, start: PinId, direction: Direction, scope: Scope) -> Result<HashSet<NodeId>> {
        let mut out: HashSet<NodeId> = HashSet::new();
        for dir in direction.components() {
            let part = match scope {
                Scope::HopCount(hops) => self.bfs(start, *dir, Some(hops), |_| false)?,
                Scope::Boundary(policy) => {
                    self.bfs(start, *dir, None, policy.predicate(self.graph))?
                }
            };
            out.extend(part);
        }
        log::debug!(
            "cone from {} ({:?}, {:?}) reached {} node(s)",
            start,
            direction,
            scope,
            out.len()
        );
        Ok(out)
    }

    /// Shortest driver-to-load path from the node owning `source` to the node
    /// owning `target`, both ends included. `None` when `target` is not
    /// reachable downstream of `source`.
    pub fn shortest_path(&self, source: PinId, target: PinId) -> Result<Option<Vec<NodeId>>> {
        let (origin, seeds) = self.seed_links(source, Direction::Fanout)?;
        let goal = self.graph.pin_owner(target)?;
        if origin == goal {
            return Ok(Some(vec![origin]));
        }

        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        parent.insert(origin, origin);
        for link in seeds {
            if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(link.node) {
                e.insert(origin);
                queue.push_back(link.node);
            }
        }

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = vec![goal];
                let mut cursor = goal;
                while cursor != origin {
                    cursor = parent[&cursor];
                    path.push(cursor);
                }
                path.reverse();
                return Ok(Some(path));
            }
            for link in self.links(current, Direction::Fanout)? {
                if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(link.node) {
                    e.insert(current);
                    queue.push_back(link.node);
                }
            }
        }
        Ok(None)
    }

    /// Breadth-first walk in a single direction. `max_hops` of `None` means
    /// unbounded; `boundary` nodes are recorded but never expanded.
    fn bfs<F>(
        &self,
        start: PinId,
        direction: Direction,
        max_hops: Option<u32>,
        boundary: F,
    ) -> Result<HashSet<NodeId>>
    where
        F: Fn(NodeId) -> bool,
    {
        debug_assert!(direction != Direction::Both);
        let (origin, seeds) = self.seed_links(start, direction)?;
        let mut reached: HashSet<NodeId> = HashSet::new();
        if max_hops == Some(0) {
            return Ok(reached);
        }
        let expands_at = |level: u32| max_hops.map_or(true, |max| level < max);

        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(origin);
        let mut queue: VecDeque<(NodeId, u32)> = VecDeque::new();

        let mut visit = |node: NodeId, level: u32, queue: &mut VecDeque<(NodeId, u32)>| {
            if !visited.insert(node) {
                return;
            }
            reached.insert(node);
            if expands_at(level) && !boundary(node) {
                queue.push_back((node, level));
            }
        };

        for link in seeds {
            visit(link.node, 1, &mut queue);
        }
        while let Some((node, level)) = queue.pop_front() {
            for link in self.links(node, direction)? {
                visit(link.node, level + 1, &mut queue);
            }
        }
        Ok(reached)
    }

    /// Resolves `start` to its owning node and the links the first hop may
    /// take.
    fn seed_links(&self, start: PinId, direction: Direction) -> Result<(NodeId, Vec<Link>)> {
        let pin = self.graph.pin(start)?;
        let faces_direction = match direction {
            Direction::Fanout => pin.direction.can_drive(),
            Direction::Fanin => pin.direction.can_load(),
            Direction::Both => true,
        };
        let seeds = self
            .links(pin.node, direction)?
            .filter(|link| !faces_direction || link.local_pin == start)
            .collect();
        Ok((pin.node, seeds))
    }

    fn links(
        &self,
        node: NodeId,
        direction: Direction,
    ) -> Result<impl Iterator<Item = Link> + '_> {
        let links = match direction {
            Direction::Fanin => self.graph.fanin_links(node)?,
            _ => self.graph.fanout_links(node)?,
        };
        let include_supply = self.include_supply_nets;
        let nets = self.graph.nets();
        Ok(links
            .iter()
            .copied()
            .filter(move |link| include_supply || !nets[link.net.index()].class.is_supply()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExploreError, Missing};
    use crate::test_utils::{graph_from_edges, output_pin};
    use maplit::hashset;
    use pretty_assertions::assert_eq;

    #[test]
    fn fanout_one_hop_stops_at_direct_loads() {
        // A->B, A->C, B->D
        let (g, ids) = graph_from_edges(&["A", "B", "C", "D"], &[(0, 1), (0, 2), (1, 3)]);
        let t = ConeTraverser::new(&g);
        let got = t.fanout(output_pin(&g, ids[0]), 1).unwrap();
        assert_eq!(got, hashset! {ids[1], ids[2]});
        let got = t.fanout(output_pin(&g, ids[0]), 2).unwrap();
        assert_eq!(got, hashset! {ids[1], ids[2], ids[3]});
    }

    #[test]
    fn zero_hops_is_empty_not_an_error() {
        let (g, ids) = graph_from_edges(&["A", "B"], &[(0, 1)]);
        let t = ConeTraverser::new(&g);
        assert_eq!(t.fanout(output_pin(&g, ids[0]), 0).unwrap(), hashset! {});
        // B drives nothing.
        assert_eq!(t.fanout(output_pin(&g, ids[1]), 3).unwrap(), hashset! {});
    }

    #[test]
    fn fanin_walks_upstream() {
        // A->B->C
        let (g, ids) = graph_from_edges(&["A", "B", "C"], &[(0, 1), (1, 2)]);
        let t = ConeTraverser::new(&g);
        let c_in = g.node(ids[2]).unwrap().pins[0];
        assert_eq!(t.fanin(c_in, 1).unwrap(), hashset! {ids[1]});
        assert_eq!(t.fanin(c_in, 5).unwrap(), hashset! {ids[0], ids[1]});
    }

    #[test]
    fn unknown_pin_is_not_found() {
        let (g, _) = graph_from_edges(&["A"], &[]);
        let t = ConeTraverser::new(&g);
        assert_eq!(
            t.fanout(PinId(1000), 1).unwrap_err(),
            ExploreError::NotFound(Missing::Pin(PinId(1000)))
        );
    }

    #[test]
    fn cycle_without_boundary_terminates_and_visits_each_once() {
        // A->B->C->A, plus C->D
        let (g, ids) = graph_from_edges(&["A", "B", "C", "D"], &[(0, 1), (1, 2), (2, 0), (2, 3)]);
        let t = ConeTraverser::new(&g);
        let got = t
            .cone_to_boundary(output_pin(&g, ids[0]), Direction::Fanout, |_| false)
            .unwrap();
        assert_eq!(got, hashset! {ids[1], ids[2], ids[3]});
    }

    #[test]
    fn boundary_nodes_are_included_but_not_expanded() {
        // A->B->C, B is the boundary.
        let (g, ids) = graph_from_edges(&["A", "B", "C"], &[(0, 1), (1, 2)]);
        let t = ConeTraverser::new(&g);
        let b = ids[1];
        let got = t
            .cone_to_boundary(output_pin(&g, ids[0]), Direction::Fanout, |n| n == b)
            .unwrap();
        assert_eq!(got, hashset! {b});
    }

    #[test]
    fn shortest_path_prefers_fewest_hops() {
        // A->B->C->D and A->D
        let (g, ids) = graph_from_edges(&["A", "B", "C", "D"], &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        let t = ConeTraverser::new(&g);
        let d_in = g.node(ids[3]).unwrap().pins[0];
        let path = t.shortest_path(output_pin(&g, ids[0]), d_in).unwrap();
        assert_eq!(path, Some(vec![ids[0], ids[3]]));
        let b_out = output_pin(&g, ids[1]);
        let path = t.shortest_path(b_out, d_in).unwrap();
        assert_eq!(path, Some(vec![ids[1], ids[2], ids[3]]));
    }

    #[test]
    fn shortest_path_is_none_against_the_flow() {
        let (g, ids) = graph_from_edges(&["A", "B"], &[(0, 1)]);
        let t = ConeTraverser::new(&g);
        let a_out = output_pin(&g, ids[0]);
        let b_out = output_pin(&g, ids[1]);
        assert_eq!(t.shortest_path(b_out, a_out).unwrap(), None);
        assert_eq!(t.shortest_path(a_out, a_out).unwrap(), Some(vec![ids[0]]));
    }

    #[test]
    fn both_directions_union_fanin_and_fanout() {
        // A->B->C
        let (g, ids) = graph_from_edges(&["A", "B", "C"], &[(0, 1), (1, 2)]);
        let t = ConeTraverser::new(&g);
        let b_out = output_pin(&g, ids[1]);
        let got = t.cone(b_out, Direction::Both, Scope::HopCount(1)).unwrap();
        assert_eq!(got, hashset! {ids[0], ids[2]});
    }

    #[test]
    fn direction_union() {
        assert_eq!(Direction::Fanin.union(Direction::Fanin), Direction::Fanin);
        assert_eq!(Direction::Fanin.union(Direction::Fanout), Direction::Both);
        assert_eq!(Direction::Both.union(Direction::Fanout), Direction::Both);
    }
}
