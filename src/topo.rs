// SPDX-License-Identifier: Apache-2.0

//! Ordering primitives over dense adjacency lists.
//!
//! Graphs here are `succs[i]`: the successors of local node `i`, with
//! parallel edges allowed. Nothing recurses on the native call stack; long
//! combinational chains in real netlists run to tens of thousands of nodes.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Finds the back edges of a depth-first forest over `succs`.
///
/// Roots are tried in index order. An edge whose destination is still in
/// progress closes a cycle and is returned; this includes self-loops.
/// Reversing every returned edge (and dropping self-loops) leaves an acyclic
/// graph.
pub fn feedback_edges(succs: &[Vec<usize>]) -> HashSet<(usize, usize)> {
    let mut color = vec![Color::Unvisited; succs.len()];
    let mut feedback: HashSet<(usize, usize)> = HashSet::new();
    // (node, index of the next successor to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..succs.len() {
        if color[root] != Color::Unvisited {
            continue;
        }
        color[root] = Color::InProgress;
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if top.1 == succs[node].len() {
                color[node] = Color::Done;
                stack.pop();
                continue;
            }
            let succ = succs[node][top.1];
            top.1 += 1;
            match color[succ] {
                Color::Unvisited => {
                    color[succ] = Color::InProgress;
                    stack.push((succ, 0));
                }
                Color::InProgress => {
                    feedback.insert((node, succ));
                }
                Color::Done => {}
            }
        }
    }
    feedback
}

/// Returns (topological order, None) if acyclic, or (partial order,
/// Some(nodes never ordered)) if a cycle is detected.
pub fn topo_order_and_cycle_check(succs: &[Vec<usize>]) -> (Vec<usize>, Option<Vec<usize>>) {
    let n = succs.len();
    let mut indegree = vec![0usize; n];
    for targets in succs {
        for &t in targets {
            indegree[t] += 1;
        }
    }
    let mut queue: VecDeque<usize> = (0..n).filter(|i| indegree[*i] == 0).collect();
    let mut order: Vec<usize> = Vec::with_capacity(n);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &t in &succs[node] {
            indegree[t] -= 1;
            if indegree[t] == 0 {
                queue.push_back(t);
            }
        }
    }
    if order.len() == n {
        (order, None)
    } else {
        let not_visited: Vec<usize> = (0..n).filter(|i| indegree[*i] > 0).collect();
        (order, Some(not_visited))
    }
}
