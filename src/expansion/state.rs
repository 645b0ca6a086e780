// SPDX-License-Identifier: Apache-2.0

use crate::error::{invariant_violation, Result};
use crate::expansion::command::{
    CollapseScope, CommandId, CommandKind, CommandPolicy, CommandSummary, ExpansionCommand,
    Origin,
};
use crate::ids::{NetId, NodeId, PinId};
use crate::layers::GraphView;
use crate::netlist::cone::{ConeTraverser, Direction, Scope};
use crate::netlist::connectivity::ConnectivityGraph;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Provenance {
    command: CommandId,
    /// `None` for seeded nodes.
    direction: Option<Direction>,
}

/// The visible part of a design plus the history that produced it.
///
/// Single writer. Every mutating call either applies completely or, on
/// `NotFound`, leaves the state untouched.
#[derive(Debug, Clone)]
pub struct ExpansionState<'g> {
    graph: &'g ConnectivityGraph,
    visible_nodes: HashSet<NodeId>,
    visible_nets: HashSet<NetId>,
    undo_stack: Vec<ExpansionCommand>,
    redo_stack: Vec<ExpansionCommand>,
    /// Applied expand commands that introduced each node, latest last.
    /// Collapses leave entries alone; undoing an expand pops its own entry.
    provenance: HashMap<NodeId, Vec<Provenance>>,
    next_id: u64,
}

impl<'g> ExpansionState<'g> {
    /// An empty view over `graph`.
    pub fn new(graph: &'g ConnectivityGraph) -> Self {
        ExpansionState {
            graph,
            visible_nodes: HashSet::new(),
            visible_nets: HashSet::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            provenance: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn graph(&self) -> &'g ConnectivityGraph {
        self.graph
    }

    /// Shows the cone reached from `origin`, plus the node owning `origin`.
    /// The owner is added even for `Scope::HopCount(0)`, so a zero-hop
    /// expand from a hidden pin shows exactly that pin's node.
    ///
    /// If everything reached is already visible the returned command is a
    /// no-op and is not recorded; the redo history is left alone.
    pub fn expand(
        &mut self,
        origin: PinId,
        direction: Direction,
        scope: Scope,
    ) -> Result<ExpansionCommand> {
        let owner = self.graph.pin_owner(origin)?;
        let mut reached = ConeTraverser::new(self.graph).cone(origin, direction, scope)?;
        reached.insert(owner);
        let new_nodes: BTreeSet<NodeId> = reached
            .into_iter()
            .filter(|n| !self.visible_nodes.contains(n))
            .collect();

        let cmd = ExpansionCommand::new(
            self.next_command_id(),
            CommandKind::Expand,
            Origin::Pin(origin),
            direction,
            CommandPolicy::Expand(scope),
        );
        self.record_expand(cmd, new_nodes)
    }

    /// Shows a single node without traversing, as for the initial selection
    /// of a session. Recorded like an expand.
    pub fn seed(&mut self, node: NodeId) -> Result<ExpansionCommand> {
        self.graph.node(node)?;
        let new_nodes: BTreeSet<NodeId> = if self.visible_nodes.contains(&node) {
            BTreeSet::new()
        } else {
            std::iter::once(node).collect()
        };
        let cmd = ExpansionCommand::new(
            self.next_command_id(),
            CommandKind::Expand,
            Origin::Node(node),
            Direction::Both,
            CommandPolicy::Seed,
        );
        self.record_expand(cmd, new_nodes)
    }

    /// Hides `target`, and with [`CollapseScope::Subtree`] also the visible
    /// nodes expanded out of it that no other visible node still reaches.
    ///
    /// Collapsing a node that is not visible is a no-op.
    pub fn collapse(&mut self, target: NodeId, scope: CollapseScope) -> Result<ExpansionCommand> {
        self.graph.node(target)?;
        let direction = self.subtree_direction(target);
        if !self.visible_nodes.contains(&target) {
            log::debug!("collapse of hidden {} is a no-op", target);
            return Ok(ExpansionCommand::new(
                self.next_command_id(),
                CommandKind::Collapse,
                Origin::Node(target),
                direction,
                CommandPolicy::Collapse(scope),
            ));
        }

        let removed: BTreeSet<NodeId> = match scope {
            CollapseScope::ToSelected => std::iter::once(target).collect(),
            CollapseScope::Subtree => self.subtree_removal(target, direction)?,
        };
        let hidden_nets = self.hide(&removed)?;
        let cmd = ExpansionCommand::new(
            self.next_command_id(),
            CommandKind::Collapse,
            Origin::Node(target),
            direction,
            CommandPolicy::Collapse(scope),
        )
        .with_affected(removed, hidden_nets);
        log::debug!(
            "{} collapsed {:?} at {}: hid {} node(s), {} net(s)",
            cmd.id(),
            scope,
            target,
            cmd.nodes_affected().len(),
            cmd.nets_affected().len()
        );

        self.redo_stack.clear();
        self.undo_stack.push(cmd.clone());
        self.debug_check("collapse");
        Ok(cmd)
    }

    /// Reverts the most recent command. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        let cmd = match self.undo_stack.pop() {
            Some(cmd) => cmd,
            None => return false,
        };
        match cmd.kind() {
            CommandKind::Expand => {
                self.remove_affected(&cmd);
                self.pop_provenance(&cmd);
            }
            CommandKind::Collapse => self.insert_affected(&cmd),
        }
        log::debug!("undid {} ({:?})", cmd.id(), cmd.kind());
        self.redo_stack.push(cmd);
        self.debug_check("undo");
        true
    }

    /// Reapplies the most recently undone command. Returns false if there is
    /// none.
    pub fn redo(&mut self) -> bool {
        let cmd = match self.redo_stack.pop() {
            Some(cmd) => cmd,
            None => return false,
        };
        match cmd.kind() {
            CommandKind::Expand => {
                self.insert_affected(&cmd);
                self.push_provenance(&cmd);
            }
            CommandKind::Collapse => self.remove_affected(&cmd),
        }
        log::debug!("redid {} ({:?})", cmd.id(), cmd.kind());
        self.undo_stack.push(cmd);
        self.debug_check("redo");
        true
    }

    /// Hides everything and forgets all history.
    pub fn clear(&mut self) {
        self.visible_nodes.clear();
        self.visible_nets.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.provenance.clear();
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.visible_nodes.contains(&node)
    }

    pub fn is_net_visible(&self, net: NetId) -> bool {
        self.visible_nets.contains(&net)
    }

    pub fn visible_nodes(&self) -> &HashSet<NodeId> {
        &self.visible_nodes
    }

    pub fn visible_nets(&self) -> &HashSet<NetId> {
        &self.visible_nets
    }

    /// The command that made a visible node visible.
    pub fn introduced_by(&self, node: NodeId) -> Option<CommandId> {
        if !self.visible_nodes.contains(&node) {
            return None;
        }
        self.latest_provenance(node).map(|p| p.command)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_summary(&self) -> Option<CommandSummary> {
        self.undo_stack.last().map(ExpansionCommand::summary)
    }

    pub fn redo_summary(&self) -> Option<CommandSummary> {
        self.redo_stack.last().map(ExpansionCommand::summary)
    }

    /// Applied commands, oldest first.
    pub fn history(&self) -> &[ExpansionCommand] {
        &self.undo_stack
    }

    /// Snapshot of the visible subgraph, ready for layering.
    pub fn visible_view(&self) -> Result<GraphView> {
        GraphView::induced(self.graph, self.visible_nodes.iter().copied())
    }

    /// Recomputes the visible nets from the visible nodes and compares.
    pub fn check_invariant(&self) -> Result<()> {
        let mut expected: HashSet<NetId> = HashSet::new();
        for node in &self.visible_nodes {
            if !self.graph.contains_node(*node) {
                return Err(invariant_violation(
                    "ExpansionState",
                    format!("visible {} is not in the graph", node),
                ));
            }
        }
        for net in self.nets_on(self.visible_nodes.iter().copied())? {
            if self.connects_visible(net) {
                expected.insert(net);
            }
        }
        if expected != self.visible_nets {
            let missing: BTreeSet<NetId> =
                expected.difference(&self.visible_nets).copied().collect();
            let extra: BTreeSet<NetId> =
                self.visible_nets.difference(&expected).copied().collect();
            return Err(invariant_violation(
                "ExpansionState",
                format!(
                    "visible nets out of sync: missing {:?}, unexpected {:?}",
                    missing, extra
                ),
            ));
        }
        Ok(())
    }

    fn debug_check(&self, context: &str) {
        if cfg!(debug_assertions) {
            if let Err(e) = self.check_invariant() {
                panic!("{} left the expansion state inconsistent: {}", context, e);
            }
        }
    }

    fn next_command_id(&mut self) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        id
    }

    fn record_expand(
        &mut self,
        cmd: ExpansionCommand,
        new_nodes: BTreeSet<NodeId>,
    ) -> Result<ExpansionCommand> {
        if new_nodes.is_empty() {
            log::debug!("{} from {:?} is a no-op", cmd.id(), cmd.origin());
            return Ok(cmd);
        }
        let shown_nets = self.show(&new_nodes)?;
        let cmd = cmd.with_affected(new_nodes, shown_nets);
        log::debug!(
            "{} expanded from {:?}: showed {} node(s), {} net(s)",
            cmd.id(),
            cmd.origin(),
            cmd.nodes_affected().len(),
            cmd.nets_affected().len()
        );
        self.push_provenance(&cmd);
        self.redo_stack.clear();
        self.undo_stack.push(cmd.clone());
        self.debug_check("expand");
        Ok(cmd)
    }

    /// Adds `nodes` and returns the nets that became visible as a result.
    fn show(&mut self, nodes: &BTreeSet<NodeId>) -> Result<BTreeSet<NetId>> {
        let touched = self.nets_on(nodes.iter().copied())?;
        self.visible_nodes.extend(nodes.iter().copied());
        let shown: BTreeSet<NetId> = touched
            .into_iter()
            .filter(|net| !self.visible_nets.contains(net) && self.connects_visible(*net))
            .collect();
        self.visible_nets.extend(shown.iter().copied());
        Ok(shown)
    }

    /// Removes `nodes` and returns the nets that lost visibility.
    fn hide(&mut self, nodes: &BTreeSet<NodeId>) -> Result<BTreeSet<NetId>> {
        let touched = self.nets_on(nodes.iter().copied())?;
        for node in nodes {
            self.visible_nodes.remove(node);
        }
        let hidden: BTreeSet<NetId> = touched
            .into_iter()
            .filter(|net| self.visible_nets.contains(net) && !self.connects_visible(*net))
            .collect();
        for net in &hidden {
            self.visible_nets.remove(net);
        }
        Ok(hidden)
    }

    fn insert_affected(&mut self, cmd: &ExpansionCommand) {
        self.visible_nodes.extend(cmd.nodes_affected().iter().copied());
        self.visible_nets.extend(cmd.nets_affected().iter().copied());
    }

    fn remove_affected(&mut self, cmd: &ExpansionCommand) {
        for node in cmd.nodes_affected() {
            self.visible_nodes.remove(node);
        }
        for net in cmd.nets_affected() {
            self.visible_nets.remove(net);
        }
    }

    fn push_provenance(&mut self, cmd: &ExpansionCommand) {
        let entry = Provenance {
            command: cmd.id(),
            direction: match cmd.policy() {
                CommandPolicy::Seed => None,
                _ => Some(cmd.direction()),
            },
        };
        for node in cmd.nodes_affected() {
            self.provenance.entry(*node).or_default().push(entry);
        }
    }

    fn pop_provenance(&mut self, cmd: &ExpansionCommand) {
        for node in cmd.nodes_affected() {
            if let Some(stack) = self.provenance.get_mut(node) {
                debug_assert_eq!(stack.last().map(|p| p.command), Some(cmd.id()));
                stack.pop();
                if stack.is_empty() {
                    self.provenance.remove(node);
                }
            }
        }
    }

    fn latest_provenance(&self, node: NodeId) -> Option<Provenance> {
        self.provenance.get(&node).and_then(|s| s.last()).copied()
    }

    /// True when at least two pins of `net` sit on visible nodes.
    fn connects_visible(&self, net: NetId) -> bool {
        let pins = self.graph.pins();
        self.graph.nets()[net.index()]
            .pins
            .iter()
            .filter(|p| self.visible_nodes.contains(&pins[p.index()].node))
            .nth(1)
            .is_some()
    }

    /// Every net attached to any pin of `nodes`.
    fn nets_on<I>(&self, nodes: I) -> Result<BTreeSet<NetId>>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut nets: BTreeSet<NetId> = BTreeSet::new();
        for node in nodes {
            for pin in &self.graph.node(node)?.pins {
                nets.extend(self.graph.pin_nets(*pin)?.iter().copied());
            }
        }
        Ok(nets)
    }

    /// Direction(s) `target` was grown in: the union over applied expansions
    /// issued from one of its pins, else the direction of the expansion that
    /// introduced it, else fanout.
    fn subtree_direction(&self, target: NodeId) -> Direction {
        let mut direction: Option<Direction> = None;
        for cmd in &self.undo_stack {
            let pin = match (cmd.policy(), cmd.origin()) {
                (CommandPolicy::Expand(_), Origin::Pin(pin)) => pin,
                _ => continue,
            };
            if self.graph.pin_owner(pin).ok() == Some(target) {
                direction = Some(direction.map_or(cmd.direction(), |d| d.union(cmd.direction())));
            }
        }
        direction
            .or_else(|| self.latest_provenance(target).and_then(|p| p.direction))
            .unwrap_or(Direction::Fanout)
    }

    /// Nodes a subtree collapse of `target` removes, `target` included.
    ///
    /// Candidates are visible nodes reachable from `target` in `direction`
    /// that were not introduced before it and are not anchors.
    /// A candidate stays if some visible node outside the candidates reaches
    /// it without passing through `target`.
    fn subtree_removal(&self, target: NodeId, direction: Direction) -> Result<BTreeSet<NodeId>> {
        let target_cmd = self.latest_provenance(target).map(|p| p.command);
        let anchors = self.anchors(target, target_cmd);
        let introduced_earlier = |node: NodeId| {
            match (self.latest_provenance(node).map(|p| p.command), target_cmd) {
                (Some(c), Some(t)) => c < t,
                _ => false,
            }
        };

        let mut candidates: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(target);
        while let Some(node) = queue.pop_front() {
            for next in self.visible_neighbors(node, direction)? {
                if next == target
                    || introduced_earlier(next)
                    || anchors.contains(&next)
                    || !candidates.insert(next)
                {
                    continue;
                }
                queue.push_back(next);
            }
        }

        let mut queue: VecDeque<NodeId> = self
            .visible_nodes
            .iter()
            .copied()
            .filter(|n| *n != target && !candidates.contains(n))
            .collect();
        let mut seen: HashSet<NodeId> = queue.iter().copied().collect();
        let mut retained: HashSet<NodeId> = HashSet::new();
        while let Some(node) = queue.pop_front() {
            for next in self.visible_neighbors(node, direction)? {
                if next == target || !seen.insert(next) {
                    continue;
                }
                if candidates.contains(&next) {
                    retained.insert(next);
                }
                queue.push_back(next);
            }
        }

        let mut removed: BTreeSet<NodeId> = candidates.difference(&retained).copied().collect();
        removed.insert(target);
        Ok(removed)
    }

    /// Visible nodes that applied seeds or expansions, no newer than the one
    /// that introduced `target`, were issued from. Feedback can lead a
    /// subtree walk back to them, but they are never removed with it.
    fn anchors(&self, target: NodeId, target_cmd: Option<CommandId>) -> HashSet<NodeId> {
        self.undo_stack
            .iter()
            .filter(|cmd| cmd.kind() == CommandKind::Expand)
            .filter(|cmd| target_cmd.map_or(true, |t| cmd.id() <= t))
            .filter_map(|cmd| match cmd.origin() {
                Origin::Pin(pin) => self.graph.pin_owner(pin).ok(),
                Origin::Node(node) => Some(node),
            })
            .filter(|node| *node != target && self.visible_nodes.contains(node))
            .collect()
    }

    /// Visible nodes one signal-net hop away from `node` in `direction`.
    fn visible_neighbors(&self, node: NodeId, direction: Direction) -> Result<Vec<NodeId>> {
        let nets = self.graph.nets();
        let mut out: Vec<NodeId> = Vec::new();
        for dir in direction.components() {
            let links = match dir {
                Direction::Fanin => self.graph.fanin_links(node)?,
                _ => self.graph.fanout_links(node)?,
            };
            out.extend(
                links
                    .iter()
                    .filter(|l| !nets[l.net.index()].class.is_supply())
                    .filter(|l| self.visible_nodes.contains(&l.node))
                    .map(|l| l.node),
            );
        }
        Ok(out)
    }
}
