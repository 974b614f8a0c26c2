//! A* search over a navigation graph
//!
//! [`AStarSearch`] snaps two arbitrary query points to their nearest graph
//! nodes, expands the frontier guided by the straight-line heuristic, and
//! reconstructs the waypoints between the snapped endpoints. The search can
//! be run to completion with [`AStarSearch::run`] or advanced in bounded
//! slices with [`AStarSearch::update`].

use std::collections::HashMap;

use glam::Vec2;
use nav_common::{Error, Result};

use super::node_queue::NodeQueue;
use super::{NavGraph, NodeRef};

/// State of an A* search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Query points have not been resolved to nodes yet
    Unresolved,
    /// Frontier expansion is in progress
    Expanding,
    /// Expansion finished, either at the goal or with an exhausted frontier
    Done,
}

/// A single A* search session over a borrowed graph
///
/// Session maps grow monotonically and are never reset; a new query needs a
/// new instance.
#[derive(Debug)]
pub struct AStarSearch<'a> {
    graph: &'a NavGraph,
    start_pos: Vec2,
    goal_pos: Vec2,
    start: Option<NodeRef>,
    goal: Option<NodeRef>,
    /// Predecessor on the best known path, start maps to itself
    came_from: HashMap<NodeRef, NodeRef>,
    /// Best known accumulated cost
    cost_so_far: HashMap<NodeRef, f32>,
    frontier: NodeQueue,
    state: SearchState,
    expanded: usize,
}

impl<'a> AStarSearch<'a> {
    /// Creates a search between two arbitrary points
    pub fn new(graph: &'a NavGraph, start_pos: Vec2, goal_pos: Vec2) -> Self {
        Self {
            graph,
            start_pos,
            goal_pos,
            start: None,
            goal: None,
            came_from: HashMap::new(),
            cost_so_far: HashMap::new(),
            frontier: NodeQueue::new(),
            state: SearchState::Unresolved,
            expanded: 0,
        }
    }

    /// Resolves the query points to nodes and seeds the frontier
    pub fn begin_search(&mut self) -> Result<()> {
        if self.state != SearchState::Unresolved {
            return Err(Error::InvalidState(format!(
                "begin_search called in state {:?}",
                self.state
            )));
        }

        match self.graph.nearest_nodes(self.start_pos, self.goal_pos) {
            Some((start, goal)) => {
                log::debug!(
                    "A* search {:?} -> {:?} resolved to nodes {} -> {}",
                    self.start_pos,
                    self.goal_pos,
                    start,
                    goal
                );

                self.start = Some(start);
                self.goal = Some(goal);
                self.came_from.insert(start, start);
                self.cost_so_far.insert(start, 0.0);
                self.frontier.insert_or_update(start, 0.0);
                self.state = SearchState::Expanding;
            }
            None => {
                log::debug!("A* search on an empty graph, nothing to expand");
                self.state = SearchState::Done;
            }
        }

        Ok(())
    }

    /// Expands up to `max_iters` frontier nodes
    ///
    /// Returns the state after the slice. Calling this on a finished search
    /// is a no-op.
    pub fn update(&mut self, max_iters: usize) -> Result<SearchState> {
        match self.state {
            SearchState::Unresolved => {
                return Err(Error::InvalidState(
                    "update called before begin_search".to_string(),
                ))
            }
            SearchState::Done => return Ok(self.state),
            SearchState::Expanding => {}
        }

        let Some(goal) = self.goal else {
            self.finish();
            return Ok(self.state);
        };

        for _ in 0..max_iters {
            let Some(current) = self.frontier.pop_min() else {
                self.finish();
                break;
            };

            if current == goal {
                self.finish();
                break;
            }

            self.expand(current, goal);
        }

        Ok(self.state)
    }

    /// Runs the search to completion
    pub fn run(&mut self) -> Result<()> {
        if self.state == SearchState::Unresolved {
            self.begin_search()?;
        }

        while self.state != SearchState::Done {
            self.update(usize::MAX)?;
        }

        Ok(())
    }

    /// Relaxes every outgoing edge of `current`
    fn expand(&mut self, current: NodeRef, goal: NodeRef) {
        let graph = self.graph;
        self.expanded += 1;

        let current_cost = self.cost_so_far.get(&current).copied().unwrap_or(0.0);
        log::trace!("expanding {} at cost {}", current, current_cost);

        for edge in graph.neighbors(current) {
            let new_cost = current_cost + edge.cost;
            let improves = match self.cost_so_far.get(&edge.node) {
                Some(&known) => new_cost < known,
                None => true,
            };

            if improves {
                self.cost_so_far.insert(edge.node, new_cost);
                self.came_from.insert(edge.node, current);

                let priority = new_cost + graph.heuristic(edge.node, goal);
                self.frontier.insert_or_update(edge.node, priority);
            }
        }
    }

    fn finish(&mut self) {
        self.state = SearchState::Done;
        self.frontier.clear();

        log::debug!(
            "A* search done after {} expansions, goal {}",
            self.expanded,
            if self.goal_cost().is_some() {
                "reached"
            } else {
                "unreachable"
            }
        );
    }

    /// Returns the full node path from start to goal, endpoints included
    ///
    /// Empty if the goal was never reached.
    pub fn reconstruct_node_path(&self) -> Result<Vec<NodeRef>> {
        if self.state != SearchState::Done {
            return Err(Error::NotReady);
        }

        let (Some(start), Some(goal)) = (self.start, self.goal) else {
            return Ok(Vec::new());
        };
        if !self.came_from.contains_key(&goal) {
            return Ok(Vec::new());
        }

        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            current = match self.came_from.get(&current) {
                Some(&parent) => parent,
                None => {
                    return Err(Error::Pathfinding(format!(
                        "predecessor chain broken at {}",
                        current
                    )))
                }
            };
            path.push(current);
        }

        path.reverse();
        Ok(path)
    }

    /// Returns the waypoints strictly between the snapped start and goal
    ///
    /// Both endpoint nodes are dropped, so a start and goal that resolve to
    /// the same node, or to adjacent nodes, yield an empty path.
    pub fn reconstruct_path(&self) -> Result<Vec<Vec2>> {
        let nodes = self.reconstruct_node_path()?;
        Ok(self.waypoints(&nodes))
    }

    pub(crate) fn waypoints(&self, nodes: &[NodeRef]) -> Vec<Vec2> {
        if nodes.len() <= 2 {
            return Vec::new();
        }

        nodes[1..nodes.len() - 1]
            .iter()
            .filter_map(|&node| self.graph.node(node).map(|n| n.pos))
            .collect()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == SearchState::Done
    }

    /// Node the start point resolved to
    pub fn start(&self) -> Option<NodeRef> {
        self.start
    }

    /// Node the goal point resolved to
    pub fn goal(&self) -> Option<NodeRef> {
        self.goal
    }

    pub fn cost_so_far(&self, node: NodeRef) -> Option<f32> {
        self.cost_so_far.get(&node).copied()
    }

    pub fn came_from(&self, node: NodeRef) -> Option<NodeRef> {
        self.came_from.get(&node).copied()
    }

    /// Accumulated cost to the goal, if it was reached
    pub fn goal_cost(&self) -> Option<f32> {
        self.goal.and_then(|goal| self.cost_so_far(goal))
    }

    /// Number of nodes expanded so far
    pub fn expanded_count(&self) -> usize {
        self.expanded
    }

    pub fn graph(&self) -> &'a NavGraph {
        self.graph
    }
}
