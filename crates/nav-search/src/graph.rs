//! Navigation graph model
//!
//! A [`NavGraph`] is a frozen set of nodes with planar positions plus a
//! directed, cost-weighted adjacency list. Nodes are addressed by [`NodeRef`]
//! handles into the graph's node arena, so two nodes sharing a position are
//! still distinct.

use glam::Vec2;
use nav_common::{distance, distance_squared, Error, Result};

/// Handle to a node in a [`NavGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct NodeRef(u32);

impl NodeRef {
    /// Creates a node reference from a raw index
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw index
    pub const fn id(&self) -> u32 {
        self.0
    }

    #[inline]
    fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the navigation graph
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavNode {
    /// Planar position
    pub pos: Vec2,
    /// Height tier, separates nodes stacked on the same planar position
    #[cfg_attr(feature = "serialization", serde(default))]
    pub level: i32,
}

impl NavNode {
    pub fn new(x: f32, y: f32, level: i32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            level,
        }
    }

    pub fn x(&self) -> f32 {
        self.pos.x
    }

    pub fn y(&self) -> f32 {
        self.pos.y
    }
}

/// Directed edge to a neighboring node
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Neighbor {
    /// Target node
    pub node: NodeRef,
    /// Traversal cost, never negative
    pub cost: f32,
}

/// Navigation graph: ordered nodes plus per-node outgoing edges
///
/// Node enumeration order is insertion order and is what nearest-node
/// resolution iterates, which keeps tie-breaking reproducible.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavGraph {
    nodes: Vec<NavNode>,
    /// Adjacency indexed by source node; may be shorter than `nodes`
    #[cfg_attr(feature = "serialization", serde(default))]
    neighbors: Vec<Vec<Neighbor>>,
}

impl NavGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `node_capacity` nodes
    pub fn with_capacity(node_capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(node_capacity),
            neighbors: Vec::with_capacity(node_capacity),
        }
    }

    /// Adds a node and returns its handle
    pub fn add_node(&mut self, x: f32, y: f32, level: i32) -> NodeRef {
        let node_ref = NodeRef::new(self.nodes.len() as u32);
        self.nodes.push(NavNode::new(x, y, level));
        self.neighbors.push(Vec::new());
        node_ref
    }

    /// Adds a directed edge from `from` to `to`
    pub fn add_edge(&mut self, from: NodeRef, to: NodeRef, cost: f32) -> Result<()> {
        if !self.is_valid_node_ref(from) || !self.is_valid_node_ref(to) {
            return Err(Error::InvalidGraph(format!(
                "edge {} -> {} references a missing node",
                from, to
            )));
        }
        if cost.is_nan() || cost < 0.0 {
            return Err(Error::InvalidGraph(format!(
                "edge {} -> {} has invalid cost {}",
                from, to, cost
            )));
        }

        if self.neighbors.len() <= from.index() {
            self.neighbors.resize_with(from.index() + 1, Vec::new);
        }
        self.neighbors[from.index()].push(Neighbor { node: to, cost });
        Ok(())
    }

    /// Adds edges in both directions with the same cost
    pub fn add_bidirectional_edge(&mut self, a: NodeRef, b: NodeRef, cost: f32) -> Result<()> {
        self.add_edge(a, b, cost)?;
        self.add_edge(b, a, cost)
    }

    /// All nodes in enumeration order
    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    /// Iterates node handles together with their nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &NavNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeRef::new(i as u32), node))
    }

    pub fn node(&self, node_ref: NodeRef) -> Option<&NavNode> {
        self.nodes.get(node_ref.index())
    }

    /// Outgoing edges of a node
    ///
    /// Nodes without an adjacency entry, and handles outside the graph, have
    /// no neighbors.
    pub fn neighbors(&self, node_ref: NodeRef) -> &[Neighbor] {
        self.neighbors
            .get(node_ref.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_valid_node_ref(&self, node_ref: NodeRef) -> bool {
        node_ref.index() < self.nodes.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the node nearest to `point` by squared distance
    pub fn nearest_node(&self, point: Vec2) -> Option<NodeRef> {
        self.nearest_nodes(point, point).map(|(node, _)| node)
    }

    /// Resolves the nodes nearest to `start` and `goal` in a single pass
    ///
    /// Ties go to the node enumerated first. Returns `None` for an empty graph.
    pub fn nearest_nodes(&self, start: Vec2, goal: Vec2) -> Option<(NodeRef, NodeRef)> {
        let mut nearest_start = f64::INFINITY;
        let mut nearest_goal = f64::INFINITY;
        let mut start_ref = None;
        let mut goal_ref = None;

        for (node_ref, node) in self.iter() {
            let s_dist = distance_squared(&start, &node.pos);
            let g_dist = distance_squared(&goal, &node.pos);

            if s_dist < nearest_start || start_ref.is_none() {
                start_ref = Some(node_ref);
                nearest_start = s_dist;
            }
            if g_dist < nearest_goal || goal_ref.is_none() {
                goal_ref = Some(node_ref);
                nearest_goal = g_dist;
            }
        }

        start_ref.zip(goal_ref)
    }

    /// Straight-line distance between two nodes
    ///
    /// Unknown handles yield zero, which keeps the estimate admissible.
    pub fn heuristic(&self, a: NodeRef, b: NodeRef) -> f32 {
        match (self.node(a), self.node(b)) {
            (Some(a), Some(b)) => distance(&a.pos, &b.pos),
            _ => 0.0,
        }
    }

    /// Checks that every edge targets an existing node with a valid cost
    pub fn validate(&self) -> Result<()> {
        if self.neighbors.len() > self.nodes.len() {
            return Err(Error::InvalidGraph(format!(
                "{} adjacency lists for {} nodes",
                self.neighbors.len(),
                self.nodes.len()
            )));
        }

        for (from, edges) in self.neighbors.iter().enumerate() {
            for edge in edges {
                if !self.is_valid_node_ref(edge.node) {
                    return Err(Error::InvalidGraph(format!(
                        "edge #{} -> {} references a missing node",
                        from, edge.node
                    )));
                }
                if edge.cost.is_nan() || edge.cost < 0.0 {
                    return Err(Error::InvalidGraph(format!(
                        "edge #{} -> {} has invalid cost {}",
                        from, edge.node, edge.cost
                    )));
                }
            }
        }

        Ok(())
    }

    /// Serializes the graph to a JSON string
    #[cfg(feature = "serialization")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parses and validates a graph from a JSON string
    #[cfg(feature = "serialization")]
    pub fn from_json(json: &str) -> Result<Self> {
        let graph: Self =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        graph.validate()?;
        Ok(graph)
    }

    /// Saves the graph to a file in JSON format
    #[cfg(feature = "serialization")]
    pub fn save_to_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a graph from a JSON file
    #[cfg(feature = "serialization")]
    pub fn load_from_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
