//! A* search over precomputed navigation graphs
//!
//! This crate finds the lowest-cost route between two arbitrary points on a
//! navigation graph. Query points are snapped to their nearest graph nodes,
//! the frontier is expanded with a straight-line heuristic, and the
//! waypoints between the snapped endpoints are returned.
//!
//! Searches can run inline through [`AStarSearch`], or in the background
//! through [`PathTask`] so a frame loop can poll for completion without
//! blocking. [`PathQueue`] manages several background requests over one
//! shared graph.
//!
//! # Example
//!
//! ```rust,no_run
//! use nav_search::{NavGraph, PathTask};
//! use glam::Vec2;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = NavGraph::new();
//! let a = graph.add_node(0.0, 0.0, 0);
//! let b = graph.add_node(1.0, 0.0, 0);
//! let c = graph.add_node(2.0, 0.0, 0);
//! graph.add_bidirectional_edge(a, b, 1.0)?;
//! graph.add_bidirectional_edge(b, c, 1.0)?;
//!
//! let task = PathTask::spawn(Arc::new(graph), Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0))?;
//! task.wait_until_done().await?;
//!
//! // Only the intermediate waypoint is returned
//! assert_eq!(task.path()?, vec![Vec2::new(1.0, 0.0)]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod graph;
pub mod node_queue;
pub mod path_queue;
pub mod path_task;
pub mod search;
pub mod status;

#[cfg(test)]
mod concurrency_safety_tests;

pub use config::{PathQueueConfig, SearchConfig};
pub use graph::{NavGraph, NavNode, Neighbor, NodeRef};
pub use node_queue::NodeQueue;
pub use path_queue::{PathQueue, PathRequestRef, PATHQ_INVALID};
pub use path_task::{PathTask, SearchOutcome};
pub use search::{AStarSearch, SearchState};
pub use status::Status;

pub use nav_common::{Error, Result, Vec2};
