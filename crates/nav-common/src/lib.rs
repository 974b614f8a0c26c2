//! Common utilities and data structures used by the navigation search crates

mod vector;

pub use vector::*;

/// Represents a 2D position on the navigation grid
pub type Vec2 = glam::Vec2;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("search result is not ready yet")]
    NotReady,

    #[error("invalid search state: {0}")]
    InvalidState(String),

    #[error("invalid navigation graph: {0}")]
    InvalidGraph(String),

    #[error("no async runtime available: {0}")]
    Runtime(String),

    #[error("path request queue is full")]
    QueueFull,

    #[error("path request not found")]
    NotFound,

    #[error("pathfinding failed: {0}")]
    Pathfinding(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for navigation operations
pub type Result<T> = std::result::Result<T, Error>;
