//! Configuration for background searches and the path queue

use nav_common::{Error, Result};

/// Default number of node expansions per search slice
pub const DEFAULT_SLICE_ITERATIONS: usize = 256;

/// Default number of concurrent path requests
pub const DEFAULT_MAX_REQUESTS: usize = 8;

/// Default maximum number of waypoints returned per request
pub const DEFAULT_MAX_PATH_SIZE: usize = 256;

/// Configuration for a single search
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SearchConfig {
    /// Node expansions performed per slice by the background worker
    pub slice_iterations: usize,
}

impl SearchConfig {
    pub fn with_slice_iterations(mut self, slice_iterations: usize) -> Self {
        self.slice_iterations = slice_iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.slice_iterations == 0 {
            return Err(Error::InvalidState(
                "slice_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            slice_iterations: DEFAULT_SLICE_ITERATIONS,
        }
    }
}

/// Configuration for a [`PathQueue`](crate::PathQueue)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PathQueueConfig {
    /// Maximum number of requests in flight or awaiting pickup
    pub max_requests: usize,
    /// Maximum number of waypoints returned per request
    pub max_path_size: usize,
    /// Settings applied to every search started by the queue
    #[cfg_attr(feature = "serialization", serde(default))]
    pub search: SearchConfig,
}

impl PathQueueConfig {
    pub fn new(max_requests: usize, max_path_size: usize) -> Self {
        Self {
            max_requests,
            max_path_size,
            search: SearchConfig::default(),
        }
    }

    pub fn with_max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn with_max_path_size(mut self, max_path_size: usize) -> Self {
        self.max_path_size = max_path_size;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(Error::InvalidState(
                "max_requests must be at least 1".to_string(),
            ));
        }

        if self.max_path_size == 0 {
            return Err(Error::InvalidState(
                "max_path_size must be at least 1".to_string(),
            ));
        }

        self.search.validate()
    }
}

impl Default for PathQueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_MAX_PATH_SIZE)
    }
}
