//! Status codes for path requests

/// Status of a path request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Search finished and produced a path
    Success,
    /// Search failed due to an internal error
    Failure,
    /// Search is still running
    InProgress,
    /// Search finished but the goal was unreachable
    PathInvalid,
    /// Request does not exist or was already taken
    NotFound,
    /// Search produced a path that was truncated to the configured path size
    PartialResult,
}

impl Status {
    /// Checks if the status is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::Failure | Status::PathInvalid | Status::NotFound)
    }

    /// Checks if the status is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success | Status::PartialResult)
    }

    /// Checks if the request is still running
    pub fn is_in_progress(&self) -> bool {
        *self == Status::InProgress
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "Success"),
            Status::Failure => write!(f, "Failure"),
            Status::InProgress => write!(f, "Operation in progress"),
            Status::PathInvalid => write!(f, "Invalid path"),
            Status::NotFound => write!(f, "Value not found"),
            Status::PartialResult => write!(f, "Partial result"),
        }
    }
}
