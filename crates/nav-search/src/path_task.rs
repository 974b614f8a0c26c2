//! Background execution of a single A* search
//!
//! A [`PathTask`] runs an [`AStarSearch`] on the tokio blocking pool so the
//! caller's loop never blocks. Completion is published through an atomic
//! flag that can be polled every tick with [`PathTask::is_done`], or awaited
//! with [`PathTask::wait_until_done`].

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use glam::Vec2;
use nav_common::{Error, Result};
use tokio::sync::Notify;

use super::config::SearchConfig;
use super::search::{AStarSearch, SearchState};
use super::{NavGraph, NodeRef};

/// Result of a finished search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Node the start point resolved to, `None` for an empty graph
    pub start: Option<NodeRef>,
    /// Node the goal point resolved to, `None` for an empty graph
    pub goal: Option<NodeRef>,
    /// Accumulated cost to the goal if it was reached
    pub goal_cost: Option<f32>,
    /// Full node path from start to goal, endpoints included
    pub node_path: Vec<NodeRef>,
    /// Waypoints strictly between the snapped endpoints
    pub path: Vec<Vec2>,
    /// Number of nodes expanded
    pub expanded: usize,
}

impl SearchOutcome {
    /// Collects the outcome of a finished search
    pub fn from_search(search: &AStarSearch<'_>) -> Result<Self> {
        let node_path = search.reconstruct_node_path()?;
        let path = search.waypoints(&node_path);

        Ok(Self {
            start: search.start(),
            goal: search.goal(),
            goal_cost: search.goal_cost(),
            node_path,
            path,
            expanded: search.expanded_count(),
        })
    }

    /// Checks if the goal was reached
    pub fn found(&self) -> bool {
        !self.node_path.is_empty()
    }
}

/// State shared between the caller and the background worker
#[derive(Debug, Default)]
struct Shared {
    /// Written once, before `done` is raised
    outcome: OnceLock<std::result::Result<SearchOutcome, String>>,
    done: AtomicBool,
    notify: Notify,
}

impl Shared {
    fn complete(&self, outcome: std::result::Result<SearchOutcome, String>) {
        if self.outcome.set(outcome).is_err() {
            log::warn!("search outcome was already published");
        }
        self.done.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn outcome(&self) -> Result<&SearchOutcome> {
        if !self.is_done() {
            return Err(Error::NotReady);
        }

        match self.outcome.get() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(Error::Pathfinding(message.clone())),
            None => Err(Error::NotReady),
        }
    }
}

/// An A* search executed off the calling thread
///
/// The graph is shared read-only, so any number of tasks may search the same
/// graph at once. A started task always runs to completion; there is no
/// cancellation.
#[derive(Debug)]
pub struct PathTask {
    graph: Arc<NavGraph>,
    start_pos: Vec2,
    goal_pos: Vec2,
    config: SearchConfig,
    started: AtomicBool,
    shared: Arc<Shared>,
}

impl PathTask {
    /// Creates a task between two arbitrary points, not yet started
    pub fn new(graph: Arc<NavGraph>, start_pos: Vec2, goal_pos: Vec2) -> Self {
        Self::with_config(graph, start_pos, goal_pos, SearchConfig::default())
    }

    pub fn with_config(
        graph: Arc<NavGraph>,
        start_pos: Vec2,
        goal_pos: Vec2,
        config: SearchConfig,
    ) -> Self {
        Self {
            graph,
            start_pos,
            goal_pos,
            config,
            started: AtomicBool::new(false),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Creates and immediately starts a task
    pub fn spawn(graph: Arc<NavGraph>, start_pos: Vec2, goal_pos: Vec2) -> Result<Self> {
        let task = Self::new(graph, start_pos, goal_pos);
        task.start()?;
        Ok(task)
    }

    /// Launches the search on the runtime's blocking pool and returns
    /// immediately
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        self.config.validate()?;

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::InvalidState("path task already started".to_string()));
        }

        let graph = Arc::clone(&self.graph);
        let shared = Arc::clone(&self.shared);
        let (start_pos, goal_pos) = (self.start_pos, self.goal_pos);
        let config = self.config.clone();

        // Fire and forget; completion is observed through `shared`
        drop(handle.spawn_blocking(move || {
            run_worker(&shared, || run_search(&graph, start_pos, goal_pos, &config));
        }));

        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Non-blocking check for completion
    pub fn is_done(&self) -> bool {
        self.shared.is_done()
    }

    /// Suspends the calling task until the search has finished
    ///
    /// Fails if the task was never started, since it could not complete.
    pub async fn wait_until_done(&self) -> Result<()> {
        if !self.is_started() {
            return Err(Error::InvalidState("path task not started".to_string()));
        }

        loop {
            // Register for the wake-up before checking, so a completion in
            // between is not lost
            let notified = self.shared.notify.notified();
            if self.is_done() {
                return Ok(());
            }
            notified.await;
        }
    }

    /// Waypoints between the snapped start and goal
    ///
    /// Returns [`Error::NotReady`] until [`is_done`](Self::is_done) is true.
    pub fn path(&self) -> Result<Vec<Vec2>> {
        Ok(self.shared.outcome()?.path.clone())
    }

    /// Full outcome of the finished search
    pub fn outcome(&self) -> Result<SearchOutcome> {
        self.shared.outcome().cloned()
    }

    pub fn start_pos(&self) -> Vec2 {
        self.start_pos
    }

    pub fn goal_pos(&self) -> Vec2 {
        self.goal_pos
    }

    pub fn graph(&self) -> &Arc<NavGraph> {
        &self.graph
    }
}

/// Worker body: runs `search`, catching panics, and always raises the done flag
fn run_worker<F>(shared: &Shared, search: F)
where
    F: FnOnce() -> Result<SearchOutcome>,
{
    let outcome = match std::panic::catch_unwind(AssertUnwindSafe(search)) {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            log::warn!("search worker panicked: {}", message);
            Err(format!("search worker panicked: {}", message))
        }
    };

    shared.complete(outcome);
}

/// Runs one search to completion in slices of `config.slice_iterations`
fn run_search(
    graph: &NavGraph,
    start_pos: Vec2,
    goal_pos: Vec2,
    config: &SearchConfig,
) -> Result<SearchOutcome> {
    let mut search = AStarSearch::new(graph, start_pos, goal_pos);
    search.begin_search()?;

    let mut slices = 0usize;
    while search.update(config.slice_iterations)? != SearchState::Done {
        slices += 1;
        log::trace!(
            "search slice {} done, {} nodes expanded",
            slices,
            search.expanded_count()
        );
    }

    SearchOutcome::from_search(&search)
}

#[cfg(test)]
impl PathTask {
    /// Marks the task as started without handing it to a worker
    pub(crate) fn mark_started(&self) {
        self.started.store(true, Ordering::Release);
    }

    /// Runs the worker body on the calling thread
    pub(crate) fn run_inline(&self) {
        self.mark_started();
        run_worker(&self.shared, || {
            run_search(&self.graph, self.start_pos, self.goal_pos, &self.config)
        });
    }

    /// Runs a worker body that panics with `message`
    pub(crate) fn run_inline_panicking(&self, message: &str) {
        self.mark_started();
        run_worker(&self.shared, || panic!("{}", message));
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
