use std::sync::Arc;

use glam::Vec2;
use nav_common::{Error, Result};

use crate::{NavGraph, PathQueueConfig, PathTask, Status};

pub const PATHQ_INVALID: PathRequestRef = 0;

pub type PathRequestRef = u32;

#[derive(Debug)]
struct PathQuery {
    reference: PathRequestRef,
    task: PathTask,
}

/// Fixed-capacity set of background path requests over one shared graph
///
/// Each request runs as its own [`PathTask`]. A slot stays occupied until its
/// path is taken.
#[derive(Debug)]
pub struct PathQueue {
    graph: Arc<NavGraph>,
    config: PathQueueConfig,
    queue: Vec<Option<PathQuery>>,
    next_handle: PathRequestRef,
}

impl PathQueue {
    pub fn new(graph: Arc<NavGraph>) -> Self {
        Self {
            graph,
            queue: (0..PathQueueConfig::default().max_requests)
                .map(|_| None)
                .collect(),
            config: PathQueueConfig::default(),
            next_handle: 1,
        }
    }

    pub fn with_config(graph: Arc<NavGraph>, config: PathQueueConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            graph,
            queue: (0..config.max_requests).map(|_| None).collect(),
            config,
            next_handle: 1,
        })
    }

    /// Starts a background search and returns a handle to it
    pub fn request(&mut self, start_pos: Vec2, goal_pos: Vec2) -> Result<PathRequestRef> {
        let Some(slot_idx) = self.queue.iter().position(Option::is_none) else {
            log::warn!(
                "path queue full ({} requests), rejecting {:?} -> {:?}",
                self.queue.len(),
                start_pos,
                goal_pos
            );
            return Err(Error::QueueFull);
        };

        let task = PathTask::with_config(
            Arc::clone(&self.graph),
            start_pos,
            goal_pos,
            self.config.search.clone(),
        );
        task.start()?;

        let reference = self.allocate_handle();
        self.queue[slot_idx] = Some(PathQuery { reference, task });

        Ok(reference)
    }

    pub fn request_status(&self, reference: PathRequestRef) -> Status {
        let Some(query) = self.find(reference) else {
            return Status::NotFound;
        };

        if !query.task.is_done() {
            return Status::InProgress;
        }

        match query.task.outcome() {
            Ok(outcome) if !outcome.found() => Status::PathInvalid,
            Ok(outcome) if outcome.path.len() > self.config.max_path_size => {
                Status::PartialResult
            }
            Ok(_) => Status::Success,
            Err(_) => Status::Failure,
        }
    }

    /// Removes a finished request and returns its waypoints
    ///
    /// Paths longer than the configured maximum are truncated. A request that
    /// is still running stays queued and yields [`Error::NotReady`]. A failed
    /// request is removed and its error returned.
    pub fn take_path(&mut self, reference: PathRequestRef) -> Result<Vec<Vec2>> {
        let slot_idx = self.slot_of(reference).ok_or(Error::NotFound)?;

        let finished = self.queue[slot_idx]
            .as_ref()
            .is_some_and(|query| query.task.is_done());
        if !finished {
            return Err(Error::NotReady);
        }

        // A finished request gives up its slot whether it succeeded or not
        let query = self.queue[slot_idx].take().ok_or(Error::NotFound)?;
        let mut path = query.task.path()?;

        path.truncate(self.config.max_path_size);
        Ok(path)
    }

    /// Suspends until the given request has finished
    pub async fn wait(&self, reference: PathRequestRef) -> Result<Status> {
        let query = self.find(reference).ok_or(Error::NotFound)?;
        query.task.wait_until_done().await?;
        Ok(self.request_status(reference))
    }

    /// Number of requests still running
    pub fn pending_count(&self) -> usize {
        self.queue
            .iter()
            .flatten()
            .filter(|query| !query.task.is_done())
            .count()
    }

    /// Number of occupied slots, running or awaiting pickup
    pub fn len(&self) -> usize {
        self.queue.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.queue.len()
    }

    pub fn graph(&self) -> &Arc<NavGraph> {
        &self.graph
    }

    fn find(&self, reference: PathRequestRef) -> Option<&PathQuery> {
        self.queue
            .iter()
            .flatten()
            .find(|query| query.reference == reference && reference != PATHQ_INVALID)
    }

    fn slot_of(&self, reference: PathRequestRef) -> Option<usize> {
        if reference == PATHQ_INVALID {
            return None;
        }
        self.queue.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|query| query.reference == reference)
        })
    }

    fn allocate_handle(&mut self) -> PathRequestRef {
        loop {
            let reference = self.next_handle;
            self.next_handle = self.next_handle.wrapping_add(1);
            if self.next_handle == PATHQ_INVALID {
                self.next_handle = 1;
            }

            // Skip handles still held by a long-lived request after wrap-around
            if self.find(reference).is_none() {
                return reference;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeRef, SearchConfig};

    fn line_graph(len: u32) -> Arc<NavGraph> {
        let mut graph = NavGraph::new();
        for i in 0..len {
            graph.add_node(i as f32, 0.0, 0);
        }
        for i in 1..len {
            graph
                .add_bidirectional_edge(NodeRef::new(i - 1), NodeRef::new(i), 1.0)
                .unwrap();
        }
        Arc::new(graph)
    }

    /// Places a task into the first free slot without starting a worker
    fn insert_task(queue: &mut PathQueue, task: PathTask) -> PathRequestRef {
        let slot_idx = queue.queue.iter().position(Option::is_none).unwrap();
        let reference = queue.allocate_handle();
        queue.queue[slot_idx] = Some(PathQuery { reference, task });
        reference
    }

    #[tokio::test]
    async fn test_request_and_take() {
        let mut queue = PathQueue::new(line_graph(3));

        let reference = queue.request(Vec2::ZERO, Vec2::new(2.0, 0.0)).unwrap();
        assert_ne!(reference, PATHQ_INVALID);

        assert_eq!(queue.wait(reference).await.unwrap(), Status::Success);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.take_path(reference).unwrap(), vec![Vec2::new(1.0, 0.0)]);
        assert!(queue.is_empty());
        assert_eq!(queue.request_status(reference), Status::NotFound);
        assert!(matches!(queue.take_path(reference), Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_queue_full() {
        let config = PathQueueConfig::default().with_max_requests(2);
        let mut queue = PathQueue::with_config(line_graph(4), config).unwrap();

        let first = queue.request(Vec2::ZERO, Vec2::new(3.0, 0.0)).unwrap();
        let second = queue.request(Vec2::ZERO, Vec2::new(2.0, 0.0)).unwrap();
        assert_ne!(first, second);
        assert!(matches!(
            queue.request(Vec2::ZERO, Vec2::ONE),
            Err(Error::QueueFull)
        ));

        queue.wait(first).await.unwrap();
        queue.take_path(first).unwrap();
        assert!(queue.request(Vec2::ZERO, Vec2::ONE).is_ok());
        assert_eq!(queue.capacity(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_goal_status() {
        let mut graph = NavGraph::new();
        graph.add_node(0.0, 0.0, 0);
        graph.add_node(5.0, 0.0, 0);
        let mut queue = PathQueue::new(Arc::new(graph));

        let reference = queue.request(Vec2::ZERO, Vec2::new(5.0, 0.0)).unwrap();
        assert_eq!(queue.wait(reference).await.unwrap(), Status::PathInvalid);
        assert!(queue.take_path(reference).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_long_path_truncated() {
        let config = PathQueueConfig::default().with_max_path_size(3);
        let mut queue = PathQueue::with_config(line_graph(10), config).unwrap();

        let reference = queue.request(Vec2::ZERO, Vec2::new(9.0, 0.0)).unwrap();
        assert_eq!(queue.wait(reference).await.unwrap(), Status::PartialResult);

        let path = queue.take_path(reference).unwrap();
        assert_eq!(
            path,
            vec![Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_many_requests_same_graph() {
        let config = PathQueueConfig::default()
            .with_max_requests(6)
            .with_search(SearchConfig::default().with_slice_iterations(4));
        let mut queue = PathQueue::with_config(line_graph(40), config).unwrap();

        let references: Vec<_> = (0..6)
            .map(|i| {
                queue
                    .request(Vec2::ZERO, Vec2::new(10.0 + i as f32, 0.0))
                    .unwrap()
            })
            .collect();

        for (i, &reference) in references.iter().enumerate() {
            assert_eq!(queue.wait(reference).await.unwrap(), Status::Success);
            assert_eq!(queue.take_path(reference).unwrap().len(), 9 + i);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PathQueueConfig::default().with_max_requests(0);
        assert!(PathQueue::with_config(line_graph(2), config).is_err());
    }

    #[test]
    fn test_unknown_reference() {
        let queue = PathQueue::new(line_graph(2));
        assert_eq!(queue.request_status(PATHQ_INVALID), Status::NotFound);
        assert_eq!(queue.request_status(77), Status::NotFound);
    }

    #[tokio::test]
    async fn test_failed_request_frees_slot() {
        let config = PathQueueConfig::default().with_max_requests(1);
        let graph = line_graph(3);
        let mut queue = PathQueue::with_config(Arc::clone(&graph), config).unwrap();

        let task = PathTask::new(graph, Vec2::ZERO, Vec2::new(2.0, 0.0));
        task.run_inline_panicking("corrupt adjacency");
        let failed = insert_task(&mut queue, task);

        assert_eq!(queue.request_status(failed), Status::Failure);
        assert_eq!(queue.wait(failed).await.unwrap(), Status::Failure);
        assert_eq!(queue.pending_count(), 0);
        assert!(matches!(
            queue.request(Vec2::ZERO, Vec2::ONE),
            Err(Error::QueueFull)
        ));

        assert!(matches!(queue.take_path(failed), Err(Error::Pathfinding(_))));
        assert!(queue.is_empty());
        assert_eq!(queue.request_status(failed), Status::NotFound);
        assert!(matches!(queue.take_path(failed), Err(Error::NotFound)));

        let reference = queue.request(Vec2::ZERO, Vec2::new(2.0, 0.0)).unwrap();
        assert_ne!(reference, failed);
        assert_eq!(queue.wait(reference).await.unwrap(), Status::Success);
        assert_eq!(queue.take_path(reference).unwrap(), vec![Vec2::new(1.0, 0.0)]);
    }

    #[test]
    fn test_running_request_keeps_slot() {
        let graph = line_graph(3);
        let mut queue = PathQueue::new(Arc::clone(&graph));

        let task = PathTask::new(graph, Vec2::ZERO, Vec2::new(2.0, 0.0));
        task.mark_started();
        let reference = insert_task(&mut queue, task);

        assert_eq!(queue.request_status(reference), Status::InProgress);
        assert_eq!(queue.pending_count(), 1);
        assert!(matches!(queue.take_path(reference), Err(Error::NotReady)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.request_status(reference), Status::InProgress);

        queue.find(reference).unwrap().task.run_inline();

        assert_eq!(queue.request_status(reference), Status::Success);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.take_path(reference).unwrap(), vec![Vec2::new(1.0, 0.0)]);
        assert!(queue.is_empty());
    }
}
