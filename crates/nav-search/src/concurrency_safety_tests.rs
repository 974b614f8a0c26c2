//! Concurrency safety tests for searches sharing one graph
//!
//! The graph is read-only during a search, so many searches may run over it
//! from different threads at once, each owning its own session state.

use crate::{AStarSearch, NavGraph, NodeRef, PathTask};
use glam::Vec2;
use nav_common::Result;
use std::sync::Arc;
use std::thread;

/// Builds a `size` x `size` 8-connected grid with a wall down the middle
fn create_walled_grid(size: u32) -> Result<NavGraph> {
    let mut graph = NavGraph::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            graph.add_node(x as f32, y as f32, 0);
        }
    }

    let wall_x = size / 2;
    let open = |x: u32, y: u32| x != wall_x || y == 0;
    let id = |x: u32, y: u32| NodeRef::new(y * size + x);

    for y in 0..size {
        for x in 0..size {
            if !open(x, y) {
                continue;
            }
            for (dx, dy, cost) in [(1, 0, 1.0), (0, 1, 1.0), (1, 1, std::f32::consts::SQRT_2)] {
                let (nx, ny) = (x + dx, y + dy);
                if nx < size && ny < size && open(nx, ny) {
                    graph.add_bidirectional_edge(id(x, y), id(nx, ny), cost)?;
                }
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod concurrent_read_tests {
    use super::*;

    #[test]
    fn test_concurrent_searches_on_threads() -> Result<()> {
        let graph = Arc::new(create_walled_grid(24)?);
        let start = Vec2::new(0.0, 23.0);
        let goal = Vec2::new(23.0, 23.0);

        let mut reference = AStarSearch::new(&graph, start, goal);
        reference.run()?;
        let expected_path = reference.reconstruct_path()?;
        let expected_cost = reference.goal_cost();
        assert!(!expected_path.is_empty());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let graph = Arc::clone(&graph);
                thread::spawn(move || -> Result<(Vec<Vec2>, Option<f32>)> {
                    let mut search = AStarSearch::new(&graph, start, goal);
                    search.run()?;
                    Ok((search.reconstruct_path()?, search.goal_cost()))
                })
            })
            .collect();

        for handle in handles {
            let (path, cost) = handle
                .join()
                .expect("Thread panicked")
                .expect("Search failed");
            assert_eq!(path, expected_path);
            assert_eq!(cost, expected_cost);
        }

        Ok(())
    }

    #[test]
    fn test_concurrent_mixed_queries() -> Result<()> {
        let graph = Arc::new(create_walled_grid(16)?);
        let num_threads = 6;

        let handles: Vec<_> = (0..num_threads)
            .map(|thread_id| {
                let graph = Arc::clone(&graph);
                thread::spawn(move || -> Result<()> {
                    for i in 0..20 {
                        let start = Vec2::new((thread_id % 8) as f32, (i % 16) as f32);
                        let goal = Vec2::new(15.0 - (i % 7) as f32, 15.0 - thread_id as f32);

                        let mut search = AStarSearch::new(&graph, start, goal);
                        search.run()?;

                        // Every open cell reaches the gap at y = 0
                        let nodes = search.reconstruct_node_path()?;
                        assert_eq!(nodes.first().copied(), search.start());
                        assert_eq!(nodes.last().copied(), search.goal());
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle
                .join()
                .expect("Thread panicked")
                .expect("Search failed");
        }

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_background_tasks_match_inline_search() -> Result<()> {
        let graph = Arc::new(create_walled_grid(20)?);

        let queries: Vec<_> = (0..10)
            .map(|i| (Vec2::new(0.0, i as f32), Vec2::new(19.0, 19.0 - i as f32)))
            .collect();

        let tasks = queries
            .iter()
            .map(|&(start, goal)| PathTask::spawn(Arc::clone(&graph), start, goal))
            .collect::<Result<Vec<_>>>()?;

        for (task, &(start, goal)) in tasks.iter().zip(&queries) {
            task.wait_until_done().await?;

            let mut inline = AStarSearch::new(&graph, start, goal);
            inline.run()?;

            assert_eq!(task.path()?, inline.reconstruct_path()?);
            assert_eq!(task.outcome()?.goal_cost, inline.goal_cost());
        }

        Ok(())
    }
}
