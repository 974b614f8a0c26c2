//! Priority frontier for the A* search

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::NodeRef;

/// Heap entry for the frontier
#[derive(Debug, Clone, Copy)]
struct HeapNode {
    /// Queued node
    node: NodeRef,
    /// Estimated total cost (f value)
    priority: f32,
    /// Insertion sequence, breaks ties and identifies the live entry
    seq: u64,
}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapNode {}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap pops the lowest priority first,
        // NaN sorts after every finite value
        let by_priority = match other.priority.partial_cmp(&self.priority) {
            Some(ordering) => ordering,
            None => {
                if other.priority.is_nan() && !self.priority.is_nan() {
                    Ordering::Greater
                } else if !other.priority.is_nan() && self.priority.is_nan() {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            }
        };

        // Earlier insertions win ties
        by_priority.then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority queue of graph nodes with decrease-key via re-enqueue
///
/// Updating a queued node pushes a fresh entry and marks it as the node's
/// live entry. Superseded entries stay in the heap and are dropped when
/// they surface, so a node is never returned twice for one enqueue.
#[derive(Debug, Default)]
pub struct NodeQueue {
    heap: BinaryHeap<HeapNode>,
    /// Sequence number of each node's live entry
    live: HashMap<NodeRef, u64>,
    next_seq: u64,
}

impl NodeQueue {
    /// Creates a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `node`, or replaces its priority if it is already queued
    pub fn insert_or_update(&mut self, node: NodeRef, priority: f32) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.live.insert(node, seq);
        self.heap.push(HeapNode {
            node,
            priority,
            seq,
        });
    }

    /// Removes and returns the node with the lowest priority
    pub fn pop_min(&mut self) -> Option<NodeRef> {
        while let Some(entry) = self.heap.pop() {
            if self.live.get(&entry.node) == Some(&entry.seq) {
                self.live.remove(&entry.node);
                return Some(entry.node);
            }
        }
        None
    }

    /// Checks if the queue has no live entries
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of queued nodes, not counting superseded entries
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Clears the queue
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
        self.next_seq = 0;
    }
}
