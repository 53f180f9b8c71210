//! Worklists for fixpoint-style algorithms.
//!
//! `FifoWorkList` and `PriorityWorkList` refuse an element that is already
//! queued; once dequeued it may be enqueued again. `UnorderedWorkList`
//! keeps every enqueue and makes no ordering promise beyond draining all of
//! them.

use core::hash::Hash;
use hashbrown::HashSet;
use std::collections::{BinaryHeap, VecDeque};

/// First-in first-out worklist without duplicates.
#[derive(Clone, Debug)]
pub struct FifoWorkList<T> {
    queue: VecDeque<T>,
    queued: HashSet<T>,
}

impl<T> FifoWorkList<T>
where
    T: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    /// Queues `elem` unless it is already queued.
    pub fn enqueue(&mut self, elem: T) -> bool {
        if self.queued.contains(&elem) {
            return false;
        }
        self.queued.insert(elem.clone());
        self.queue.push_back(elem);
        true
    }

    pub fn dequeue(&mut self) -> Option<T> {
        let elem = self.queue.pop_front()?;
        self.queued.remove(&elem);
        Some(elem)
    }

    pub fn front(&self) -> Option<&T> {
        self.queue.front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<T> Default for FifoWorkList<T>
where
    T: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for FifoWorkList<T>
where
    T: Hash + Eq + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elem in iter {
            self.enqueue(elem);
        }
    }
}

/// Worklist yielding the greatest queued element first, without duplicates.
///
/// Wrap elements in `core::cmp::Reverse` for smallest-first order.
#[derive(Clone, Debug)]
pub struct PriorityWorkList<T> {
    heap: BinaryHeap<T>,
    queued: HashSet<T>,
}

impl<T> PriorityWorkList<T>
where
    T: Ord + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            queued: HashSet::new(),
        }
    }

    pub fn enqueue(&mut self, elem: T) -> bool {
        if self.queued.contains(&elem) {
            return false;
        }
        self.queued.insert(elem.clone());
        self.heap.push(elem);
        true
    }

    pub fn dequeue(&mut self) -> Option<T> {
        let elem = self.heap.pop()?;
        self.queued.remove(&elem);
        Some(elem)
    }

    pub fn front(&self) -> Option<&T> {
        self.heap.peek()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

impl<T> Default for PriorityWorkList<T>
where
    T: Ord + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for PriorityWorkList<T>
where
    T: Ord + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for elem in iter {
            self.enqueue(elem);
        }
    }
}

/// Double-buffered worklist that accepts duplicates.
///
/// Enqueues go to a pending buffer; dequeues drain the current buffer and
/// swap the pending one in when it runs out.
#[derive(Clone, Debug)]
pub struct UnorderedWorkList<T> {
    // drained from the back; stored reversed
    current: Vec<T>,
    pending: Vec<T>,
}

impl<T> UnorderedWorkList<T> {
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Always queues `elem`; returns true.
    pub fn enqueue(&mut self, elem: T) -> bool {
        self.pending.push(elem);
        true
    }

    pub fn dequeue(&mut self) -> Option<T> {
        if self.current.is_empty() {
            core::mem::swap(&mut self.current, &mut self.pending);
            self.current.reverse();
        }
        self.current.pop()
    }

    pub fn front(&self) -> Option<&T> {
        self.current.last().or_else(|| self.pending.first())
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.pending.len()
    }
}

impl<T> Default for UnorderedWorkList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for UnorderedWorkList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}
