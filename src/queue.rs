// SPDX-License-Identifier: GPL-3.0-only

//! Monitor-guarded job stack shared by producers and the single consumer
//!
//! The newest submission is always served next. Nothing is ever dropped or
//! aged out, so a producer that outruns the consumer grows the backlog
//! without bound; [`WorkQueue::len`] is there so callers can watch it.

use crate::job::{ExecutionContext, Job};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Unbounded LIFO work queue
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
}

/// Queue of scan jobs
pub type JobQueue = WorkQueue<Job>;

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    // A panic while holding the lock cannot leave the deque half-mutated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push to the front and wake the consumer
    ///
    /// Returns the pending count including the new item, read under the
    /// same lock as the push, or `None` (dropping the item) once the queue
    /// is closed.
    pub fn enqueue(&self, item: T) -> Option<usize> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.items.push_front(item);
        self.not_empty.notify_one();
        Some(state.items.len())
    }

    /// Push the item built by `make` only if nothing is pending
    ///
    /// Returns whether an item was added.
    pub fn enqueue_if_empty(&self, make: impl FnOnce() -> T) -> bool {
        let mut state = self.lock();
        if state.closed || !state.items.is_empty() {
            return false;
        }
        state.items.push_front(make());
        self.not_empty.notify_one();
        true
    }

    /// Pop the front item, waiting while the queue is empty
    ///
    /// Returns `None` only after [`WorkQueue::close`].
    pub fn dequeue_blocking(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Stop accepting items and wake every waiter
    ///
    /// Returns what was still pending; those items are never served.
    pub fn close(&self) -> Vec<T> {
        let mut state = self.lock();
        state.closed = true;
        self.not_empty.notify_all();
        state.items.drain(..).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}

impl WorkQueue<Job> {
    /// Queue a warm-up sentinel if the queue is idle
    pub fn warm_up(&self, context: ExecutionContext) -> bool {
        self.enqueue_if_empty(|| Job::warm_up(context))
    }
}
