// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the job queue

use cardscan_worker::queue::WorkQueue;
use cardscan_worker::{ExecutionContext, JobKind, JobQueue};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_concurrent_producers_lose_nothing() {
    let queue = Arc::new(WorkQueue::new());
    let barrier = Arc::new(Barrier::new(4));

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..250 {
                    assert!(queue.enqueue(p * 1000 + i).is_some());
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(queue.len(), 1000);
    let mut drained: Vec<i32> = (0..1000).filter_map(|_| queue.dequeue_blocking()).collect();
    drained.sort_unstable();
    drained.dedup();
    assert_eq!(drained.len(), 1000);
    assert!(queue.is_empty());
}

#[test]
fn test_each_producer_sees_its_own_jobs_newest_first() {
    let queue = WorkQueue::new();
    for i in 0..10 {
        queue.enqueue(i);
    }
    let drained: Vec<i32> = (0..10).filter_map(|_| queue.dequeue_blocking()).collect();
    assert!(drained.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn test_warm_up_skipped_when_work_is_waiting() {
    let queue = JobQueue::new();
    assert!(queue.warm_up(ExecutionContext::empty()));
    assert!(!queue.warm_up(ExecutionContext::empty()));

    let job = queue.dequeue_blocking().unwrap();
    assert_eq!(job.kind(), JobKind::WarmUp);
    assert!(queue.is_empty());

    // idle again, so the next warm-up goes in
    assert!(queue.warm_up(ExecutionContext::empty()));
}

#[test]
fn test_warm_up_refused_after_close() {
    let queue = JobQueue::new();
    queue.close();
    assert!(!queue.warm_up(ExecutionContext::empty()));
}
