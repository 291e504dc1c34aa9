//! Bounded FIFO queue shared by producers and the worker
//!
//! Many producers enqueue concurrently; a single consumer removes items in
//! batches. The queue limit is enforced for [`OverflowAction::Discard`] and
//! [`OverflowAction::Block`] and advisory for [`OverflowAction::Grow`].

use super::overflow_action::OverflowAction;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Upper bound on the storage reserved up front
const INITIAL_CAPACITY_CAP: usize = 1024;

/// Result of [`BoundedQueue::enqueue`]
#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueOutcome<T> {
    /// Stored below the limit
    Enqueued,
    /// Stored past the limit under `Grow`
    Grew,
    /// Stored after waiting for space under `Block`
    EnqueuedAfterWait,
    /// Queue full under `Discard`; the item is handed back
    Discarded(T),
    /// Queue closed; the item is handed back
    Closed(T),
}

impl<T> EnqueueOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            EnqueueOutcome::Enqueued | EnqueueOutcome::Grew | EnqueueOutcome::EnqueuedAfterWait
        )
    }
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    /// Set by `wake_consumer`, cleared by `wait_for_items`
    wake_pending: bool,
}

pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    space_available: Condvar,
    items_available: Condvar,
    limit: usize,
    overflow_action: OverflowAction,
}

impl<T> BoundedQueue<T> {
    pub fn new(limit: usize, overflow_action: OverflowAction) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(limit.min(INITIAL_CAPACITY_CAP)),
                closed: false,
                wake_pending: false,
            }),
            space_available: Condvar::new(),
            items_available: Condvar::new(),
            limit,
            overflow_action,
        }
    }

    pub fn enqueue(&self, item: T) -> EnqueueOutcome<T> {
        self.push(item, true)
    }

    /// Like [`enqueue`](Self::enqueue), but a full queue under `Block` grows
    /// instead of waiting.
    ///
    /// For callers that are themselves the consumer: waiting for space they
    /// alone can free would never return.
    pub fn enqueue_without_waiting(&self, item: T) -> EnqueueOutcome<T> {
        self.push(item, false)
    }

    fn push(&self, item: T, may_wait: bool) -> EnqueueOutcome<T> {
        let mut state = self.state.lock();
        if state.closed {
            return EnqueueOutcome::Closed(item);
        }

        let outcome = if state.items.len() < self.limit {
            state.items.push_back(item);
            EnqueueOutcome::Enqueued
        } else {
            match self.overflow_action {
                OverflowAction::Grow => {
                    state.items.push_back(item);
                    EnqueueOutcome::Grew
                }
                OverflowAction::Discard => return EnqueueOutcome::Discarded(item),
                OverflowAction::Block if !may_wait => {
                    state.items.push_back(item);
                    EnqueueOutcome::Grew
                }
                OverflowAction::Block => {
                    while state.items.len() >= self.limit && !state.closed {
                        self.space_available.wait(&mut state);
                    }
                    if state.closed {
                        return EnqueueOutcome::Closed(item);
                    }
                    state.items.push_back(item);
                    EnqueueOutcome::EnqueuedAfterWait
                }
            }
        };

        drop(state);
        self.items_available.notify_one();
        outcome
    }

    /// Remove up to `max` items from the front, oldest first
    pub fn dequeue_batch(&self, max: usize) -> Vec<T> {
        let batch: Vec<T> = {
            let mut state = self.state.lock();
            let count = max.min(state.items.len());
            state.items.drain(..count).collect()
        };

        if !batch.is_empty() && self.overflow_action == OverflowAction::Block {
            self.space_available.notify_all();
        }
        batch
    }

    /// Park the consumer until an item is queued, the queue is closed,
    /// [`wake_consumer`](Self::wake_consumer) is called or `timeout` elapses.
    ///
    /// Returns `true` if items are waiting.
    pub fn wait_for_items(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.closed && !state.wake_pending {
            if self
                .items_available
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        state.wake_pending = false;
        !state.items.is_empty()
    }

    /// Cut the current or next [`wait_for_items`](Self::wait_for_items) short
    pub fn wake_consumer(&self) {
        self.state.lock().wake_pending = true;
        self.items_available.notify_all();
    }

    /// Reject further enqueues and release every blocked producer.
    ///
    /// Items already queued stay available to `dequeue_batch`.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.space_available.notify_all();
        self.items_available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn overflow_action(&self) -> OverflowAction {
        self.overflow_action
    }
}
