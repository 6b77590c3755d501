//! Bounded newest-wins queue.
//!
//! Every stage boundary in the pipeline wants the same policy: bounded
//! capacity where a newer item displaces the oldest rather than blocking
//! the producer — stale frames and stale subtitles are worthless. Plain
//! mpsc channels cannot drop from the head, so this is a small mutex +
//! notify primitive with exactly the two operations the workers need.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// NewestWins
// ---------------------------------------------------------------------------

/// Bounded queue where a push over capacity evicts the oldest item.
pub struct NewestWins<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
    notify: Notify,
}

impl<T> NewestWins<T> {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be > 0");
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
            notify: Notify::new(),
        }
    }

    /// Push an item; returns `true` when an older item was evicted.
    pub fn push(&self, item: T) -> bool {
        let evicted = {
            let mut q = self.inner.lock().unwrap();
            let evicted = if q.len() >= self.capacity {
                q.pop_front();
                true
            } else {
                false
            };
            q.push_back(item);
            evicted
        };
        self.notify.notify_one();
        evicted
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().unwrap().pop_front()
    }

    /// Pop, waiting at most `timeout`. `None` on timeout — the caller
    /// re-checks the running flag and loops.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let wait = async {
            loop {
                if let Some(item) = self.try_pop() {
                    return item;
                }
                self.notify.notified().await;
            }
        };
        tokio::time::timeout(timeout, wait).await.ok()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn push_within_capacity_keeps_order() {
        let q = NewestWins::new(3);
        assert!(!q.push(1));
        assert!(!q.push(2));
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let q = NewestWins::new(2);
        q.push(1);
        q.push(2);
        assert!(q.push(3));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), Some(3));
    }

    #[test]
    fn capacity_one_always_newest() {
        let q = NewestWins::new(1);
        q.push("a");
        q.push("b");
        q.push("c");
        assert_eq!(q.len(), 1);
        assert_eq!(q.try_pop(), Some("c"));
    }

    #[tokio::test]
    async fn pop_timeout_returns_none_when_empty() {
        let q: NewestWins<u32> = NewestWins::new(4);
        assert_eq!(q.pop_timeout(Duration::from_millis(20)).await, None);
    }

    #[tokio::test]
    async fn pop_timeout_wakes_on_push() {
        let q = Arc::new(NewestWins::new(4));
        let q2 = Arc::clone(&q);
        let waiter = tokio::spawn(async move { q2.pop_timeout(Duration::from_secs(5)).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        q.push(42);
        assert_eq!(waiter.await.unwrap(), Some(42));
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        let _ = NewestWins::<u8>::new(0);
    }
}
