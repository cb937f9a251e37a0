//! Async FIFO queue shared between producers and the windowed consumer
//!
//! Every operation takes the queue's lock once, so [`Queue::dequeue_all`]
//! removes exactly the items present at that instant. Nothing enqueued
//! concurrently can be split between two readers.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

/// FIFO queue with an atomic drain and inactivity-aware waiting
#[derive(Debug)]
pub struct Queue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }
}

impl<T> Queue<T> {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append items at the back and wake any waiters
    pub async fn enqueue(&self, items: impl IntoIterator<Item = T>) {
        let mut queue = self.items.lock().await;
        let before = queue.len();
        queue.extend(items);
        let added = queue.len() > before;
        drop(queue);

        if added {
            self.notify.notify_waiters();
        }
    }

    /// Remove the item at the front
    pub async fn dequeue(&self) -> Option<T> {
        self.items.lock().await.pop_front()
    }

    /// Remove every item currently in the queue in one step
    pub async fn dequeue_all(&self) -> Vec<T> {
        self.items.lock().await.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Wait until the queue has items
    ///
    /// Returns `false` if `max_inactivity` seconds pass with an empty queue.
    /// A negative, infinite or NaN `max_inactivity` waits indefinitely, as does
    /// one too large to represent as a deadline.
    pub async fn wait_for_input(&self, max_inactivity: f64) -> bool {
        let deadline = (max_inactivity >= 0.0)
            .then(|| Duration::try_from_secs_f64(max_inactivity).ok())
            .flatten()
            .and_then(|timeout| Instant::now().checked_add(timeout));

        loop {
            // Registered before the check so an enqueue in between is not missed
            let notified = self.notify.notified();
            if !self.is_empty().await {
                return true;
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return !self.is_empty().await;
                    }
                }
                None => notified.await,
            }
        }
    }
}

impl<T: Clone> Queue<T> {
    /// Copy of the front item
    pub async fn head(&self) -> Option<T> {
        self.items.lock().await.front().cloned()
    }

    /// Copy of the back item
    pub async fn tail(&self) -> Option<T> {
        self.items.lock().await.back().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = Queue::new();
        queue.enqueue([1, 2, 3]).await;

        assert_eq!(queue.head().await, Some(1));
        assert_eq!(queue.tail().await, Some(3));
        assert_eq!(queue.dequeue().await, Some(1));
        assert_eq!(queue.dequeue_all().await, vec![2, 3]);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_wait_for_input_ready() {
        let queue = Queue::new();
        queue.enqueue(["tweet"]).await;
        assert!(queue.wait_for_input(0.0).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_input_times_out() {
        let queue: Queue<u32> = Queue::new();
        assert!(!queue.wait_for_input(5.0).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_input_wakes_on_enqueue() {
        let queue: Arc<Queue<u32>> = Arc::new(Queue::new());
        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            producer.enqueue([7]).await;
        });

        assert!(queue.wait_for_input(10.0).await);
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_inactivity_waits() {
        let queue: Arc<Queue<u32>> = Arc::new(Queue::new());
        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            producer.enqueue([1]).await;
        });

        assert!(queue.wait_for_input(-1.0).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_infinite_inactivity_waits() {
        let queue: Arc<Queue<u32>> = Arc::new(Queue::new());
        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7200)).await;
            producer.enqueue([1]).await;
        });

        assert!(queue.wait_for_input(f64::INFINITY).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_inactivity_waits() {
        let queue: Arc<Queue<u32>> = Arc::new(Queue::new());
        let producer = Arc::clone(&queue);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            producer.enqueue([1]).await;
        });

        assert!(queue.wait_for_input(1e30).await);
    }
}
