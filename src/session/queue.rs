use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Payloads buffered per channel between the transport and its delivery task.
pub const INBOUND_CAPACITY: usize = 125;

/// Bounded FIFO that never blocks the producer.
///
/// When full, the oldest payload is discarded to make room and counted in
/// [`InboundQueue::dropped`].
pub struct InboundQueue {
    items: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl InboundQueue {
    pub fn new() -> Self {
        Self::with_capacity(INBOUND_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Vec<u8>>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, payload: Vec<u8>) {
        {
            let mut items = self.lock();
            if items.len() >= self.capacity {
                items.pop_front();
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(total, "inbound queue full, dropped oldest payload");
            }
            items.push_back(payload);
        }
        self.notify.notify_one();
    }

    pub fn try_pop(&self) -> Option<Vec<u8>> {
        self.lock().pop_front()
    }

    /// Wait for the next payload.
    pub async fn pop(&self) -> Vec<u8> {
        loop {
            if let Some(payload) = self.try_pop() {
                return payload;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = InboundQueue::new();
        queue.push(b"a".to_vec());
        queue.push(b"b".to_vec());
        assert_eq!(queue.try_pop(), Some(b"a".to_vec()));
        assert_eq!(queue.try_pop(), Some(b"b".to_vec()));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_drops_oldest_when_full() {
        let queue = InboundQueue::new();
        for i in 0..INBOUND_CAPACITY + 1 {
            queue.push(i.to_string().into_bytes());
        }
        assert_eq!(queue.len(), INBOUND_CAPACITY);
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.try_pop(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let queue = Arc::new(InboundQueue::with_capacity(4));
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::task::yield_now().await;
        queue.push(b"late".to_vec());
        assert_eq!(consumer.await.unwrap(), b"late".to_vec());
    }
}
