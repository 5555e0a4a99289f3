// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dutch_auction_domain::BidRecord;

/// Poll granularity of the timed [`BidQueue::get`].
const GET_POLL: Duration = Duration::from_millis(10);

/// The inbound concurrent FIFO of bid records.
///
/// The external bid-submission channel pushes records in delivery order;
/// the ingestion worker drains them in the same order. Emptiness checks are
/// non-blocking so both the worker and the phase driver can poll without
/// contending for long.
#[derive(Debug, Default)]
pub struct BidQueue {
    inner: Mutex<VecDeque<BidRecord>>,
}

impl BidQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a record at the tail.
    pub fn put(&self, bid: BidRecord) {
        self.lock().push_back(bid);
    }

    /// Dequeues the head record, if any. Non-blocking.
    #[must_use]
    pub fn try_get(&self) -> Option<BidRecord> {
        self.lock().pop_front()
    }

    /// Dequeues the head record, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` if the queue stays empty for the whole window.
    pub async fn get(&self, timeout: Duration) -> Option<BidRecord> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(bid) = self.try_get() {
                return Some(bid);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(GET_POLL).await;
        }
    }

    /// Whether the queue is empty at this moment. Non-blocking.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of queued records at this moment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<BidRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(bidder_id: &str, amount: f64) -> BidRecord {
        BidRecord::new(bidder_id.to_string(), amount, String::from("t1"))
    }

    #[test]
    fn test_fifo_order() {
        let queue: BidQueue = BidQueue::new();
        queue.put(bid("a", 440_000.0));
        queue.put(bid("b", 440_050.0));
        queue.put(bid("a", -1.0));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_get().map(|b| b.bidder_id).as_deref(), Some("a"));
        assert_eq!(queue.try_get().map(|b| b.bidder_id).as_deref(), Some("b"));
        assert!(queue.try_get().is_some_and(|b| b.is_cancellation()));
        assert!(queue.try_get().is_none());
    }

    #[test]
    fn test_is_empty_reflects_contents() {
        let queue: BidQueue = BidQueue::new();
        assert!(queue.is_empty());

        queue.put(bid("a", 440_000.0));
        assert!(!queue.is_empty());

        let _ = queue.try_get();
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_get_returns_queued_record() {
        let queue: BidQueue = BidQueue::new();
        queue.put(bid("a", 440_000.0));

        let record = queue.get(Duration::from_secs(1)).await;

        assert_eq!(record.map(|b| b.bidder_id).as_deref(), Some("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_get_times_out_on_empty_queue() {
        let queue: BidQueue = BidQueue::new();

        let record = queue.get(Duration::from_millis(50)).await;

        assert!(record.is_none());
        assert!(queue.is_empty());
    }
}
