// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dutch_auction_audit::AuditReport;
use dutch_auction_domain::{AuctionPhase, BidRecord};

use crate::bids::BidHistories;
use crate::queue::BidQueue;

/// Bounded sleep between dequeue attempts, and between drain polls in the
/// phase driver.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The single consumer of the inbound bid queue.
///
/// The worker runs for the duration of the sealed-bid window: running while
/// the end signal is unset, draining once it fires, done when the signal is
/// observed set and the queue is observed empty in the same iteration. Both
/// conditions are re-checked every iteration, so a record enqueued after
/// the signal but before the drain completes is still processed. Every
/// record removed from the queue is processed to completion before the next
/// dequeue; no record is ever dropped.
#[derive(Debug)]
pub struct BidIngestionWorker {
    queue: Arc<BidQueue>,
    end_signal: CancellationToken,
    histories: Arc<Mutex<BidHistories>>,
    audit: Arc<Mutex<AuditReport>>,
}

impl BidIngestionWorker {
    /// Creates a worker over the session's shared state.
    #[must_use]
    pub const fn new(
        queue: Arc<BidQueue>,
        end_signal: CancellationToken,
        histories: Arc<Mutex<BidHistories>>,
        audit: Arc<Mutex<AuditReport>>,
    ) -> Self {
        Self {
            queue,
            end_signal,
            histories,
            audit,
        }
    }

    /// The main loop; the long-running body of the spawned task.
    pub async fn run(self) {
        info!("Started bids worker");
        loop {
            if self.queue.is_empty() && self.end_signal.is_cancelled() {
                break;
            }
            if let Some(bid) = self.queue.try_get() {
                self.ingest(bid).await;
            }
            sleep(POLL_INTERVAL).await;
        }
        info!("Bids queue done. Breaking worker");
    }

    /// Records one dequeued bid.
    ///
    /// Cancellation markers are recorded as data, verbatim, in both the
    /// bidder's history and the audit trail; their interpretation is
    /// deferred to winner resolution.
    async fn ingest(&self, bid: BidRecord) {
        info!(
            "Adding bid {} with value {} on {}",
            bid.bidder_id, bid.amount, bid.time
        );
        if bid.is_cancellation() {
            if !self.histories.lock().await.has_prior_submission(&bid.bidder_id) {
                warn!(
                    "Cancellation from {} without a prior submission",
                    bid.bidder_id
                );
            }
            info!(
                "Bid {} marked for cancellation on {}",
                bid.bidder_id, bid.time
            );
        }

        self.histories.lock().await.append(bid.clone());
        let mut audit = self.audit.lock().await;
        if let Some(record) = audit.phase_record_mut(AuctionPhase::SealedBid) {
            record.record_bid(bid);
        }
    }
}
