// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::bids::BidHistories;
use crate::queue::BidQueue;

/// Shared sealed-bid state for one auction run.
///
/// The queue, end signal and histories are the only state shared between
/// the phase driver and the ingestion worker. The session is constructed at
/// auction setup and owned by the controller; nothing here is process-global,
/// so multiple auctions in one test process never interfere.
#[derive(Debug)]
pub struct SealedBidSession {
    queue: Arc<BidQueue>,
    end_signal: CancellationToken,
    histories: Arc<Mutex<BidHistories>>,
    bids_lock: Arc<Mutex<()>>,
}

impl SealedBidSession {
    /// Creates the session state for a new auction run.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Arc::new(BidQueue::new()),
            end_signal: CancellationToken::new(),
            histories: Arc::new(Mutex::new(BidHistories::new())),
            bids_lock: Arc::new(Mutex::new(())),
        }
    }

    /// A handle to the inbound queue. The external bid-submission channel
    /// pushes into this.
    #[must_use]
    pub fn queue(&self) -> Arc<BidQueue> {
        Arc::clone(&self.queue)
    }

    /// A handle to the one-shot phase-end signal. Clones observe the same
    /// signal.
    #[must_use]
    pub fn end_signal(&self) -> CancellationToken {
        self.end_signal.clone()
    }

    /// A handle to the per-bidder histories.
    #[must_use]
    pub fn histories(&self) -> Arc<Mutex<BidHistories>> {
        Arc::clone(&self.histories)
    }

    /// Replaces the end signal with a fresh one when the sealed-bid window
    /// opens. The signal is one-shot; a window never reuses a fired token.
    pub fn arm(&mut self) {
        self.end_signal = CancellationToken::new();
    }

    /// Acquires the bid-action lock for the duration of a phase switch.
    ///
    /// The submission channel takes the same lock before enqueueing, so no
    /// bid can race a phase transition.
    pub async fn lock_bids(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.bids_lock).lock_owned().await
    }
}

impl Default for SealedBidSession {
    fn default() -> Self {
        Self::new()
    }
}
