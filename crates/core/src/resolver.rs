// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Winner resolution.
//!
//! Selection is deterministic: the strictly greatest effective amount wins,
//! ties broken by the earlier submission time. Cancellation markers are
//! interpreted here and only here: a marker clears the bidder's standing
//! submission, and a bidder whose history ends on a marker is excluded from
//! consideration entirely.

use std::cmp::Ordering;

use dutch_auction_domain::{AuctionDocument, BidRecord, ResultEntry};

use crate::bids::BidHistories;

/// The sealed-bid selection outcome: the winner plus every other bidder
/// with an effective submission, ordered best-first.
#[derive(Debug, Clone, PartialEq)]
pub struct SealedBidOutcome {
    /// The winning record.
    pub winner: BidRecord,
    /// Non-winning participants, best-first.
    pub participants: Vec<BidRecord>,
}

/// The dutch-phase winner entry recorded on the document, if any.
///
/// An absent entry is not an error; it means the auction has no qualifying
/// dutch winner yet.
#[must_use]
pub fn dutch_winner(document: &AuctionDocument) -> Option<&ResultEntry> {
    document.results.iter().find(|entry| entry.dutch_winner)
}

/// The bidder's standing sealed-bid submission, if any.
///
/// The history is scanned in arrival order: a positive amount becomes the
/// candidate, a cancellation marker clears it. Records carried over from
/// the dutch phase are context, not sealed-bid submissions, and are
/// skipped.
#[must_use]
pub fn effective_bid(history: &[BidRecord]) -> Option<&BidRecord> {
    let mut candidate: Option<&BidRecord> = None;
    for record in history {
        if record.dutch_winner {
            continue;
        }
        if record.is_cancellation() {
            candidate = None;
        } else {
            candidate = Some(record);
        }
    }
    candidate
}

/// Selects the sealed-bid winner across all bidders.
///
/// Returns `None` when no bidder has an effective submission, which signals
/// the phase driver to end the auction immediately.
#[must_use]
pub fn select_sealedbid_winner(histories: &BidHistories) -> Option<SealedBidOutcome> {
    let mut effective: Vec<&BidRecord> = histories
        .iter()
        .filter_map(|(_, history)| effective_bid(history))
        .collect();
    if effective.is_empty() {
        return None;
    }

    // Greatest amount first; equal amounts resolved by the earlier
    // submission time.
    effective.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.time.cmp(&b.time))
    });

    let winner: BidRecord = effective[0].clone();
    let participants: Vec<BidRecord> = effective[1..].iter().map(|bid| (*bid).clone()).collect();
    Some(SealedBidOutcome {
        winner,
        participants,
    })
}
