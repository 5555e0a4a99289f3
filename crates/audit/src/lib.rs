// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

//! Audit trail for a single auction run.
//!
//! The audit report records, per phase, a start/end timeline and every bid
//! ever ingested in global arrival order. The per-phase bid sequence is
//! independent of any per-bidder grouping: interleaved arrival order is
//! preserved exactly, cancellation markers included.

use serde::{Deserialize, Serialize};

use dutch_auction_domain::{AuctionPhase, BidRecord};

/// Start and end stamps of one audited span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// When the span opened (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// When the span closed (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// The audit record of one auction phase.
///
/// `bids` is append-only while the phase is open and records every record
/// dequeued from the inbound channel during the phase, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    /// The phase's start/end stamps.
    pub timeline: Timeline,
    /// Every ingested bid, in global arrival order.
    pub bids: Vec<BidRecord>,
}

impl PhaseRecord {
    /// Creates an empty phase record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeline: Timeline {
                start: None,
                end: None,
            },
            bids: Vec::new(),
        }
    }

    /// Appends an ingested bid. Cancellation markers are recorded verbatim.
    pub fn record_bid(&mut self, bid: BidRecord) {
        self.bids.push(bid);
    }
}

/// Per-phase timelines of one auction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditTimeline {
    /// When the auction itself started (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_start: Option<String>,
    /// The dutch phase record.
    pub dutch: PhaseRecord,
    /// The sealed-bid phase record.
    pub sealedbid: PhaseRecord,
    /// The best-bid phase record.
    pub bestbid: PhaseRecord,
}

/// The complete audit report for one auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// The upstream tender identifier.
    pub id: String,
    /// The auction identifier.
    pub auction_id: String,
    /// The results-announcement span.
    pub results: Timeline,
    /// The per-phase records.
    pub timeline: AuditTimeline,
}

impl AuditReport {
    /// Creates the audit skeleton for a new auction: empty timelines for
    /// every phase, no bids.
    #[must_use]
    pub fn new(tender_id: String, auction_id: String) -> Self {
        Self {
            id: tender_id,
            auction_id,
            results: Timeline::default(),
            timeline: AuditTimeline::default(),
        }
    }

    /// The record of a bid-carrying phase, when the phase has one.
    ///
    /// Only the dutch, sealed-bid and best-bid phases are audited; the
    /// waiting phases return `None`.
    #[must_use]
    pub fn phase_record_mut(&mut self, phase: AuctionPhase) -> Option<&mut PhaseRecord> {
        match phase {
            AuctionPhase::Dutch => Some(&mut self.timeline.dutch),
            AuctionPhase::SealedBid => Some(&mut self.timeline.sealedbid),
            AuctionPhase::BestBid => Some(&mut self.timeline.bestbid),
            AuctionPhase::PreBestBid | AuctionPhase::Announcement | AuctionPhase::End => None,
        }
    }
}
