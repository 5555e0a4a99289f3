// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// Sentinel amount marking a bid record as a cancellation of the bidder's
/// prior submission.
pub const CANCELLATION_AMOUNT: f64 = -1.0;

/// A single bid as delivered on the inbound channel.
///
/// Records are immutable once ingested: a cancellation is an additional
/// record carrying [`CANCELLATION_AMOUNT`], never a deletion or rewrite of
/// an earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRecord {
    /// The submitting bidder's identifier.
    pub bidder_id: String,
    /// The bid amount, or [`CANCELLATION_AMOUNT`].
    pub amount: f64,
    /// Submission timestamp (RFC 3339).
    pub time: String,
    /// Set on the record seeded from the dutch phase acceptance. Such a
    /// record is carried context in the sealed-bid ledger, not a sealed-bid
    /// submission.
    #[serde(default, skip_serializing_if = "is_false")]
    pub dutch_winner: bool,
}

impl BidRecord {
    /// Creates a plain sealed-bid record.
    #[must_use]
    pub const fn new(bidder_id: String, amount: f64, time: String) -> Self {
        Self {
            bidder_id,
            amount,
            time,
            dutch_winner: false,
        }
    }

    /// Whether this record is a cancellation marker.
    ///
    /// The marker is the exact sentinel value, not a range check; any other
    /// negative amount is invalid input and is treated as a normal bid.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_cancellation(&self) -> bool {
        self.amount == CANCELLATION_AMOUNT
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_marker_is_exact() {
        let cancel: BidRecord = BidRecord::new(String::from("b-1"), -1.0, String::from("t1"));
        let bid: BidRecord = BidRecord::new(String::from("b-1"), 440000.0, String::from("t1"));

        assert!(cancel.is_cancellation());
        assert!(!bid.is_cancellation());
    }

    #[test]
    fn test_dutch_winner_flag_not_serialized_when_unset() {
        let bid: BidRecord = BidRecord::new(String::from("b-1"), 440000.0, String::from("t1"));
        let json = serde_json::to_value(&bid).unwrap();

        assert!(json.get("dutch_winner").is_none());
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut bid: BidRecord = BidRecord::new(String::from("b-1"), 450000.0, String::from("t3"));
        bid.dutch_winner = true;

        let encoded = serde_json::to_string(&bid).unwrap();
        let decoded: BidRecord = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, bid);
    }
}
