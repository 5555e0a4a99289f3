// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};

/// The lifecycle phase of an auction.
///
/// Phases advance strictly forward:
/// `Dutch → SealedBid → PreBestBid → BestBid → Announcement → End`.
/// The phase stored on the auction document is the resume point after a
/// worker restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionPhase {
    /// Descending-price rounds.
    Dutch,
    /// Sealed-bid collection window.
    SealedBid,
    /// Sealed-bid winner determined, best-bid window not yet open.
    PreBestBid,
    /// Best-bid window: the dutch winner may overbid the sealed-bid winner.
    BestBid,
    /// Results announced.
    Announcement,
    /// Terminal state.
    End,
}

impl std::fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dutch => "dutch",
            Self::SealedBid => "sealedbid",
            Self::PreBestBid => "prebestbid",
            Self::BestBid => "bestbid",
            Self::Announcement => "announcement",
            Self::End => "end",
        };
        write!(f, "{name}")
    }
}
