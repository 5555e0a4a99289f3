// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dutch_auction_domain::{AuctionPhase, DomainError};
use dutch_auction_persistence::StoreError;

/// Errors that can occur while driving an auction.
///
/// Any error raised inside an active document-update scope aborts that
/// transition without persisting; the supervising process restarts the
/// worker, which resumes from the last persisted phase and stage.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A domain rule was violated.
    Domain(DomainError),
    /// The document store failed. Transient; retried by the supervisor.
    Store(StoreError),
    /// The document was accessed outside an active update scope.
    InactiveScope,
    /// The stage pointer would leave the scheduled timeline.
    StageOutOfRange {
        /// The out-of-range index.
        index: usize,
    },
    /// An operation was invoked in the wrong lifecycle phase.
    UnexpectedPhase {
        /// The phase the operation requires.
        expected: AuctionPhase,
        /// The phase the document is in.
        actual: AuctionPhase,
    },
    /// The current stage carries no standing price to accept.
    NoStandingPrice,
    /// A dutch winner has already been approved for this auction.
    DutchWinnerAlreadySet,
    /// A run-time stamp could not be formatted.
    TimestampFormat(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(err) => write!(f, "Domain violation: {err}"),
            Self::Store(err) => write!(f, "Store failure: {err}"),
            Self::InactiveScope => {
                write!(f, "Document accessed outside an active update scope")
            }
            Self::StageOutOfRange { index } => {
                write!(f, "Stage index {index} is outside the scheduled timeline")
            }
            Self::UnexpectedPhase { expected, actual } => {
                write!(f, "Operation requires phase '{expected}' but auction is in '{actual}'")
            }
            Self::NoStandingPrice => {
                write!(f, "Current stage carries no standing price")
            }
            Self::DutchWinnerAlreadySet => {
                write!(f, "A dutch winner has already been approved")
            }
            Self::TimestampFormat(msg) => write!(f, "Failed to format run time: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
