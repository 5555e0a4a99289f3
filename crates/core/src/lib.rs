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
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

//! The auction engine.
//!
//! One [`PhaseController`] drives a single auction through its lifecycle:
//! dutch rounds, the sealed-bid collection window, the best-bid window and
//! the final announcement. All document mutation goes through the
//! [`DocumentMutator`]'s load-once/save-once scope; all sealed-bid traffic
//! goes through the [`BidQueue`] and is drained by one [`BidIngestionWorker`]
//! task spawned for the duration of the window.

mod bids;
mod controller;
mod error;
mod ingest;
mod mutator;
mod queue;
mod resolver;
mod session;

#[cfg(test)]
mod tests;

pub use bids::BidHistories;
pub use controller::PhaseController;
pub use error::CoreError;
pub use ingest::{BidIngestionWorker, POLL_INTERVAL};
pub use mutator::DocumentMutator;
pub use queue::BidQueue;
pub use resolver::{SealedBidOutcome, dutch_winner, effective_bid, select_sealedbid_winner};
pub use session::SealedBidSession;
