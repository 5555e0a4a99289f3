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

mod amounts;
mod bid;
mod document;
mod error;
mod label;
mod phase;
mod schedule;

pub use amounts::next_dutch_amount;
pub use bid::{BidRecord, CANCELLATION_AMOUNT};
pub use document::{AuctionDocument, ResultEntry, Stage, StageKind, TenderSnapshot, TenderValue};
pub use error::DomainError;
pub use label::LocalizedLabel;
pub use phase::AuctionPhase;
pub use schedule::{
    BESTBID_DURATION, END_PHASE_PAUSE, FIRST_PAUSE, SEALEDBID_DURATION, ScheduleConfig,
    build_stage_timeline,
};
