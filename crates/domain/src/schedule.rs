// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Stage timeline construction.
//!
//! The timeline is computed exactly once at auction setup and is pure:
//! the same start time and configuration always produce the same stage
//! list, with dutch round starts exact to the microsecond.
//!
//! ## Layout
//!
//! For a configuration of `R` dutch rounds the timeline has `R + 6` stages:
//!
//! - one leading pause at the auction start,
//! - `R` evenly-spaced dutch rounds, the first beginning after
//!   [`FIRST_PAUSE`],
//! - the sealed-bid stage, one round step after the last dutch round,
//! - the closing block: pause, best-bid, pause, announcement.

use time::{Duration, OffsetDateTime};

use crate::document::{Stage, StageKind};
use crate::error::DomainError;

/// Pause between the auction start and the first dutch round.
pub const FIRST_PAUSE: Duration = Duration::seconds(20);

/// Length of the sealed-bid collection window.
pub const SEALEDBID_DURATION: Duration = Duration::minutes(10);

/// Length of the best-bid window.
pub const BESTBID_DURATION: Duration = Duration::minutes(5);

/// Pause separating the closing stages.
pub const END_PHASE_PAUSE: Duration = Duration::seconds(20);

/// Stage-scheduling parameters for the dutch phase.
///
/// The sealed-bid and best-bid windows have fixed durations; only the dutch
/// phase is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Number of descending-price rounds.
    pub dutch_rounds: u32,
    /// Total length of the dutch phase, divided evenly across rounds.
    pub dutch_duration: Duration,
}

impl ScheduleConfig {
    /// The production timeline: 80 rounds over six hours.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            dutch_rounds: 80,
            dutch_duration: Duration::hours(6),
        }
    }

    /// The accelerated timeline used for testing and rehearsal runs:
    /// 10 rounds over ten minutes.
    #[must_use]
    pub const fn fast_forward() -> Self {
        Self {
            dutch_rounds: 10,
            dutch_duration: Duration::minutes(10),
        }
    }

    /// The length of one dutch round.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidScheduleConfig`] if the round count is
    /// zero or the duration is not positive.
    pub fn round_step(&self) -> Result<Duration, DomainError> {
        if self.dutch_rounds == 0 {
            return Err(DomainError::InvalidScheduleConfig {
                reason: String::from("dutch round count must be positive"),
            });
        }
        if self.dutch_duration <= Duration::ZERO {
            return Err(DomainError::InvalidScheduleConfig {
                reason: String::from("dutch duration must be positive"),
            });
        }
        let rounds: i32 =
            i32::try_from(self.dutch_rounds).map_err(|_| DomainError::InvalidScheduleConfig {
                reason: format!("dutch round count {} is out of range", self.dutch_rounds),
            })?;
        Ok(self.dutch_duration / rounds)
    }
}

/// Builds the ordered stage list for an auction starting at `start`.
///
/// # Errors
///
/// Returns [`DomainError::InvalidScheduleConfig`] for a non-positive round
/// count or duration.
pub fn build_stage_timeline(
    start: OffsetDateTime,
    config: &ScheduleConfig,
) -> Result<Vec<Stage>, DomainError> {
    let step: Duration = config.round_step()?;
    let rounds: usize =
        usize::try_from(config.dutch_rounds).map_err(|_| DomainError::InvalidScheduleConfig {
            reason: format!("dutch round count {} is out of range", config.dutch_rounds),
        })?;

    let mut stages: Vec<Stage> = Vec::with_capacity(rounds + 6);
    stages.push(Stage::new(StageKind::Pause, start));

    // Dutch rounds are spaced by exactly one step, starting after the
    // leading pause.
    let mut cursor: OffsetDateTime = start + FIRST_PAUSE;
    for _ in 0..rounds {
        stages.push(Stage::new(StageKind::Dutch, cursor));
        cursor += step;
    }

    // The sealed-bid stage opens one full step after the last dutch round,
    // so the final round has the same length as every other.
    stages.push(Stage::new(StageKind::SealedBid, cursor));

    cursor += SEALEDBID_DURATION;
    stages.push(Stage::new(StageKind::Pause, cursor));

    cursor += END_PHASE_PAUSE;
    stages.push(Stage::new(StageKind::BestBid, cursor));

    cursor += BESTBID_DURATION;
    stages.push(Stage::new(StageKind::Pause, cursor));

    cursor += END_PHASE_PAUSE;
    stages.push(Stage::new(StageKind::Announcement, cursor));

    Ok(stages)
}
