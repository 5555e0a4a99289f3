// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The shared auction document.
//!
//! The document is the single snapshot an external API layer exposes to
//! clients. It is created once at setup, then mutated only through the
//! engine's document-update scope for the auction's entire lifetime.
//!
//! ## Invariants
//!
//! - `stages` is ordered by ascending start time and append-only after setup
//! - `current_stage` only increases and always indexes a valid stage
//! - `results` grows only; at most one entry is flagged as dutch winner and
//!   at most one as sealed-bid winner

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::DomainError;
use crate::label::LocalizedLabel;
use crate::phase::AuctionPhase;
use crate::schedule::{ScheduleConfig, build_stage_timeline};

/// The kind of a scheduled stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// A waiting segment between active stages.
    Pause,
    /// One descending-price round.
    Dutch,
    /// The sealed-bid collection window.
    SealedBid,
    /// The best-bid window.
    BestBid,
    /// Result announcement.
    Announcement,
}

/// One scheduled, timestamped segment of the auction timeline.
///
/// Stages are immutable once scheduled except for the fields stamped when
/// the stage completes: the run time, and for the sealed-bid stage the
/// winner's amount, bidder and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// The stage kind.
    #[serde(rename = "type")]
    pub kind: StageKind,
    /// Scheduled start time.
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    /// Amount associated with the stage: the round price for a dutch stage,
    /// the winning amount once the sealed-bid stage completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// The winning bidder, stamped when the stage completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder_id: Option<String>,
    /// Localized label of the winning bidder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedLabel>,
    /// The run time stamped when the stage pointer advanced onto this stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Set on the stage carrying the sealed-bid winner fields.
    #[serde(default, skip_serializing_if = "is_false")]
    pub sealedbid_winner: bool,
}

impl Stage {
    /// Creates a scheduled stage with no completion fields.
    #[must_use]
    pub const fn new(kind: StageKind, start: OffsetDateTime) -> Self {
        Self {
            kind,
            start,
            amount: None,
            bidder_id: None,
            label: None,
            time: None,
            sealedbid_winner: false,
        }
    }
}

/// One published result line per participating bidder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// The bidder's identifier.
    pub bidder_id: String,
    /// The bidder's standing amount.
    pub amount: f64,
    /// Submission time of the standing amount (RFC 3339).
    pub time: String,
    /// The bidder's localized display label.
    pub label: LocalizedLabel,
    /// Set on the dutch-phase winner's entry. At most one entry carries it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub dutch_winner: bool,
    /// Set on the sealed-bid winner's entry. At most one entry carries it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub sealedbid_winner: bool,
}

impl ResultEntry {
    /// Packages a result entry with the label built from the bidder's
    /// display name.
    #[must_use]
    pub fn new(
        bidder_id: String,
        bidder_name: &str,
        amount: f64,
        time: String,
        dutch_winner: bool,
        sealedbid_winner: bool,
    ) -> Self {
        Self {
            bidder_id,
            amount,
            time,
            label: LocalizedLabel::for_bidder(bidder_name),
            dutch_winner,
            sealedbid_winner,
        }
    }
}

/// The monetary value of the procurement lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderValue {
    /// The announced amount.
    pub amount: f64,
    /// ISO 4217 currency code, when the upstream record carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Whether the amount includes VAT.
    #[serde(rename = "valueAddedTaxIncluded")]
    pub value_added_tax_included: bool,
}

/// Tender metadata copied verbatim into the document at setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderSnapshot {
    /// The upstream tender identifier.
    pub tender_id: String,
    /// Tender title.
    pub title: String,
    /// Russian title, when present upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_ru: Option<String>,
    /// Ukrainian title, when present upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_uk: Option<String>,
    /// Tender description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The lot value.
    pub value: TenderValue,
}

/// The mutable auction snapshot shared with the external API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionDocument {
    /// The auction identifier.
    pub auction_id: String,
    /// Tender title.
    pub title: String,
    /// Russian title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_ru: Option<String>,
    /// Ukrainian title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_uk: Option<String>,
    /// Tender description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The lot value at auction start; the dutch descent steps down from it.
    pub initial_value: f64,
    /// The lot value record.
    pub value: TenderValue,
    /// Index of the stage the auction is currently in. Monotonically
    /// non-decreasing.
    pub current_stage: usize,
    /// The current lifecycle phase.
    pub current_phase: AuctionPhase,
    /// The scheduled timeline. Append-only after setup.
    pub stages: Vec<Stage>,
    /// Published results. Grows only.
    pub results: Vec<ResultEntry>,
}

impl AuctionDocument {
    /// Builds the document for a new auction from tender metadata and the
    /// computed stage timeline.
    ///
    /// The stage pointer starts at the leading pause; the phase starts at
    /// `Dutch` so a restarted worker before the first round resumes
    /// correctly.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidScheduleConfig`] when the schedule
    /// configuration is rejected.
    pub fn prepare(
        auction_id: String,
        tender: &TenderSnapshot,
        start: OffsetDateTime,
        config: &ScheduleConfig,
    ) -> Result<Self, DomainError> {
        let stages: Vec<Stage> = build_stage_timeline(start, config)?;

        Ok(Self {
            auction_id,
            title: tender.title.clone(),
            title_ru: tender.title_ru.clone(),
            title_uk: tender.title_uk.clone(),
            description: tender.description.clone(),
            initial_value: tender.value.amount,
            value: tender.value.clone(),
            current_stage: 0,
            current_phase: AuctionPhase::Dutch,
            stages,
            results: Vec::new(),
        })
    }

    /// The stage the auction is currently in.
    #[must_use]
    pub fn current(&self) -> Option<&Stage> {
        self.stages.get(self.current_stage)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn test_tender() -> TenderSnapshot {
        TenderSnapshot {
            tender_id: String::from("UA-11111"),
            title: String::from("Tender Title"),
            title_ru: Some(String::from("Описание Тендера")),
            title_uk: None,
            description: Some(String::from("Tender Description")),
            value: TenderValue {
                amount: 500_000.0,
                currency: Some(String::from("UAH")),
                value_added_tax_included: true,
            },
        }
    }

    #[test]
    fn test_prepare_copies_tender_metadata() {
        let tender = test_tender();
        let document = AuctionDocument::prepare(
            String::from("UA-11111"),
            &tender,
            datetime!(2017-11-06 12:00 UTC),
            &ScheduleConfig::fast_forward(),
        )
        .unwrap();

        assert_eq!(document.title, "Tender Title");
        assert_eq!(document.title_ru.as_deref(), Some("Описание Тендера"));
        assert_eq!(document.description.as_deref(), Some("Tender Description"));
        assert!((document.initial_value - 500_000.0).abs() < f64::EPSILON);
        assert_eq!(document.current_stage, 0);
        assert_eq!(document.current_phase, AuctionPhase::Dutch);
        assert_eq!(document.stages.len(), 16);
        assert!(document.results.is_empty());
    }

    #[test]
    fn test_prepare_rejects_bad_config() {
        let tender = test_tender();
        let config = ScheduleConfig {
            dutch_rounds: 0,
            dutch_duration: time::Duration::hours(6),
        };

        let result = AuctionDocument::prepare(
            String::from("UA-11111"),
            &tender,
            datetime!(2017-11-06 12:00 UTC),
            &config,
        );

        assert!(matches!(
            result,
            Err(DomainError::InvalidScheduleConfig { .. })
        ));
    }

    #[test]
    fn test_stage_kind_wire_names() {
        let stage = Stage::new(StageKind::SealedBid, datetime!(2017-11-06 12:00 UTC));
        let json = serde_json::to_value(&stage).unwrap();

        assert_eq!(json["type"], "sealedbid");
        assert!(json.get("amount").is_none());
        assert!(json.get("sealedbid_winner").is_none());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let tender = test_tender();
        let mut document = AuctionDocument::prepare(
            String::from("UA-11111"),
            &tender,
            datetime!(2017-11-06 12:00 UTC),
            &ScheduleConfig::fast_forward(),
        )
        .unwrap();
        document.results.push(ResultEntry::new(
            String::from("bidder-1"),
            "1",
            450_000.0,
            String::from("2017-11-06T16:07:34.919011Z"),
            true,
            false,
        ));

        let encoded = serde_json::to_string(&document).unwrap();
        let decoded: AuctionDocument = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, document);
    }
}
