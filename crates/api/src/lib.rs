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
#![allow(clippy::multiple_crate_versions)]

//! The result-publication boundary.
//!
//! After the auction reaches its terminal state, the worker merges the
//! document's results into the upstream tender bid records and pushes the
//! merged payload back to the procurement platform.

mod client;
mod error;

pub use client::ResultsClient;
pub use error::ApiError;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dutch_auction_domain::{AuctionDocument, TenderSnapshot, TenderValue};

/// The upstream tender record, as retrieved from the procurement platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderData {
    /// The wrapped payload.
    pub data: TenderPayload,
}

/// The tender payload body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderPayload {
    /// The tender identifier.
    pub id: String,
    /// Tender title.
    pub title: String,
    /// Russian title, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_ru: Option<String>,
    /// Ukrainian title, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_uk: Option<String>,
    /// Tender description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The lot value.
    pub value: TenderValue,
    /// The registered bids.
    #[serde(default)]
    pub bids: Vec<TenderBid>,
}

/// One upstream bid record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderBid {
    /// The bid (and bidder) identifier used throughout the auction.
    pub id: String,
    /// Submission date of the upstream record; overwritten with the
    /// auction result time for participating bidders.
    pub date: String,
    /// The bid value; overwritten with the auction result amount for
    /// participating bidders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<TenderValue>,
    /// The tendering organizations behind the bid. Opaque to the worker.
    #[serde(default)]
    pub tenderers: Value,
}

impl TenderData {
    /// The metadata copied into the auction document at setup.
    #[must_use]
    pub fn snapshot(&self) -> TenderSnapshot {
        TenderSnapshot {
            tender_id: self.data.id.clone(),
            title: self.data.title.clone(),
            title_ru: self.data.title_ru.clone(),
            title_uk: self.data.title_uk.clone(),
            description: self.data.description.clone(),
            value: self.data.value.clone(),
        }
    }

    /// The bidder-id to anonymized-display-name mapping, by registration
    /// order.
    #[must_use]
    pub fn bidder_mapping(&self) -> HashMap<String, String> {
        self.data
            .bids
            .iter()
            .enumerate()
            .map(|(index, bid)| (bid.id.clone(), (index + 1).to_string()))
            .collect()
    }
}

/// Merges per-bidder amount/time/currency overrides from the document's
/// results into the matching upstream bid records.
///
/// Bids without a matching result entry are left untouched.
pub fn merge_results(tender: &mut TenderData, document: &AuctionDocument) {
    for bid in &mut tender.data.bids {
        if let Some(entry) = document
            .results
            .iter()
            .find(|entry| entry.bidder_id == bid.id)
        {
            bid.value = Some(TenderValue {
                amount: entry.amount,
                currency: document.value.currency.clone(),
                value_added_tax_included: document.value.value_added_tax_included,
            });
            bid.date = entry.time.clone();
        }
    }
}

/// The per-bidder announcement: every upstream bid's tenderers, keyed by
/// bidder identifier.
#[must_use]
pub fn announce_results(tender: &TenderData) -> HashMap<String, Value> {
    tender
        .data
        .bids
        .iter()
        .map(|bid| (bid.id.clone(), bid.tenderers.clone()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dutch_auction_domain::{AuctionPhase, ResultEntry};
    use serde_json::json;

    fn test_tender() -> TenderData {
        serde_json::from_value(json!({
            "data": {
                "id": "UA-11111",
                "title": "Tender Title",
                "value": {
                    "amount": 500000.0,
                    "currency": "UAH",
                    "valueAddedTaxIncluded": true
                },
                "bids": [
                    {
                        "id": "c26d9eed99624c338ce0fca58a0aac32",
                        "date": "2014-11-19T08:22:21.726234+00:00",
                        "value": {
                            "amount": 0.0,
                            "valueAddedTaxIncluded": true
                        },
                        "tenderers": [{"name": "First Tenderer"}]
                    },
                    {
                        "id": "e4456d02263441ffb2f00ceafa661bb2",
                        "date": "2014-11-19T08:22:24.038426+00:00",
                        "value": {
                            "amount": 0.0,
                            "valueAddedTaxIncluded": true
                        },
                        "tenderers": [{"name": "Second Tenderer"}]
                    }
                ]
            }
        }))
        .unwrap()
    }

    fn test_document() -> AuctionDocument {
        let tender = test_tender();
        AuctionDocument {
            auction_id: String::from("UA-11111"),
            title: tender.data.title.clone(),
            title_ru: None,
            title_uk: None,
            description: None,
            initial_value: 500_000.0,
            value: tender.data.value.clone(),
            current_stage: 0,
            current_phase: AuctionPhase::End,
            stages: Vec::new(),
            results: vec![ResultEntry::new(
                String::from("e4456d02263441ffb2f00ceafa661bb2"),
                "2",
                475_000.0,
                String::from("2014-11-19T12:00:00+00:00"),
                false,
                true,
            )],
        }
    }

    #[test]
    fn test_merge_overrides_matching_bid_only() {
        let mut tender = test_tender();
        let document = test_document();

        merge_results(&mut tender, &document);

        let untouched = &tender.data.bids[0];
        assert_eq!(untouched.date, "2014-11-19T08:22:21.726234+00:00");
        assert!((untouched.value.as_ref().unwrap().amount - 0.0).abs() < f64::EPSILON);

        let merged = &tender.data.bids[1];
        assert_eq!(merged.date, "2014-11-19T12:00:00+00:00");
        let value = merged.value.as_ref().unwrap();
        assert!((value.amount - 475_000.0).abs() < f64::EPSILON);
        assert_eq!(value.currency.as_deref(), Some("UAH"));
        assert!(value.value_added_tax_included);
    }

    #[test]
    fn test_announce_covers_every_upstream_bid() {
        let tender = test_tender();

        let announced = announce_results(&tender);

        assert_eq!(announced.len(), 2);
        assert_eq!(
            announced["c26d9eed99624c338ce0fca58a0aac32"],
            json!([{"name": "First Tenderer"}])
        );
        assert_eq!(
            announced["e4456d02263441ffb2f00ceafa661bb2"],
            json!([{"name": "Second Tenderer"}])
        );
    }

    #[test]
    fn test_bidder_mapping_by_registration_order() {
        let tender = test_tender();

        let mapping = tender.bidder_mapping();

        assert_eq!(
            mapping.get("c26d9eed99624c338ce0fca58a0aac32").unwrap(),
            "1"
        );
        assert_eq!(
            mapping.get("e4456d02263441ffb2f00ceafa661bb2").unwrap(),
            "2"
        );
    }

    #[test]
    fn test_snapshot_copies_tender_metadata() {
        let tender = test_tender();

        let snapshot = tender.snapshot();

        assert_eq!(snapshot.tender_id, "UA-11111");
        assert_eq!(snapshot.title, "Tender Title");
        assert!((snapshot.value.amount - 500_000.0).abs() < f64::EPSILON);
    }
}
