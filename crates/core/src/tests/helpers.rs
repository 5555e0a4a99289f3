// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use time::macros::datetime;

use dutch_auction_audit::AuditReport;
use dutch_auction_domain::{
    AuctionDocument, BidRecord, ScheduleConfig, TenderSnapshot, TenderValue,
};
use dutch_auction_persistence::{DocumentStore, InMemoryStore, StoreError};

use crate::PhaseController;

pub const AUCTION_ID: &str = "UA-11111";

/// A store double that counts load/save traffic.
pub struct CountingStore {
    inner: InMemoryStore,
    gets: AtomicUsize,
    saves: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            gets: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    /// Stores a document without counting it as engine traffic.
    pub async fn seed(&self, auction_id: &str, document: &AuctionDocument) {
        self.inner
            .save_document(auction_id, document)
            .await
            .expect("seed save failed");
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl DocumentStore for CountingStore {
    async fn get_document(&self, auction_id: &str) -> Result<AuctionDocument, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_document(auction_id).await
    }

    async fn save_document(
        &self,
        auction_id: &str,
        document: &AuctionDocument,
    ) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_document(auction_id, document).await
    }
}

pub fn create_test_tender() -> TenderSnapshot {
    TenderSnapshot {
        tender_id: String::from(AUCTION_ID),
        title: String::from("Tender Title"),
        title_ru: None,
        title_uk: None,
        description: Some(String::from("Tender Description")),
        value: TenderValue {
            amount: 500_000.0,
            currency: Some(String::from("UAH")),
            value_added_tax_included: true,
        },
    }
}

/// A fast-forward document: 10 dutch rounds, sealed-bid stage at index 11.
pub fn create_test_document() -> AuctionDocument {
    AuctionDocument::prepare(
        String::from(AUCTION_ID),
        &create_test_tender(),
        datetime!(2017-11-06 12:00 UTC),
        &ScheduleConfig::fast_forward(),
    )
    .expect("test document setup failed")
}

pub fn create_test_audit() -> AuditReport {
    AuditReport::new(String::from(AUCTION_ID), String::from(AUCTION_ID))
}

pub fn create_test_mapping() -> HashMap<String, String> {
    HashMap::from([
        (
            String::from("test_bidder_id"),
            String::from("bidder_name_from_mapping"),
        ),
        (
            String::from("test_bidder_id_2"),
            String::from("bidder_name_from_mapping_2"),
        ),
        (
            String::from("test_bidder_id_3"),
            String::from("bidder_name_from_mapping_3"),
        ),
    ])
}

/// A controller over a counting store seeded with `document`.
pub async fn create_controller(document: &AuctionDocument) -> PhaseController<CountingStore> {
    let store: CountingStore = CountingStore::new();
    store.seed(AUCTION_ID, document).await;
    PhaseController::new(
        store,
        String::from(AUCTION_ID),
        create_test_audit(),
        create_test_mapping(),
    )
}

pub fn bid(bidder_id: &str, amount: f64, time: &str) -> BidRecord {
    BidRecord::new(bidder_id.to_string(), amount, time.to_string())
}
