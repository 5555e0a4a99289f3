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

//! Document store for the auction worker.
//!
//! Each auction persists as a single versioned JSON record. The store is
//! deliberately narrow: fetch the latest snapshot, save a new one. All
//! load/save traffic goes through the engine's document-update scope; the
//! store itself enforces nothing about mutation ordering.

mod error;
mod sqlite;

pub use error::StoreError;
pub use sqlite::SqliteStore;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dutch_auction_domain::AuctionDocument;

/// The persistence seam consumed by the engine.
///
/// `get_document` returns the latest persisted snapshot; `save_document`
/// replaces it and bumps the revision.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Fetches the latest persisted document for an auction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if the auction has never
    /// been saved, or a database/serialization error.
    async fn get_document(&self, auction_id: &str) -> Result<AuctionDocument, StoreError>;

    /// Persists a document snapshot, replacing any prior one.
    ///
    /// # Errors
    ///
    /// Returns a database/serialization error; nothing is persisted on
    /// failure.
    async fn save_document(
        &self,
        auction_id: &str,
        document: &AuctionDocument,
    ) -> Result<(), StoreError>;
}

/// An in-memory store for tests and dry runs.
///
/// Documents round-trip through their JSON encoding on every save and load,
/// so serialization asymmetries surface just as they would against a real
/// backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, StoredRecord>>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    revision: u64,
    body: String,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored revision for an auction, if any.
    #[must_use]
    pub fn revision(&self, auction_id: &str) -> Option<u64> {
        self.lock().get(auction_id).map(|record| record.revision)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredRecord>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for InMemoryStore {
    async fn get_document(&self, auction_id: &str) -> Result<AuctionDocument, StoreError> {
        let body: String = self
            .lock()
            .get(auction_id)
            .map(|record| record.body.clone())
            .ok_or_else(|| StoreError::DocumentNotFound(auction_id.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn save_document(
        &self,
        auction_id: &str,
        document: &AuctionDocument,
    ) -> Result<(), StoreError> {
        let body: String = serde_json::to_string(document)?;
        let mut records = self.lock();
        let revision: u64 = records
            .get(auction_id)
            .map_or(1, |record| record.revision + 1);
        records.insert(auction_id.to_string(), StoredRecord { revision, body });
        Ok(())
    }
}
