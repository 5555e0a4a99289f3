// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite`-backed document store.
//!
//! One row per auction in `auction_documents`; the document body is stored
//! as its JSON encoding and the revision counter increments on every save.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, params};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use dutch_auction_domain::AuctionDocument;

use crate::DocumentStore;
use crate::error::StoreError;

/// A document store backed by a single `SQLite` database.
///
/// The connection is serialized behind a mutex; every operation is one
/// short statement, so contention is not a concern for a single-auction
/// worker.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens a file-backed store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot
    /// be created.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn: Connection = Connection::open(path)
            .map_err(|err| StoreError::DatabaseConnectionFailed(err.to_string()))?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn: Connection = Connection::open_in_memory()
            .map_err(|err| StoreError::DatabaseConnectionFailed(err.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auction_documents (
                auction_id TEXT PRIMARY KEY,
                revision INTEGER NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|err| StoreError::InitializationError(err.to_string()))?;

        info!("Document store ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// The stored revision for an auction, if any.
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub fn revision(&self, auction_id: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT revision FROM auction_documents WHERE auction_id = ?1")?;
        let mut rows = stmt.query(params![auction_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for SqliteStore {
    async fn get_document(&self, auction_id: &str) -> Result<AuctionDocument, StoreError> {
        let body: String = {
            let conn = self.lock();
            let mut stmt =
                conn.prepare("SELECT body FROM auction_documents WHERE auction_id = ?1")?;
            let mut rows = stmt.query(params![auction_id])?;
            match rows.next()? {
                Some(row) => row.get(0)?,
                None => return Err(StoreError::DocumentNotFound(auction_id.to_string())),
            }
        };
        Ok(serde_json::from_str(&body)?)
    }

    async fn save_document(
        &self,
        auction_id: &str,
        document: &AuctionDocument,
    ) -> Result<(), StoreError> {
        let body: String = serde_json::to_string(document)?;
        let updated_at: String = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| StoreError::SerializationError(err.to_string()))?;

        let conn = self.lock();
        conn.execute(
            "INSERT INTO auction_documents (auction_id, revision, body, updated_at)
             VALUES (?1, 1, ?2, ?3)
             ON CONFLICT(auction_id) DO UPDATE SET
                 revision = revision + 1,
                 body = excluded.body,
                 updated_at = excluded.updated_at",
            params![auction_id, body, updated_at],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dutch_auction_domain::{AuctionPhase, ScheduleConfig, TenderSnapshot, TenderValue};
    use time::macros::datetime;

    fn test_document() -> AuctionDocument {
        let tender = TenderSnapshot {
            tender_id: String::from("UA-11111"),
            title: String::from("Tender Title"),
            title_ru: None,
            title_uk: None,
            description: None,
            value: TenderValue {
                amount: 500_000.0,
                currency: Some(String::from("UAH")),
                value_added_tax_included: true,
            },
        };
        AuctionDocument::prepare(
            String::from("auction-1"),
            &tender,
            datetime!(2017-11-06 12:00 UTC),
            &ScheduleConfig::fast_forward(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_then_get_round_trips() {
        let store: SqliteStore = SqliteStore::open_in_memory().unwrap();
        let document = test_document();

        store.save_document("auction-1", &document).await.unwrap();
        let loaded = store.get_document("auction-1").await.unwrap();

        assert_eq!(loaded, document);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let store: SqliteStore = SqliteStore::open_in_memory().unwrap();

        let result = store.get_document("auction-9").await;

        assert!(matches!(result, Err(StoreError::DocumentNotFound(_))));
    }

    #[tokio::test]
    async fn test_revision_increments_per_save() {
        let store: SqliteStore = SqliteStore::open_in_memory().unwrap();
        let mut document = test_document();

        store.save_document("auction-1", &document).await.unwrap();
        assert_eq!(store.revision("auction-1").unwrap(), Some(1));

        document.current_phase = AuctionPhase::SealedBid;
        store.save_document("auction-1", &document).await.unwrap();
        assert_eq!(store.revision("auction-1").unwrap(), Some(2));
    }
}
