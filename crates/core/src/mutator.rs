// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The document-update scope.
//!
//! Every mutation of the shared auction document happens between a
//! [`DocumentMutator::begin`] and a matching [`DocumentMutator::commit`] or
//! [`DocumentMutator::abort`]. The outermost `begin` fetches the latest
//! persisted snapshot; nested entries reuse it without re-fetching. The
//! outermost `commit` persists exactly once, and only if something actually
//! changed; `abort` discards the working copy so a failed transition never
//! leaks a partial write.

use dutch_auction_domain::AuctionDocument;
use dutch_auction_persistence::DocumentStore;

use crate::error::CoreError;

/// Scoped load/mutate/save access to one auction's document.
///
/// The mutator is owned by the single phase-driving flow; re-entrancy is an
/// explicit depth counter, not a lock, because nested scopes only ever occur
/// within that one flow (for example the no-bid path of ending the
/// sealed-bid phase, which ends the auction inside its own scope).
#[derive(Debug)]
pub struct DocumentMutator<S> {
    store: S,
    auction_id: String,
    slot: Option<AuctionDocument>,
    baseline: Option<AuctionDocument>,
    depth: u32,
}

impl<S: DocumentStore> DocumentMutator<S> {
    /// Creates a mutator for one auction.
    #[must_use]
    pub const fn new(store: S, auction_id: String) -> Self {
        Self {
            store,
            auction_id,
            slot: None,
            baseline: None,
            depth: 0,
        }
    }

    /// Enters an update scope.
    ///
    /// The outermost entry fetches the latest persisted snapshot and binds
    /// it as the working document; nested entries reuse the bound snapshot.
    ///
    /// # Errors
    ///
    /// Returns a store error if the snapshot cannot be fetched.
    pub async fn begin(&mut self) -> Result<(), CoreError> {
        if self.depth == 0 {
            let document: AuctionDocument = self.store.get_document(&self.auction_id).await?;
            self.baseline = Some(document.clone());
            self.slot = Some(document);
        }
        self.depth += 1;
        Ok(())
    }

    /// The working document, read-only.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InactiveScope`] outside an active scope.
    pub fn document(&self) -> Result<&AuctionDocument, CoreError> {
        if self.depth == 0 {
            return Err(CoreError::InactiveScope);
        }
        self.slot.as_ref().ok_or(CoreError::InactiveScope)
    }

    /// The working document, mutable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InactiveScope`] outside an active scope.
    pub fn document_mut(&mut self) -> Result<&mut AuctionDocument, CoreError> {
        if self.depth == 0 {
            return Err(CoreError::InactiveScope);
        }
        self.slot.as_mut().ok_or(CoreError::InactiveScope)
    }

    /// Leaves an update scope on the success path.
    ///
    /// Nested exits only unwind the depth counter. The outermost exit
    /// persists the working document exactly once, and skips the save
    /// entirely when nothing changed against the fetched baseline.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InactiveScope`] if no scope is active, or a
    /// store error if the save fails.
    pub async fn commit(&mut self) -> Result<(), CoreError> {
        if self.depth == 0 {
            return Err(CoreError::InactiveScope);
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(());
        }

        let document: AuctionDocument = self.slot.take().ok_or(CoreError::InactiveScope)?;
        let baseline: Option<AuctionDocument> = self.baseline.take();
        if baseline.as_ref() != Some(&document) {
            self.store.save_document(&self.auction_id, &document).await?;
        }
        Ok(())
    }

    /// Leaves an update scope on the failure path.
    ///
    /// The outermost exit drops the working document without saving, so the
    /// store still holds the snapshot from before the failed transition.
    /// Calling this outside a scope is a no-op.
    pub fn abort(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.slot = None;
            self.baseline = None;
        }
    }

    /// Runs a closure against the working document inside its own scope.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error after aborting the scope, or a store
    /// error from entering/leaving the scope.
    pub async fn scope<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut AuctionDocument) -> Result<T, CoreError>,
    {
        self.begin().await?;
        let result: Result<T, CoreError> = match self.document_mut() {
            Ok(document) => f(document),
            Err(err) => Err(err),
        };
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                self.abort();
                Err(err)
            }
        }
    }

    /// The wrapped store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The auction this mutator is bound to.
    #[must_use]
    pub fn auction_id(&self) -> &str {
        &self.auction_id
    }
}
