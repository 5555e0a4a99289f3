// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use dutch_auction_domain::AuctionPhase;
use dutch_auction_persistence::DocumentStore;

use crate::error::CoreError;
use crate::mutator::DocumentMutator;
use crate::tests::helpers::{AUCTION_ID, CountingStore, create_test_document};

async fn create_mutator() -> DocumentMutator<CountingStore> {
    let store: CountingStore = CountingStore::new();
    store.seed(AUCTION_ID, &create_test_document()).await;
    DocumentMutator::new(store, String::from(AUCTION_ID))
}

#[tokio::test]
async fn test_scope_without_mutation_does_not_save() {
    let mut mutator = create_mutator().await;

    mutator
        .scope(|document| {
            assert_eq!(document.current_stage, 0);
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(mutator.store().get_count(), 1);
    assert_eq!(mutator.store().save_count(), 0);
}

#[tokio::test]
async fn test_scope_with_mutation_saves_exactly_once() {
    let mut mutator = create_mutator().await;

    mutator
        .scope(|document| {
            document.current_stage = 1;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(mutator.store().get_count(), 1);
    assert_eq!(mutator.store().save_count(), 1);
}

#[tokio::test]
async fn test_nested_scopes_load_once_save_once() {
    let mut mutator = create_mutator().await;

    mutator.begin().await.unwrap();
    // A nested entry reuses the bound snapshot without re-fetching.
    mutator.begin().await.unwrap();
    assert_eq!(mutator.store().get_count(), 1);

    mutator.document_mut().unwrap().current_stage = 1;
    mutator.commit().await.unwrap();
    // The inner exit must not persist; only the outermost one does.
    assert_eq!(mutator.store().save_count(), 0);

    mutator.document_mut().unwrap().current_phase = AuctionPhase::SealedBid;
    mutator.commit().await.unwrap();

    assert_eq!(mutator.store().get_count(), 1);
    assert_eq!(mutator.store().save_count(), 1);

    let saved = mutator.store().get_document(AUCTION_ID).await.unwrap();
    assert_eq!(saved.current_stage, 1);
    assert_eq!(saved.current_phase, AuctionPhase::SealedBid);
}

#[tokio::test]
async fn test_error_inside_scope_aborts_without_save() {
    let mut mutator = create_mutator().await;

    let result = mutator
        .scope::<(), _>(|document| {
            document.current_stage = 5;
            Err(CoreError::InactiveScope)
        })
        .await;

    assert!(result.is_err());
    assert_eq!(mutator.store().save_count(), 0);

    // The store still holds the pre-scope snapshot.
    let saved = mutator.store().get_document(AUCTION_ID).await.unwrap();
    assert_eq!(saved.current_stage, 0);
}

#[tokio::test]
async fn test_document_access_outside_scope_is_rejected() {
    let mut mutator = create_mutator().await;

    assert!(matches!(mutator.document(), Err(CoreError::InactiveScope)));
    assert!(matches!(
        mutator.document_mut(),
        Err(CoreError::InactiveScope)
    ));

    mutator.begin().await.unwrap();
    assert!(mutator.document().is_ok());
    mutator.commit().await.unwrap();

    assert!(matches!(mutator.document(), Err(CoreError::InactiveScope)));
}

#[tokio::test]
async fn test_abort_discards_nested_changes() {
    let mut mutator = create_mutator().await;

    mutator.begin().await.unwrap();
    mutator.begin().await.unwrap();
    mutator.document_mut().unwrap().current_stage = 3;
    mutator.commit().await.unwrap();

    // The outer scope fails: everything from the inner scope is discarded.
    mutator.abort();

    assert_eq!(mutator.store().save_count(), 0);
    let saved = mutator.store().get_document(AUCTION_ID).await.unwrap();
    assert_eq!(saved.current_stage, 0);
}
