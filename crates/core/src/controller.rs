// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The phase state machine.
//!
//! One controller drives one auction: `Dutch → SealedBid → PreBestBid →
//! BestBid → Announcement → End`. The initial state is whatever phase the
//! persisted document indicates, so a restarted worker resumes where the
//! last committed transition left off. Every transition runs inside the
//! document mutator's scope; a failed transition aborts without persisting
//! anything.

use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use dutch_auction_audit::AuditReport;
use dutch_auction_domain::{
    AuctionDocument, AuctionPhase, BidRecord, LocalizedLabel, ResultEntry, Stage, StageKind,
    next_dutch_amount,
};
use dutch_auction_persistence::DocumentStore;

use crate::bids::BidHistories;
use crate::error::CoreError;
use crate::ingest::{BidIngestionWorker, POLL_INTERVAL};
use crate::mutator::DocumentMutator;
use crate::queue::BidQueue;
use crate::resolver::{dutch_winner, select_sealedbid_winner};
use crate::session::SealedBidSession;

/// The top-level driver of one auction's lifecycle.
#[derive(Debug)]
pub struct PhaseController<S> {
    mutator: DocumentMutator<S>,
    session: SealedBidSession,
    audit: Arc<Mutex<AuditReport>>,
    mapping: HashMap<String, String>,
    worker_handle: Option<JoinHandle<()>>,
}

impl<S: DocumentStore> PhaseController<S> {
    /// Creates a controller for one auction.
    ///
    /// `mapping` translates bidder identifiers to the anonymized display
    /// names used in published labels.
    #[must_use]
    pub fn new(
        store: S,
        auction_id: String,
        audit: AuditReport,
        mapping: HashMap<String, String>,
    ) -> Self {
        Self {
            mutator: DocumentMutator::new(store, auction_id),
            session: SealedBidSession::new(),
            audit: Arc::new(Mutex::new(audit)),
            mapping,
            worker_handle: None,
        }
    }

    /// A handle to the inbound bid queue; the external submission channel
    /// pushes into it during the sealed-bid window.
    #[must_use]
    pub fn queue(&self) -> Arc<BidQueue> {
        self.session.queue()
    }

    /// The session's shared sealed-bid state.
    #[must_use]
    pub const fn session(&self) -> &SealedBidSession {
        &self.session
    }

    /// A handle to the audit report.
    #[must_use]
    pub fn audit(&self) -> Arc<Mutex<AuditReport>> {
        Arc::clone(&self.audit)
    }

    /// The underlying document store.
    pub const fn store(&self) -> &S {
        self.mutator.store()
    }

    /// Walks the scheduled stage list, sleeping until each stage's start
    /// and dispatching the transition it calls for. Returns when the
    /// auction reaches its terminal state.
    ///
    /// # Errors
    ///
    /// Propagates the first failed transition; the caller is expected to be
    /// supervised and restarted, resuming from the last persisted state.
    pub async fn run(&mut self) -> Result<(), CoreError> {
        loop {
            let (phase, next) = self.peek_next_stage().await?;
            if phase == AuctionPhase::End {
                info!("Auction reached terminal state");
                break;
            }
            let Some((index, kind, start)) = next else {
                break;
            };
            wait_until(start).await;

            match (phase, kind) {
                (AuctionPhase::Dutch, StageKind::Dutch) if index == 1 => {
                    self.start_auction().await?;
                }
                (AuctionPhase::Dutch, StageKind::Dutch) => self.next_dutch_round().await?,
                (AuctionPhase::Dutch, StageKind::SealedBid) => {
                    if self.has_dutch_winner().await? {
                        self.switch_to_sealedbid().await?;
                    } else {
                        info!("No dutch winner approved. End auction now!");
                        self.end_auction().await?;
                    }
                }
                (AuctionPhase::SealedBid, StageKind::Pause) => self.end_sealedbid().await?,
                (AuctionPhase::PreBestBid, StageKind::BestBid) => {
                    self.switch_to_bestbid().await?;
                }
                (AuctionPhase::BestBid, StageKind::Pause) => self.end_bestbid().await?,
                (AuctionPhase::Announcement, StageKind::Announcement) => {
                    self.end_auction().await?;
                }
                (phase, kind) => {
                    warn!("Unexpected stage {kind:?} in phase {phase}; stopping the driver");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Opens the auction: stamps the audit start, enters the first dutch
    /// round and prices it at the initial value.
    ///
    /// # Errors
    ///
    /// Fails without persisting if the scope cannot be entered or the
    /// timeline has no first round.
    pub async fn start_auction(&mut self) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.start_auction_inner().await;
        self.finish(result).await
    }

    async fn start_auction_inner(&mut self) -> Result<(), CoreError> {
        let run_time: String = run_time_stamp()?;
        {
            let mut audit = self.audit.lock().await;
            audit.timeline.auction_start = Some(run_time.clone());
            audit.timeline.dutch.timeline.start = Some(run_time);
        }

        let document = self.mutator.document_mut()?;
        document.current_phase = AuctionPhase::Dutch;
        let initial_value: f64 = document.initial_value;
        advance_stage(document)?;
        current_stage_mut(document)?.amount = Some(initial_value);
        info!("Auction started");
        Ok(())
    }

    /// Advances into the next dutch round and stamps its descending price.
    ///
    /// Once a dutch winner has been approved the remaining rounds only move
    /// the stage pointer; no further prices are stamped.
    ///
    /// # Errors
    ///
    /// Fails without persisting if the auction is not in the dutch phase or
    /// the pointer would leave the timeline.
    pub async fn next_dutch_round(&mut self) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.next_dutch_round_inner();
        self.finish(result).await
    }

    fn next_dutch_round_inner(&mut self) -> Result<(), CoreError> {
        let document = self.mutator.document_mut()?;
        expect_phase(document, AuctionPhase::Dutch)?;

        if dutch_winner(document).is_some() {
            advance_stage(document)?;
            debug!("Dutch winner already approved; round not priced");
            return Ok(());
        }

        let current_amount: f64 = document
            .current()
            .and_then(|stage| stage.amount)
            .unwrap_or(document.initial_value);
        let amount: f64 = next_dutch_amount(document.initial_value, current_amount);
        advance_stage(document)?;
        current_stage_mut(document)?.amount = Some(amount);
        info!(
            "Switched to dutch round {} with amount {}",
            document.current_stage, amount
        );
        Ok(())
    }

    /// Accepts the standing dutch price for a bidder.
    ///
    /// Records the dutch winner's result entry, stamps the acceptance on
    /// the current round stage, seeds the sealed-bid ledger with the
    /// accepted record and closes the dutch audit span.
    ///
    /// # Errors
    ///
    /// Fails without persisting if the auction is not in the dutch phase,
    /// a winner was already approved, or the current stage carries no
    /// standing price.
    pub async fn approve_dutch_winner(&mut self, bidder_id: &str) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.approve_dutch_winner_inner(bidder_id).await;
        self.finish(result).await
    }

    async fn approve_dutch_winner_inner(&mut self, bidder_id: &str) -> Result<(), CoreError> {
        let run_time: String = run_time_stamp()?;
        let bidder_name: String = self.display_name(bidder_id);

        let document = self.mutator.document_mut()?;
        expect_phase(document, AuctionPhase::Dutch)?;
        if dutch_winner(document).is_some() {
            return Err(CoreError::DutchWinnerAlreadySet);
        }
        let amount: f64 = document
            .current()
            .and_then(|stage| stage.amount)
            .ok_or(CoreError::NoStandingPrice)?;

        document.results.push(ResultEntry::new(
            bidder_id.to_string(),
            &bidder_name,
            amount,
            run_time.clone(),
            true,
            false,
        ));
        let stage = current_stage_mut(document)?;
        stage.bidder_id = Some(bidder_id.to_string());
        stage.label = Some(LocalizedLabel::for_bidder(&bidder_name));

        // Seed the sealed-bid ledger with the accepted record; it is
        // carried context there, not a sealed-bid submission.
        let mut record: BidRecord =
            BidRecord::new(bidder_id.to_string(), amount, run_time.clone());
        record.dutch_winner = true;
        self.session.histories().lock().await.append(record.clone());

        let mut audit = self.audit.lock().await;
        audit.timeline.dutch.record_bid(record);
        audit.timeline.dutch.timeline.end = Some(run_time);
        drop(audit);

        info!("Approved dutch winner {bidder_id} with amount {amount}");
        Ok(())
    }

    /// Opens the sealed-bid window.
    ///
    /// Under the bid-action lock: advances onto the sealed-bid stage,
    /// stamps the audit start and spawns the ingestion worker. Does not
    /// block on the worker.
    ///
    /// # Errors
    ///
    /// Fails without persisting if the scope cannot be entered or the
    /// pointer would leave the timeline.
    pub async fn switch_to_sealedbid(&mut self) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.switch_to_sealedbid_inner().await;
        self.finish(result).await
    }

    async fn switch_to_sealedbid_inner(&mut self) -> Result<(), CoreError> {
        let bids_guard = self.session.lock_bids().await;
        self.session.arm();

        let document = self.mutator.document_mut()?;
        document.current_phase = AuctionPhase::SealedBid;
        let run_time: String = advance_stage(document)?;
        self.audit.lock().await.timeline.sealedbid.timeline.start = Some(run_time);

        let worker: BidIngestionWorker = BidIngestionWorker::new(
            self.session.queue(),
            self.session.end_signal(),
            self.session.histories(),
            Arc::clone(&self.audit),
        );
        self.worker_handle = Some(tokio::spawn(worker.run()));
        drop(bids_guard);

        info!("Switched auction to sealedbid phase");
        Ok(())
    }

    /// Stamps the sealed-bid audit span's end.
    pub async fn approve_audit_info_on_sealedbid(&self, end_time: &str) {
        self.audit.lock().await.timeline.sealedbid.timeline.end = Some(end_time.to_string());
    }

    /// Closes the sealed-bid window and resolves the winner.
    ///
    /// Signals the worker, waits for the queue to drain, joins the worker,
    /// and then either ends the auction immediately (no effective bids) or
    /// writes the winner onto the completing stage, rebuilds the results
    /// and advances into the pre-best-bid phase.
    ///
    /// # Errors
    ///
    /// Fails without persisting on scope or timeline errors.
    pub async fn end_sealedbid(&mut self) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.end_sealedbid_inner().await;
        self.finish(result).await
    }

    async fn end_sealedbid_inner(&mut self) -> Result<(), CoreError> {
        self.session.end_signal().cancel();

        let queue = self.session.queue();
        while !queue.is_empty() {
            info!("Waiting for bids to process");
            sleep(POLL_INTERVAL).await;
        }
        info!("Done processing bids queue");

        // The drained queue does not mean the last record finished; join
        // the worker so every dequeued record is fully recorded before the
        // histories are read.
        if let Some(handle) = self.worker_handle.take() {
            if handle.await.is_err() {
                error!("Bids worker task failed");
            }
        }

        let histories: BidHistories = self.session.histories().lock().await.clone();
        let Some(outcome) = select_sealedbid_winner(&histories) else {
            info!("No bids on sealedbid phase. End auction now!");
            return self.end_auction().await;
        };

        let carried_dutch: Option<ResultEntry> = dutch_winner(self.mutator.document()?).cloned();
        let dutch_id: Option<String> = carried_dutch.as_ref().map(|entry| entry.bidder_id.clone());
        let winner_name: String = self.display_name(&outcome.winner.bidder_id);

        let mut results: Vec<ResultEntry> = Vec::new();
        if let Some(dutch_entry) = carried_dutch {
            let participates: bool = outcome.winner.bidder_id == dutch_entry.bidder_id
                || outcome
                    .participants
                    .iter()
                    .any(|bid| bid.bidder_id == dutch_entry.bidder_id);
            // Carried over unchanged unless the dutch winner also competed
            // in the sealed-bid round, in which case the flags fold into
            // their single participant entry.
            if !participates {
                results.push(dutch_entry);
            }
        }
        results.push(ResultEntry::new(
            outcome.winner.bidder_id.clone(),
            &winner_name,
            outcome.winner.amount,
            outcome.winner.time.clone(),
            dutch_id.as_deref() == Some(outcome.winner.bidder_id.as_str()),
            true,
        ));
        let mut others: Vec<BidRecord> = outcome.participants.clone();
        others.sort_by(|a, b| a.bidder_id.cmp(&b.bidder_id));
        for participant in &others {
            let name: String = self.display_name(&participant.bidder_id);
            results.push(ResultEntry::new(
                participant.bidder_id.clone(),
                &name,
                participant.amount,
                participant.time.clone(),
                dutch_id.as_deref() == Some(participant.bidder_id.as_str()),
                false,
            ));
        }

        let document = self.mutator.document_mut()?;
        let stage = current_stage_mut(document)?;
        stage.amount = Some(outcome.winner.amount);
        stage.bidder_id = Some(outcome.winner.bidder_id.clone());
        stage.label = Some(LocalizedLabel::for_bidder(&winner_name));
        stage.time = Some(outcome.winner.time.clone());
        stage.sealedbid_winner = true;

        document.results = results;
        document.current_phase = AuctionPhase::PreBestBid;
        info!(
            "Approved sealedbid winner {} with amount {}",
            outcome.winner.bidder_id, outcome.winner.amount
        );
        let run_time: String = advance_stage(document)?;
        self.approve_audit_info_on_sealedbid(&run_time).await;
        Ok(())
    }

    /// Opens the best-bid window.
    ///
    /// # Errors
    ///
    /// Fails without persisting if the auction is not in the pre-best-bid
    /// phase.
    pub async fn switch_to_bestbid(&mut self) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.switch_to_bestbid_inner().await;
        self.finish(result).await
    }

    async fn switch_to_bestbid_inner(&mut self) -> Result<(), CoreError> {
        let document = self.mutator.document_mut()?;
        expect_phase(document, AuctionPhase::PreBestBid)?;
        document.current_phase = AuctionPhase::BestBid;
        let run_time: String = advance_stage(document)?;
        self.audit.lock().await.timeline.bestbid.timeline.start = Some(run_time);
        info!("Switched auction to bestbid phase");
        Ok(())
    }

    /// Processes a best-bid overbid attempt.
    ///
    /// Only the dutch winner may overbid, and only at or above the
    /// sealed-bid maximum; a qualifying overbid transfers the final
    /// standing to the dutch winner. Returns whether the overbid was
    /// accepted. Every attempt is recorded in the best-bid audit span.
    ///
    /// # Errors
    ///
    /// Fails without persisting if the auction is not in the best-bid
    /// phase.
    pub async fn approve_bestbid(
        &mut self,
        bidder_id: &str,
        amount: f64,
    ) -> Result<bool, CoreError> {
        self.mutator.begin().await?;
        let result = self.approve_bestbid_inner(bidder_id, amount).await;
        self.finish(result).await
    }

    async fn approve_bestbid_inner(
        &mut self,
        bidder_id: &str,
        amount: f64,
    ) -> Result<bool, CoreError> {
        expect_phase(self.mutator.document()?, AuctionPhase::BestBid)?;

        let run_time: String = run_time_stamp()?;
        self.audit.lock().await.timeline.bestbid.record_bid(BidRecord::new(
            bidder_id.to_string(),
            amount,
            run_time.clone(),
        ));

        let document = self.mutator.document_mut()?;
        if dutch_winner(document).is_none() {
            warn!("Best bid from {bidder_id} rejected: no dutch winner");
            return Ok(false);
        }
        if dutch_winner(document).is_some_and(|entry| entry.bidder_id != bidder_id) {
            warn!("Best bid from {bidder_id} rejected: only the dutch winner may overbid");
            return Ok(false);
        }
        let Some(best_amount) = document
            .results
            .iter()
            .find(|entry| entry.sealedbid_winner)
            .map(|entry| entry.amount)
        else {
            warn!("Best bid from {bidder_id} rejected: no sealed-bid winner on record");
            return Ok(false);
        };
        if amount < best_amount {
            info!("Best bid {amount} from {bidder_id} is below the sealed-bid maximum {best_amount}");
            return Ok(false);
        }

        for entry in &mut document.results {
            entry.sealedbid_winner = false;
        }
        if let Some(entry) = document.results.iter_mut().find(|entry| entry.dutch_winner) {
            entry.amount = amount;
            entry.time = run_time;
            entry.sealedbid_winner = true;
        }
        info!("Approved best bid from {bidder_id} with amount {amount}");
        Ok(true)
    }

    /// Closes the best-bid window.
    ///
    /// # Errors
    ///
    /// Fails without persisting if the auction is not in the best-bid
    /// phase.
    pub async fn end_bestbid(&mut self) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.end_bestbid_inner().await;
        self.finish(result).await
    }

    async fn end_bestbid_inner(&mut self) -> Result<(), CoreError> {
        let document = self.mutator.document_mut()?;
        expect_phase(document, AuctionPhase::BestBid)?;
        document.current_phase = AuctionPhase::Announcement;
        let run_time: String = advance_stage(document)?;
        self.audit.lock().await.timeline.bestbid.timeline.end = Some(run_time);
        info!("Ended bestbid phase");
        Ok(())
    }

    /// Moves the auction to its terminal state.
    ///
    /// Advances onto the announcement stage when it is next in the
    /// timeline; an early end (no bids) leaves the pointer where it is.
    ///
    /// # Errors
    ///
    /// Fails without persisting on scope errors.
    pub async fn end_auction(&mut self) -> Result<(), CoreError> {
        self.mutator.begin().await?;
        let result = self.end_auction_inner().await;
        self.finish(result).await
    }

    async fn end_auction_inner(&mut self) -> Result<(), CoreError> {
        let run_time: String = run_time_stamp()?;
        {
            let mut audit = self.audit.lock().await;
            if audit.results.start.is_none() {
                audit.results.start = Some(run_time.clone());
            }
            audit.results.end = Some(run_time);
        }

        let document = self.mutator.document_mut()?;
        let next_is_announcement: bool = document
            .stages
            .get(document.current_stage + 1)
            .is_some_and(|stage| stage.kind == StageKind::Announcement);
        if next_is_announcement {
            advance_stage(document)?;
        }
        document.current_phase = AuctionPhase::End;
        info!("Auction ended");
        Ok(())
    }

    async fn peek_next_stage(
        &mut self,
    ) -> Result<(AuctionPhase, Option<(usize, StageKind, OffsetDateTime)>), CoreError> {
        self.mutator.begin().await?;
        let result = self.mutator.document().map(|document| {
            let next = document
                .stages
                .get(document.current_stage + 1)
                .map(|stage| (document.current_stage + 1, stage.kind, stage.start));
            (document.current_phase, next)
        });
        self.finish(result).await
    }

    async fn has_dutch_winner(&mut self) -> Result<bool, CoreError> {
        self.mutator.begin().await?;
        let result = self
            .mutator
            .document()
            .map(|document| dutch_winner(document).is_some());
        self.finish(result).await
    }

    /// Closes the scope opened by the caller, saving on success and
    /// discarding on failure.
    async fn finish<T>(&mut self, result: Result<T, CoreError>) -> Result<T, CoreError> {
        match result {
            Ok(value) => {
                self.mutator.commit().await?;
                Ok(value)
            }
            Err(err) => {
                self.mutator.abort();
                error!("Transition aborted: {err}");
                Err(err)
            }
        }
    }

    fn display_name(&self, bidder_id: &str) -> String {
        self.mapping
            .get(bidder_id)
            .cloned()
            .unwrap_or_else(|| bidder_id.to_string())
    }
}

/// Advances the stage pointer by one and stamps the run time on the newly
/// current stage.
fn advance_stage(document: &mut AuctionDocument) -> Result<String, CoreError> {
    let run_time: String = run_time_stamp()?;
    let next: usize = document.current_stage + 1;
    let stage = document
        .stages
        .get_mut(next)
        .ok_or(CoreError::StageOutOfRange { index: next })?;
    stage.time = Some(run_time.clone());
    document.current_stage = next;
    Ok(run_time)
}

fn current_stage_mut(document: &mut AuctionDocument) -> Result<&mut Stage, CoreError> {
    let index: usize = document.current_stage;
    document
        .stages
        .get_mut(index)
        .ok_or(CoreError::StageOutOfRange { index })
}

fn expect_phase(document: &AuctionDocument, expected: AuctionPhase) -> Result<(), CoreError> {
    if document.current_phase == expected {
        Ok(())
    } else {
        Err(CoreError::UnexpectedPhase {
            expected,
            actual: document.current_phase,
        })
    }
}

fn run_time_stamp() -> Result<String, CoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| CoreError::TimestampFormat(err.to_string()))
}

async fn wait_until(moment: OffsetDateTime) {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    if moment > now {
        tokio::time::sleep((moment - now).unsigned_abs()).await;
    }
}
