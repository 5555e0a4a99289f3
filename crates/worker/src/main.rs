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

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use dutch_auction::PhaseController;
use dutch_auction_api::{ResultsClient, TenderData, announce_results, merge_results};
use dutch_auction_audit::AuditReport;
use dutch_auction_domain::{AuctionDocument, ScheduleConfig};
use dutch_auction_persistence::{DocumentStore, SqliteStore, StoreError};

/// Dutch Auction Worker - drives one multi-phase sell-side auction
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The auction identifier.
    auction_id: String,

    /// Path to a JSON file with the upstream tender data.
    #[arg(short, long)]
    tender_file: PathBuf,

    /// Path to the `SQLite` database file. If not provided, uses in-memory
    /// database.
    #[arg(short, long)]
    database: Option<String>,

    /// Auction start time (RFC 3339). Defaults to now.
    #[arg(short, long)]
    start: Option<String>,

    /// Use the accelerated stage timeline (10 rounds over 10 minutes).
    #[arg(long)]
    fast_forward: bool,

    /// Procurement API base URL for result publication. Results are only
    /// logged when omitted.
    #[arg(long)]
    tender_url: Option<String>,

    /// Procurement API token for result publication.
    #[arg(long, default_value = "")]
    api_token: String,

    /// Log the final payload without posting it upstream.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing auction worker for {}", args.auction_id);

    // Load the upstream tender data
    let tender: TenderData = serde_json::from_str(&std::fs::read_to_string(&args.tender_file)?)?;

    // Initialize the document store (in-memory or file-based)
    let store: SqliteStore = if let Some(db_path) = &args.database {
        info!("Using file-based document store at: {}", db_path);
        SqliteStore::open_file(db_path)?
    } else {
        info!("Using in-memory document store");
        SqliteStore::open_in_memory()?
    };

    // Prepare the auction document, unless a persisted one already exists
    // (a restarted worker resumes from it).
    match store.get_document(&args.auction_id).await {
        Ok(document) => info!(
            "Resuming auction from persisted document (phase {}, stage {})",
            document.current_phase, document.current_stage
        ),
        Err(StoreError::DocumentNotFound(_)) => {
            let start: OffsetDateTime = match &args.start {
                Some(value) => OffsetDateTime::parse(value, &Rfc3339)?,
                None => OffsetDateTime::now_utc(),
            };
            let config: ScheduleConfig = if args.fast_forward {
                ScheduleConfig::fast_forward()
            } else {
                ScheduleConfig::standard()
            };
            let document: AuctionDocument =
                AuctionDocument::prepare(args.auction_id.clone(), &tender.snapshot(), start, &config)?;
            store.save_document(&args.auction_id, &document).await?;
            info!(
                "Prepared auction document with {} stages",
                document.stages.len()
            );
        }
        Err(err) => return Err(err.into()),
    }

    // Drive the auction to its terminal state
    let audit: AuditReport = AuditReport::new(tender.data.id.clone(), args.auction_id.clone());
    let mut controller: PhaseController<SqliteStore> = PhaseController::new(
        store,
        args.auction_id.clone(),
        audit,
        tender.bidder_mapping(),
    );
    controller.run().await?;

    // Publish the final results
    let document: AuctionDocument = controller.store().get_document(&args.auction_id).await?;
    let mut merged: TenderData = tender.clone();
    merge_results(&mut merged, &document);
    let announced = announce_results(&merged);
    info!("Announced results for {} bidders", announced.len());

    if let Some(tender_url) = args.tender_url {
        let client: ResultsClient = ResultsClient::new(tender_url, args.api_token, args.debug);
        client.post_results(&merged).await?;
    }

    info!("Auction worker finished");
    Ok(())
}
