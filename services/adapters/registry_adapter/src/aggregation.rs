//! Aggregation Engine
//!
//! The registry only answers "get by id" and "how many". Every filtered view is
//! therefore a scan: read the counter once, read ids `1..=total` in ascending
//! order, drop the ids that came back absent, keep the records matching the
//! predicate. Cost is one remote call per record in the registry, not per record
//! in the result.
//!
//! Scans run through [`RegistryQueries`] so a backend with native filtering can
//! replace [`ScanAggregator`] without touching callers.
//!
//! ## Ordering and concurrency
//!
//! At most `scan_window` point reads are in flight at once. Results are yielded
//! in id order whatever the window (`futures::StreamExt::buffered`), so output is
//! always ascending by id. A window of 1 reads strictly one id at a time.
//!
//! The counter is not re-read mid-scan; a record created during a scan may be
//! missed. Dropping a scan future drops its in-flight reads, which is harmless
//! because reads have no side effects.

use crate::rpc_client::PointReader;
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use types::{Address, Listing, ListingId, Proposal, ProposalId, TokenId};

/// Derived views over the registry
#[async_trait]
pub trait RegistryQueries: Send + Sync {
    /// Every active listing, ascending by id
    async fn active_listings(&self) -> Vec<Listing>;

    /// Active listings created by `creator`, ascending by id
    async fn listings_by_creator(&self, creator: Address) -> Vec<Listing>;

    /// Proposals where `participant` is proposer or acceptor, ascending by id
    async fn proposals_by_participant(&self, participant: Address) -> Vec<Proposal>;

    /// Token ids the registry's own index attributes to `owner`
    async fn owned_tokens(&self, owner: Address) -> Vec<TokenId>;

    /// [`Self::owned_tokens`] narrowed to ids whose current owner is still `owner`
    async fn verified_owned_tokens(&self, owner: Address) -> Vec<TokenId>;
}

/// Counter-bounded linear scan over point reads
pub struct ScanAggregator {
    reader: Arc<PointReader>,
    scan_window: usize,
}

impl ScanAggregator {
    pub fn new(reader: Arc<PointReader>, scan_window: usize) -> Self {
        Self {
            reader,
            scan_window: scan_window.max(1),
        }
    }

    pub fn scan_window(&self) -> usize {
        self.scan_window
    }

    /// Read ids `1..=total` through `fetch`, keeping records that satisfy `keep`
    async fn scan<T, F, Fut, P>(&self, what: &str, total: u64, fetch: F, keep: P) -> Vec<T>
    where
        F: Fn(u64) -> Fut,
        Fut: Future<Output = Option<T>>,
        P: Fn(&T) -> bool,
    {
        let (matched, skipped) = stream::iter(1..=total)
            .map(fetch)
            .buffered(self.scan_window)
            .enumerate()
            .fold(
                (Vec::new(), 0usize),
                |(mut matched, mut skipped), (offset, record)| {
                    match record {
                        Some(record) if keep(&record) => matched.push(record),
                        Some(_) => {}
                        None => {
                            skipped += 1;
                            self.reader.metrics().record_skipped();
                            debug!("Skipped {} id {}", what, offset + 1);
                        }
                    }
                    future::ready((matched, skipped))
                },
            )
            .await;

        info!(
            "🔎 Scanned {} {} ids: {} matched, {} skipped",
            total,
            what,
            matched.len(),
            skipped
        );
        matched
    }

    async fn scan_listings<P>(&self, keep: P) -> Vec<Listing>
    where
        P: Fn(&Listing) -> bool,
    {
        let total = self.reader.get_total_listings().await;
        let reader = &self.reader;
        self.scan(
            "listing",
            total,
            |id| reader.get_skill_listing(ListingId::new(id)),
            keep,
        )
        .await
    }
}

#[async_trait]
impl RegistryQueries for ScanAggregator {
    async fn active_listings(&self) -> Vec<Listing> {
        self.scan_listings(|listing| listing.is_active).await
    }

    async fn listings_by_creator(&self, creator: Address) -> Vec<Listing> {
        self.scan_listings(move |listing| listing.is_active && listing.creator == creator)
            .await
    }

    async fn proposals_by_participant(&self, participant: Address) -> Vec<Proposal> {
        let total = self.reader.get_total_proposals().await;
        let reader = &self.reader;
        self.scan(
            "proposal",
            total,
            |id| reader.get_barter_proposal(ProposalId::new(id)),
            move |proposal: &Proposal| proposal.involves(&participant),
        )
        .await
    }

    async fn owned_tokens(&self, owner: Address) -> Vec<TokenId> {
        self.reader.get_user_nfts(owner).await
    }

    async fn verified_owned_tokens(&self, owner: Address) -> Vec<TokenId> {
        let candidates = self.reader.get_user_nfts(owner).await;
        let reader = &self.reader;

        stream::iter(candidates)
            .map(|token| async move { (token, reader.owner_of(token).await) })
            .buffered(self.scan_window)
            .filter_map(|(token, current)| {
                future::ready((current == Some(owner)).then_some(token))
            })
            .collect()
            .await
    }
}
