//! Point reads against the registry
//!
//! One method per contract read entry point. Each performs exactly one call and
//! never fails: transport errors, reverts and undecodable results are logged,
//! counted in [`ReadMetrics`] and replaced by a neutral value (`None`, `0`, or an
//! empty list). A transient RPC failure in the middle of a scan therefore costs
//! one record, not the whole scan.

use crate::resolver::AddressResolver;
use crate::transport::{ReadCall, RegistryTransport};
use codec::{decode, decode_address, decode_counter, decode_token_ids};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use types::{Address, Listing, ListingId, Proposal, ProposalId, TokenId, User};

/// Lock-free read counters, shared by every component issuing reads
#[derive(Debug, Default)]
pub struct ReadMetrics {
    point_reads: AtomicU64,
    read_failures: AtomicU64,
    decode_failures: AtomicU64,
    skipped_ids: AtomicU64,
    unresolved: AtomicU64,
}

/// Point-in-time copy of [`ReadMetrics`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Calls that reached the transport
    pub point_reads: u64,
    /// Calls the transport failed (network error, revert, timeout)
    pub read_failures: u64,
    /// Results that arrived but could not be normalized
    pub decode_failures: u64,
    /// Scan ids left out of an aggregation because their read came back absent
    pub skipped_ids: u64,
    /// Reads refused because the registry address was unresolved
    pub unresolved: u64,
}

impl ReadMetrics {
    pub fn snapshot(&self) -> Metrics {
        Metrics {
            point_reads: self.point_reads.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            skipped_ids: self.skipped_ids.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped_ids.fetch_add(1, Ordering::Relaxed);
    }

    fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Failure-isolating reader for single records and counters
pub struct PointReader {
    transport: Arc<dyn RegistryTransport>,
    resolver: Arc<AddressResolver>,
    registry_id: String,
    metrics: Arc<ReadMetrics>,
}

impl PointReader {
    pub fn new(
        transport: Arc<dyn RegistryTransport>,
        resolver: Arc<AddressResolver>,
        registry_id: impl Into<String>,
        metrics: Arc<ReadMetrics>,
    ) -> Self {
        Self {
            transport,
            resolver,
            registry_id: registry_id.into(),
            metrics,
        }
    }

    /// Registry contract address, resolving it on first use
    pub async fn contract(&self) -> Option<Address> {
        self.resolver.resolve_address(&self.registry_id).await
    }

    pub fn metrics(&self) -> &Arc<ReadMetrics> {
        &self.metrics
    }

    fn decode_failed(&self, call: &ReadCall) {
        self.metrics.record_decode_failure();
        warn!("⚠️ {} returned an undecodable result, skipping", call);
    }

    /// One raw read; `None` on any failure
    async fn read_raw(&self, call: ReadCall) -> Option<Value> {
        let Some(contract) = self.contract().await else {
            self.metrics.unresolved.fetch_add(1, Ordering::Relaxed);
            warn!("Registry address unavailable, skipping {}", call);
            return None;
        };

        self.metrics.point_reads.fetch_add(1, Ordering::Relaxed);
        match self.transport.read(contract, &call).await {
            Ok(value) => {
                debug!("📖 {} ok", call);
                Some(value)
            }
            Err(e) => {
                self.metrics.read_failures.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ {} failed: {}", call, e);
                None
            }
        }
    }

    /// `getUser(address)`; a never-registered address decodes to an empty record
    pub async fn get_user(&self, address: Address) -> Option<User> {
        let call = ReadCall::User(address);
        let raw = self.read_raw(call.clone()).await?;
        let user = decode::<User>(raw, &address);
        if user.is_none() {
            self.decode_failed(&call);
        }
        user
    }

    pub async fn get_skill_listing(&self, id: ListingId) -> Option<Listing> {
        let call = ReadCall::SkillListing(id);
        let raw = self.read_raw(call.clone()).await?;
        let listing = decode::<Listing>(raw, &id);
        if listing.is_none() {
            self.decode_failed(&call);
        }
        listing
    }

    pub async fn get_barter_proposal(&self, id: ProposalId) -> Option<Proposal> {
        let call = ReadCall::BarterProposal(id);
        let raw = self.read_raw(call.clone()).await?;
        let proposal = decode::<Proposal>(raw, &id);
        if proposal.is_none() {
            self.decode_failed(&call);
        }
        proposal
    }

    /// `getTotalListings()`, 0 when unavailable
    pub async fn get_total_listings(&self) -> u64 {
        self.read_counter(ReadCall::TotalListings).await
    }

    /// `getTotalProposals()`, 0 when unavailable
    pub async fn get_total_proposals(&self) -> u64 {
        self.read_counter(ReadCall::TotalProposals).await
    }

    async fn read_counter(&self, call: ReadCall) -> u64 {
        let Some(raw) = self.read_raw(call.clone()).await else {
            return 0;
        };
        decode_counter(&raw).unwrap_or_else(|| {
            self.decode_failed(&call);
            0
        })
    }

    /// `getUserNFTs(owner)`, empty when unavailable
    pub async fn get_user_nfts(&self, owner: Address) -> Vec<TokenId> {
        let call = ReadCall::UserNfts(owner);
        let Some(raw) = self.read_raw(call.clone()).await else {
            return Vec::new();
        };
        decode_token_ids(&raw).unwrap_or_else(|| {
            self.decode_failed(&call);
            Vec::new()
        })
    }

    /// `ownerOf(token)`; always a fresh read, ownership can change between calls
    pub async fn owner_of(&self, token: TokenId) -> Option<Address> {
        let call = ReadCall::OwnerOf(token);
        let raw = self.read_raw(call.clone()).await?;
        let owner = decode_address(&raw);
        if owner.is_none() {
            self.decode_failed(&call);
        }
        owner
    }
}
