//! SkillSwap Registry Adapter
//!
//! Single entry point for applications: wires the resolver, point reader, scan
//! aggregator and lifecycle manager over one transport, and adds the composite
//! profile view.

use crate::aggregation::{RegistryQueries, ScanAggregator};
use crate::lifecycle::LifecycleManager;
use crate::resolver::{AddressResolver, DirectoryLookup, MirrorNodeLookup};
use crate::rpc_client::{Metrics, PointReader, ReadMetrics};
use crate::rpc_transport::RpcTransport;
use crate::transport::RegistryTransport;
use anyhow::{Context, Result};
use registry_config::RegistryConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use types::{Address, Listing, Proposal, TokenId, User};

/// Everything shown on a participant's profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub address: Address,
    /// Stored name, or the default display name when blank
    pub display_name: String,
    /// Empty record when the address never registered
    pub user: User,
    pub listings: Vec<Listing>,
    pub proposals: Vec<Proposal>,
    pub tokens: Vec<TokenId>,
}

impl ProfileSummary {
    pub fn is_registered(&self) -> bool {
        self.user.is_registered
    }
}

/// SkillSwap registry adapter
pub struct RegistryAdapter {
    config: RegistryConfig,
    resolver: Arc<AddressResolver>,
    reader: Arc<PointReader>,
    queries: Arc<dyn RegistryQueries>,
    lifecycle: LifecycleManager,
    metrics: Arc<ReadMetrics>,
}

impl RegistryAdapter {
    /// Adapter over JSON-RPC and the configured directory service
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let transport = Arc::new(
            RpcTransport::new(&config.network, &config.signer)
                .context("Failed to create RPC transport")?,
        );
        let directory = Arc::new(MirrorNodeLookup::new(
            &config.registry.directory_url,
            Duration::from_millis(config.network.request_timeout_ms),
        )?);

        Self::with_transport(config, transport, directory)
    }

    /// Adapter over caller-supplied transport and directory
    pub fn with_transport(
        config: RegistryConfig,
        transport: Arc<dyn RegistryTransport>,
        directory: Arc<dyn DirectoryLookup>,
    ) -> Result<Self> {
        let resolver = Arc::new(AddressResolver::new(directory));
        if let Some(raw) = &config.registry.evm_address {
            let address: Address = raw
                .parse()
                .with_context(|| format!("Invalid registry.evm_address {}", raw))?;
            resolver.seed(&config.registry.contract_id, address);
        }

        let metrics = Arc::new(ReadMetrics::default());
        let reader = Arc::new(PointReader::new(
            transport.clone(),
            resolver.clone(),
            config.registry.contract_id.clone(),
            metrics.clone(),
        ));
        let queries: Arc<dyn RegistryQueries> =
            Arc::new(ScanAggregator::new(reader.clone(), config.reads.scan_window));
        let lifecycle = LifecycleManager::new(
            transport,
            reader.clone(),
            config.lifecycle.clone(),
            config.network.explorer_url.clone(),
        );

        info!(
            "Registry adapter initialized for {} (scan window {})",
            config.registry.contract_id, config.reads.scan_window
        );

        Ok(Self {
            config,
            resolver,
            reader,
            queries,
            lifecycle,
            metrics,
        })
    }

    /// Swap the aggregation backend, e.g. for one with native filtering
    pub fn with_queries(mut self, queries: Arc<dyn RegistryQueries>) -> Self {
        self.queries = queries;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registry contract address, resolving it on first use
    pub async fn resolve(&self) -> Option<Address> {
        self.resolver
            .resolve_address(&self.config.registry.contract_id)
            .await
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    pub fn reader(&self) -> &PointReader {
        &self.reader
    }

    pub fn queries(&self) -> &dyn RegistryQueries {
        self.queries.as_ref()
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    pub async fn active_listings(&self) -> Vec<Listing> {
        self.queries.active_listings().await
    }

    pub async fn listings_by_creator(&self, creator: Address) -> Vec<Listing> {
        self.queries.listings_by_creator(creator).await
    }

    pub async fn proposals_by_participant(&self, participant: Address) -> Vec<Proposal> {
        self.queries.proposals_by_participant(participant).await
    }

    pub async fn owned_tokens(&self, owner: Address) -> Vec<TokenId> {
        self.queries.owned_tokens(owner).await
    }

    pub async fn verified_owned_tokens(&self, owner: Address) -> Vec<TokenId> {
        self.queries.verified_owned_tokens(owner).await
    }

    /// User record, the empty record when unregistered or unavailable
    pub async fn user(&self, address: Address) -> User {
        self.reader
            .get_user(address)
            .await
            .unwrap_or_else(|| User::unregistered(address))
    }

    /// Profile view: user record, own listings, proposals and tokens, read concurrently
    pub async fn profile(&self, address: Address) -> ProfileSummary {
        let (user, listings, proposals, tokens) = tokio::join!(
            self.user(address),
            self.queries.listings_by_creator(address),
            self.queries.proposals_by_participant(address),
            self.queries.owned_tokens(address),
        );

        let display_name = user
            .display_name_or(&self.config.lifecycle.default_display_name)
            .to_string();

        ProfileSummary {
            address,
            display_name,
            user,
            listings,
            proposals,
            tokens,
        }
    }
}
