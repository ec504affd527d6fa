//! Registry id to contract address resolution
//!
//! The registry is addressed by a human-facing id (`0.0.7158163`); calls need the
//! EVM address behind it. A directory service maps one to the other. Successful
//! lookups are cached for the lifetime of the [`AddressResolver`], failures are
//! not, so the next call retries.

use crate::error::ResolveError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use types::Address;

/// Directory service mapping registry ids to EVM addresses
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    async fn lookup(&self, registry_id: &str) -> Result<Address, ResolveError>;
}

/// Hedera mirror node REST lookup (`GET /api/v1/contracts/{id}`)
pub struct MirrorNodeLookup {
    client: reqwest::Client,
    base_url: String,
}

impl MirrorNodeLookup {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create directory HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DirectoryLookup for MirrorNodeLookup {
    async fn lookup(&self, registry_id: &str) -> Result<Address, ResolveError> {
        let url = format!("{}/api/v1/contracts/{}", self.base_url, registry_id);
        debug!("Directory lookup: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ResolveError::Decode(e.to_string()))?;

        parse_evm_address(&body)
    }
}

/// Pull `evm_address` out of a mirror node contract record
fn parse_evm_address(body: &Value) -> Result<Address, ResolveError> {
    let raw = body
        .get("evm_address")
        .and_then(Value::as_str)
        .filter(|s| s.starts_with("0x"))
        .ok_or_else(|| ResolveError::Decode("evm_address absent or not 0x-prefixed".into()))?;

    raw.parse()
        .map_err(|e: types::ValidationError| ResolveError::Decode(e.to_string()))
}

/// Process-scoped resolved-address cache.
///
/// Created empty, filled at most once per registry id on a successful lookup,
/// dropped with its owner. Concurrent first calls may both query the directory;
/// they store the same value.
pub struct AddressResolver {
    directory: Arc<dyn DirectoryLookup>,
    cache: DashMap<String, Address>,
    lookups: AtomicU64,
}

impl AddressResolver {
    pub fn new(directory: Arc<dyn DirectoryLookup>) -> Self {
        Self {
            directory,
            cache: DashMap::new(),
            lookups: AtomicU64::new(0),
        }
    }

    /// Pin `registry_id` to a known address; the directory is never asked for it
    pub fn seed(&self, registry_id: &str, address: Address) {
        info!("📌 Registry {} pinned to {}", registry_id.trim(), address);
        self.cache.insert(registry_id.trim().to_string(), address);
    }

    /// Cached address for `registry_id`, without a lookup
    pub fn cached(&self, registry_id: &str) -> Option<Address> {
        self.cache.get(registry_id.trim()).map(|entry| *entry)
    }

    /// Resolve `registry_id`, querying the directory only on a cache miss
    pub async fn resolve_address(&self, registry_id: &str) -> Option<Address> {
        let key = registry_id.trim();
        if let Some(address) = self.cached(key) {
            return Some(address);
        }

        self.lookups.fetch_add(1, Ordering::Relaxed);
        match self.directory.lookup(key).await {
            Ok(address) => {
                info!("🔍 Resolved registry {} -> {}", key, address);
                self.cache.insert(key.to_string(), address);
                Some(address)
            }
            Err(e) => {
                warn!("Failed to resolve registry {}: {}", key, e);
                None
            }
        }
    }

    /// Directory lookups issued so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
