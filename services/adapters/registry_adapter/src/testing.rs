//! In-memory transport and directory for exercising the adapter without a network
//!
//! [`ScriptedTransport`] answers reads from a table keyed by [`ReadCall`], records
//! every submitted write, and plays back scripted inclusion outcomes.
//! [`ScriptedDirectory`] answers registry lookups and counts them.

use crate::error::{ResolveError, TransportError};
use crate::resolver::DirectoryLookup;
use crate::transport::{ReadCall, ReceiptOutcome, RegistryTransport, WriteCall};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use types::{Address, Listing, Proposal, TxHash, User};

/// How a scripted write behaves
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitScript {
    /// Accepted, then included after `pending_polls` empty receipt polls
    Include { pending_polls: u32 },
    /// Accepted, then reverted on inclusion
    Revert,
    /// Accepted, never included
    NeverInclude,
    /// Refused before a hash exists
    Reject(TransportError),
}

#[derive(Debug)]
struct PendingReceipt {
    polls_left: u32,
    outcome: Option<ReceiptOutcome>,
}

/// Scripted [`RegistryTransport`]
pub struct ScriptedTransport {
    reads: Mutex<HashMap<ReadCall, Result<Value, TransportError>>>,
    read_log: Mutex<Vec<ReadCall>>,
    read_delays: Mutex<HashMap<ReadCall, Duration>>,
    completed_reads: Mutex<Vec<ReadCall>>,
    submit_scripts: Mutex<HashMap<&'static str, SubmitScript>>,
    submitted: Mutex<Vec<WriteCall>>,
    receipts: Mutex<HashMap<TxHash, PendingReceipt>>,
    next_hash: AtomicU64,
    sender: Option<Address>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Transport without a signer; every unscripted read fails
    pub fn new() -> Self {
        Self {
            reads: Mutex::new(HashMap::new()),
            read_log: Mutex::new(Vec::new()),
            read_delays: Mutex::new(HashMap::new()),
            completed_reads: Mutex::new(Vec::new()),
            submit_scripts: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            receipts: Mutex::new(HashMap::new()),
            next_hash: AtomicU64::new(1),
            sender: None,
        }
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn set_read(&self, call: ReadCall, value: Value) {
        self.reads.lock().insert(call, Ok(value));
    }

    /// Hold the answer to `call` for `delay` (tokio time, so paused clocks apply)
    pub fn delay_read(&self, call: ReadCall, delay: Duration) {
        self.read_delays.lock().insert(call, delay);
    }

    pub fn fail_read(&self, call: ReadCall, error: TransportError) {
        self.reads.lock().insert(call, Err(error));
    }

    /// Script `getTotalListings` plus one positional `getSkillListing` per listing
    pub fn script_listings(&self, listings: &[Listing]) {
        self.set_read(ReadCall::TotalListings, json!([listings.len().to_string()]));
        for listing in listings {
            self.set_read(ReadCall::SkillListing(listing.id), listing_value(listing));
        }
    }

    /// Script `getTotalProposals` plus one positional `getBarterProposal` per proposal
    pub fn script_proposals(&self, proposals: &[Proposal]) {
        self.set_read(ReadCall::TotalProposals, json!([proposals.len().to_string()]));
        for proposal in proposals {
            self.set_read(ReadCall::BarterProposal(proposal.id), proposal_value(proposal));
        }
    }

    pub fn script_user(&self, user: &User) {
        self.set_read(ReadCall::User(user.address), user_value(user));
    }

    /// Behaviour of every write to `function` (e.g. `"registerUser"`)
    pub fn script_submit(&self, function: &'static str, script: SubmitScript) {
        self.submit_scripts.lock().insert(function, script);
    }

    /// Writes accepted or refused so far, in submission order
    pub fn submitted(&self) -> Vec<WriteCall> {
        self.submitted.lock().clone()
    }

    /// Reads issued so far, in order
    pub fn reads(&self) -> Vec<ReadCall> {
        self.read_log.lock().clone()
    }

    /// Reads answered so far, in completion order
    pub fn completed_reads(&self) -> Vec<ReadCall> {
        self.completed_reads.lock().clone()
    }

    pub fn read_count(&self, call: &ReadCall) -> usize {
        self.read_log.lock().iter().filter(|c| *c == call).count()
    }

    fn fresh_hash(&self) -> TxHash {
        let n = self.next_hash.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        TxHash::from_bytes(bytes)
    }
}

#[async_trait]
impl RegistryTransport for ScriptedTransport {
    async fn read(&self, _contract: Address, call: &ReadCall) -> Result<Value, TransportError> {
        self.read_log.lock().push(call.clone());
        let delay = self.read_delays.lock().get(call).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.completed_reads.lock().push(call.clone());
        self.reads
            .lock()
            .get(call)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Network(format!("no script for {}", call))))
    }

    async fn submit(&self, _contract: Address, call: &WriteCall) -> Result<TxHash, TransportError> {
        if self.sender.is_none() {
            return Err(TransportError::NoSigner);
        }
        self.submitted.lock().push(call.clone());

        let script = self
            .submit_scripts
            .lock()
            .get(call.function_name())
            .cloned()
            .unwrap_or(SubmitScript::Include { pending_polls: 0 });

        let (polls_left, outcome) = match script {
            SubmitScript::Reject(error) => return Err(error),
            SubmitScript::Include { pending_polls } => (
                pending_polls,
                Some(ReceiptOutcome::Included { block: Some(1) }),
            ),
            SubmitScript::Revert => (0, Some(ReceiptOutcome::Reverted { block: Some(1) })),
            SubmitScript::NeverInclude => (0, None),
        };

        let hash = self.fresh_hash();
        self.receipts
            .lock()
            .insert(hash, PendingReceipt { polls_left, outcome });
        Ok(hash)
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptOutcome>, TransportError> {
        let mut receipts = self.receipts.lock();
        let Some(pending) = receipts.get_mut(&hash) else {
            return Ok(None);
        };
        if pending.polls_left > 0 {
            pending.polls_left -= 1;
            return Ok(None);
        }
        Ok(pending.outcome)
    }

    fn sender(&self) -> Option<Address> {
        self.sender
    }
}

/// `getSkillListing` result in the single-output positional shape
pub fn listing_value(listing: &Listing) -> Value {
    json!([[
        listing.id.inner().to_string(),
        listing.creator.to_hex(),
        listing.skill_offered,
        listing.skill_wanted,
        listing.description,
        listing.is_active,
        listing.created_at.to_string(),
    ]])
}

/// `getBarterProposal` result in the single-output positional shape
pub fn proposal_value(proposal: &Proposal) -> Value {
    json!([[
        proposal.id.inner().to_string(),
        proposal.listing_id.inner().to_string(),
        proposal.proposer.to_hex(),
        proposal.acceptor.to_hex(),
        proposal.proposal,
        proposal.status.to_string(),
    ]])
}

/// `getUser` result in the single-output positional shape
pub fn user_value(user: &User) -> Value {
    json!([[
        user.name,
        user.skills_offered,
        user.skills_wanted,
        user.reputation.to_string(),
        user.is_registered,
        user.total_trades.to_string(),
    ]])
}

/// Scripted [`DirectoryLookup`]
pub struct ScriptedDirectory {
    entries: Mutex<HashMap<String, Address>>,
    available: AtomicBool,
    lookups: AtomicU64,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            lookups: AtomicU64::new(0),
        }
    }

    pub fn with_entry(self, registry_id: &str, address: Address) -> Self {
        self.entries.lock().insert(registry_id.to_string(), address);
        self
    }

    /// Toggle a directory outage; lookups answer HTTP 503 while unavailable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for ScriptedDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryLookup for ScriptedDirectory {
    async fn lookup(&self, registry_id: &str) -> Result<Address, ResolveError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if !self.available.load(Ordering::Relaxed) {
            return Err(ResolveError::Status(503));
        }
        self.entries
            .lock()
            .get(registry_id)
            .copied()
            .ok_or(ResolveError::Status(404))
    }
}
