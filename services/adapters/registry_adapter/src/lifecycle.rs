//! Transaction Lifecycle Manager
//!
//! Every write moves through `Composing -> Submitted(hash) -> Confirmed | Failed`.
//! A write refused before a hash exists (bad arguments, unresolved registry, no
//! signer, signer or node refusal) goes straight from `Composing` to `Failed`.
//!
//! States are published on a `tokio::sync::watch` channel held by the returned
//! [`TxHandle`]; every published state is also appended to the handle's history.
//! Confirmation polling runs on its own task, so the caller may drop the handle
//! without stopping it.

use crate::error::TransportError;
use crate::rpc_client::PointReader;
use crate::transport::{ReceiptOutcome, RegistryTransport, WriteCall};
use parking_lot::Mutex;
use registry_config::LifecycleSettings;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info, warn};
use types::{ListingId, ProposalId, TxHash};

/// Human-readable reason a write ended in [`TxStatus::Failed`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TxFailure {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Registry contract address is unavailable")]
    Unavailable,

    #[error("No signer configured; set signer.private_key to send transactions")]
    NoSigner,

    /// Refused before inclusion, by the signer, the node or a pre-flight revert
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Transaction reverted in block {}", block_label(.block))]
    Reverted { block: Option<u64> },

    #[error("Transaction not confirmed within {0}s")]
    Timeout(u64),
}

fn block_label(block: &Option<u64>) -> String {
    block.map_or_else(|| "unknown".to_string(), |b| b.to_string())
}

impl From<TransportError> for TxFailure {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::NoSigner => Self::NoSigner,
            other => Self::Rejected(other.to_string()),
        }
    }
}

/// Observable state of one write
#[derive(Debug, Clone, PartialEq)]
pub enum TxStatus {
    Composing,
    Submitted(TxHash),
    Confirmed {
        hash: TxHash,
        block: Option<u64>,
    },
    Failed {
        hash: Option<TxHash>,
        reason: TxFailure,
    },
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }

    pub fn hash(&self) -> Option<TxHash> {
        match self {
            Self::Composing => None,
            Self::Submitted(hash) | Self::Confirmed { hash, .. } => Some(*hash),
            Self::Failed { hash, .. } => *hash,
        }
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Composing => f.write_str("composing"),
            Self::Submitted(hash) => write!(f, "submitted {}", hash),
            Self::Confirmed { hash, .. } => write!(f, "confirmed {}", hash),
            Self::Failed { reason, .. } => write!(f, "failed: {}", reason),
        }
    }
}

/// Writer side of a handle: keeps the channel and the history in step
struct StatusPublisher {
    function: &'static str,
    sender: watch::Sender<TxStatus>,
    history: Arc<Mutex<Vec<TxStatus>>>,
}

impl StatusPublisher {
    fn publish(&self, status: TxStatus) {
        match &status {
            TxStatus::Failed { reason, .. } => error!("❌ {} failed: {}", self.function, reason),
            TxStatus::Confirmed { hash, block } => info!(
                "✅ {} confirmed in block {}: {}",
                self.function,
                block.unwrap_or_default(),
                hash
            ),
            other => info!("📤 {} {}", self.function, other),
        }
        self.history.lock().push(status.clone());
        self.sender.send_replace(status);
    }

    fn fail(&self, hash: Option<TxHash>, reason: TxFailure) {
        self.publish(TxStatus::Failed { hash, reason });
    }
}

/// Caller's view of a tracked write
#[derive(Clone)]
pub struct TxHandle {
    function: &'static str,
    status: watch::Receiver<TxStatus>,
    history: Arc<Mutex<Vec<TxStatus>>>,
    explorer_url: String,
}

impl TxHandle {
    /// Contract function this write calls
    pub fn function(&self) -> &'static str {
        self.function
    }

    pub fn status(&self) -> TxStatus {
        self.status.borrow().clone()
    }

    /// Every state published so far, oldest first
    pub fn history(&self) -> Vec<TxStatus> {
        self.history.lock().clone()
    }

    /// Receiver that wakes on each transition
    pub fn subscribe(&self) -> watch::Receiver<TxStatus> {
        self.status.clone()
    }

    /// Derived flag callers watch to refresh dependent views
    pub fn is_confirmed(&self) -> bool {
        matches!(*self.status.borrow(), TxStatus::Confirmed { .. })
    }

    pub fn hash(&self) -> Option<TxHash> {
        self.status.borrow().hash()
    }

    /// `{explorer_url}/transaction/{hash}` once a hash exists
    pub fn explorer_link(&self) -> Option<String> {
        self.hash().map(|hash| {
            format!("{}/transaction/{}", self.explorer_url.trim_end_matches('/'), hash)
        })
    }

    /// Wait for `Confirmed` or `Failed`
    pub async fn wait(&self) -> TxStatus {
        let mut receiver = self.status.clone();
        if receiver.wait_for(TxStatus::is_terminal).await.is_err() {
            // Publisher gone; whatever was last published is final
            debug!("{} tracking ended before a terminal state", self.function);
        }
        self.status()
    }
}

/// Outcome of the register-if-needed pre-step
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationCheck {
    /// `getUser(sender)` reported a registered profile; nothing was sent
    AlreadyRegistered,
    /// A registration write was sent and confirmed
    Registered,
    /// A registration write was attempted and failed; the failure was ignored
    Ignored(TxFailure),
    /// No sender address to check or register
    NoSender,
}

/// Submits writes and tracks them to a terminal state
pub struct LifecycleManager {
    transport: Arc<dyn RegistryTransport>,
    reader: Arc<PointReader>,
    settings: LifecycleSettings,
    explorer_url: String,
}

impl LifecycleManager {
    pub fn new(
        transport: Arc<dyn RegistryTransport>,
        reader: Arc<PointReader>,
        settings: LifecycleSettings,
        explorer_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            reader,
            settings,
            explorer_url: explorer_url.into(),
        }
    }

    /// Submit `call` and start tracking it.
    ///
    /// Returns once the write is submitted or has failed to submit; confirmation
    /// continues in the background.
    pub async fn submit(&self, call: WriteCall) -> TxHandle {
        let function = call.function_name();
        let (sender, receiver) = watch::channel(TxStatus::Composing);
        let history = Arc::new(Mutex::new(vec![TxStatus::Composing]));
        let publisher = StatusPublisher {
            function,
            sender,
            history: history.clone(),
        };
        let handle = TxHandle {
            function,
            status: receiver,
            history,
            explorer_url: self.explorer_url.clone(),
        };

        debug!("Composing {}", function);
        if let Err(reason) = call.validate() {
            publisher.fail(None, TxFailure::InvalidArguments(reason));
            return handle;
        }

        let Some(contract) = self.reader.contract().await else {
            publisher.fail(None, TxFailure::Unavailable);
            return handle;
        };

        match self.transport.submit(contract, &call).await {
            Ok(hash) => {
                publisher.publish(TxStatus::Submitted(hash));
                tokio::spawn(confirm(
                    self.transport.clone(),
                    hash,
                    Duration::from_millis(self.settings.poll_interval_ms),
                    self.settings.confirmation_timeout_secs,
                    publisher,
                ));
            }
            Err(e) => publisher.fail(None, e.into()),
        }

        handle
    }

    pub async fn register_user(
        &self,
        name: &str,
        skills_offered: Vec<String>,
        skills_wanted: Vec<String>,
    ) -> TxHandle {
        self.submit(WriteCall::RegisterUser {
            name: name.trim().to_string(),
            skills_offered,
            skills_wanted,
        })
        .await
    }

    /// [`Self::register_user`] with comma-separated skill text
    pub async fn register_user_from_text(
        &self,
        name: &str,
        skills_offered: &str,
        skills_wanted: &str,
    ) -> TxHandle {
        self.register_user(name, split_skills(skills_offered), split_skills(skills_wanted))
            .await
    }

    pub async fn create_skill_listing(
        &self,
        skill_offered: &str,
        skill_wanted: &str,
        description: &str,
    ) -> TxHandle {
        self.submit(WriteCall::CreateSkillListing {
            skill_offered: skill_offered.trim().to_string(),
            skill_wanted: skill_wanted.trim().to_string(),
            description: description.trim().to_string(),
        })
        .await
    }

    pub async fn create_barter_proposal(&self, listing_id: ListingId, proposal: &str) -> TxHandle {
        self.submit(WriteCall::CreateBarterProposal {
            listing_id,
            proposal: proposal.trim().to_string(),
        })
        .await
    }

    pub async fn accept_barter_proposal(&self, proposal_id: ProposalId) -> TxHandle {
        self.submit(WriteCall::AcceptBarterProposal(proposal_id)).await
    }

    pub async fn mark_barter_completed(&self, proposal_id: ProposalId) -> TxHandle {
        self.submit(WriteCall::MarkBarterCompleted(proposal_id)).await
    }

    pub async fn raise_dispute(&self, proposal_id: ProposalId, reason: &str) -> TxHandle {
        self.submit(WriteCall::RaiseDispute {
            proposal_id,
            reason: reason.trim().to_string(),
        })
        .await
    }

    /// Register the sender under the default display name unless already registered.
    ///
    /// A registered profile skips the write. Otherwise a registration is sent and
    /// awaited; its failure is reported but never stops the caller, since a revert
    /// here usually means a registration that the read could not see yet.
    pub async fn ensure_registered(
        &self,
        skills_offered: Vec<String>,
        skills_wanted: Vec<String>,
    ) -> RegistrationCheck {
        let Some(sender) = self.transport.sender() else {
            return RegistrationCheck::NoSender;
        };

        match self.reader.get_user(sender).await {
            Some(user) if user.is_registered => {
                debug!("{} already registered, skipping registration", sender.short());
                return RegistrationCheck::AlreadyRegistered;
            }
            Some(_) => debug!("{} not registered yet", sender.short()),
            None => debug!("Registration state of {} unknown", sender.short()),
        }

        let handle = self
            .register_user(&self.settings.default_display_name, skills_offered, skills_wanted)
            .await;
        match handle.wait().await {
            TxStatus::Confirmed { .. } => RegistrationCheck::Registered,
            TxStatus::Failed { reason, .. } => {
                warn!("Ignoring failed pre-registration: {}", reason);
                RegistrationCheck::Ignored(reason)
            }
            other => RegistrationCheck::Ignored(TxFailure::Rejected(other.to_string())),
        }
    }

    /// Create a listing, registering the sender first if needed
    pub async fn create_listing_ensuring_registered(
        &self,
        skill_offered: &str,
        skill_wanted: &str,
        description: &str,
    ) -> TxHandle {
        let offered = non_empty_label(skill_offered);
        let wanted = non_empty_label(skill_wanted);
        let check = self.ensure_registered(offered, wanted).await;
        debug!("Pre-registration: {:?}", check);

        self.create_skill_listing(skill_offered, skill_wanted, description)
            .await
    }
}

/// Poll for inclusion until the receipt arrives or the deadline passes
async fn confirm(
    transport: Arc<dyn RegistryTransport>,
    hash: TxHash,
    poll_interval: Duration,
    timeout_secs: u64,
    publisher: StatusPublisher,
) {
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);

    loop {
        match transport.receipt(hash).await {
            Ok(Some(ReceiptOutcome::Included { block })) => {
                publisher.publish(TxStatus::Confirmed { hash, block });
                return;
            }
            Ok(Some(ReceiptOutcome::Reverted { block })) => {
                publisher.fail(Some(hash), TxFailure::Reverted { block });
                return;
            }
            Ok(None) => {}
            Err(e) => warn!("Error checking receipt for {}: {}", hash, e),
        }

        if Instant::now() >= deadline {
            publisher.fail(Some(hash), TxFailure::Timeout(timeout_secs));
            return;
        }
        sleep(poll_interval).await;
    }
}

/// Split comma-separated skill text, trimming entries and dropping empty ones
pub fn split_skills(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_label(label: &str) -> Vec<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_skills() {
        assert_eq!(
            split_skills(" Rust, Go ,, guitar ,"),
            vec!["Rust".to_string(), "Go".to_string(), "guitar".to_string()]
        );
        assert!(split_skills(" , ").is_empty());
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            TxFailure::Reverted { block: Some(7) }.to_string(),
            "Transaction reverted in block 7"
        );
        assert_eq!(
            TxFailure::from(TransportError::NoSigner),
            TxFailure::NoSigner
        );
        assert!(matches!(
            TxFailure::from(TransportError::Rejected("user denied".into())),
            TxFailure::Rejected(_)
        ));
    }

    #[test]
    fn test_terminal_states() {
        let hash = TxHash::from_bytes([1; 32]);
        assert!(!TxStatus::Composing.is_terminal());
        assert!(!TxStatus::Submitted(hash).is_terminal());
        assert!(TxStatus::Confirmed { hash, block: None }.is_terminal());
        assert_eq!(TxStatus::Submitted(hash).hash(), Some(hash));
    }
}
