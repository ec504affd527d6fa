//! Network boundary to the registry contract
//!
//! Everything above this trait is transport-agnostic: the point reader, the scan
//! aggregator and the lifecycle manager only ever see [`ReadCall`], [`WriteCall`]
//! and raw JSON results. [`crate::rpc_transport::RpcTransport`] is the JSON-RPC
//! implementation; [`crate::testing::ScriptedTransport`] drives tests.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use types::{Address, ListingId, ProposalId, TokenId, TxHash};

/// Read entry points exposed by the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReadCall {
    TotalListings,
    SkillListing(ListingId),
    TotalProposals,
    BarterProposal(ProposalId),
    User(Address),
    UserNfts(Address),
    OwnerOf(TokenId),
}

impl ReadCall {
    /// Contract function name
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::TotalListings => "getTotalListings",
            Self::SkillListing(_) => "getSkillListing",
            Self::TotalProposals => "getTotalProposals",
            Self::BarterProposal(_) => "getBarterProposal",
            Self::User(_) => "getUser",
            Self::UserNfts(_) => "getUserNFTs",
            Self::OwnerOf(_) => "ownerOf",
        }
    }
}

impl std::fmt::Display for ReadCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalListings | Self::TotalProposals => write!(f, "{}()", self.function_name()),
            Self::SkillListing(id) => write!(f, "{}({})", self.function_name(), id),
            Self::BarterProposal(id) => write!(f, "{}({})", self.function_name(), id),
            Self::User(a) | Self::UserNfts(a) => write!(f, "{}({})", self.function_name(), a),
            Self::OwnerOf(id) => write!(f, "{}({})", self.function_name(), id),
        }
    }
}

/// State-changing entry points exposed by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    RegisterUser {
        name: String,
        skills_offered: Vec<String>,
        skills_wanted: Vec<String>,
    },
    CreateSkillListing {
        skill_offered: String,
        skill_wanted: String,
        description: String,
    },
    CreateBarterProposal {
        listing_id: ListingId,
        proposal: String,
    },
    AcceptBarterProposal(ProposalId),
    MarkBarterCompleted(ProposalId),
    RaiseDispute {
        proposal_id: ProposalId,
        reason: String,
    },
}

impl WriteCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::RegisterUser { .. } => "registerUser",
            Self::CreateSkillListing { .. } => "createSkillListing",
            Self::CreateBarterProposal { .. } => "createBarterProposal",
            Self::AcceptBarterProposal(_) => "acceptBarterProposal",
            Self::MarkBarterCompleted(_) => "markBarterCompleted",
            Self::RaiseDispute { .. } => "raiseDispute",
        }
    }

    /// Reject arguments the contract would refuse before anything is signed
    pub fn validate(&self) -> Result<(), String> {
        fn non_blank(field: &str, value: &str) -> Result<(), String> {
            if value.trim().is_empty() {
                Err(format!("{} must not be empty", field))
            } else {
                Ok(())
            }
        }

        match self {
            Self::RegisterUser { name, .. } => non_blank("name", name),
            Self::CreateSkillListing {
                skill_offered,
                skill_wanted,
                description,
            } => {
                non_blank("skill offered", skill_offered)?;
                non_blank("skill wanted", skill_wanted)?;
                non_blank("description", description)
            }
            Self::CreateBarterProposal { listing_id, proposal } => {
                if listing_id.inner() == 0 {
                    return Err("listing id must be at least 1".to_string());
                }
                non_blank("proposal", proposal)
            }
            Self::AcceptBarterProposal(id) | Self::MarkBarterCompleted(id) => {
                if id.inner() == 0 {
                    Err("proposal id must be at least 1".to_string())
                } else {
                    Ok(())
                }
            }
            Self::RaiseDispute { proposal_id, reason } => {
                if proposal_id.inner() == 0 {
                    return Err("proposal id must be at least 1".to_string());
                }
                non_blank("dispute reason", reason)
            }
        }
    }
}

/// What the network reported once a submitted transaction was included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptOutcome {
    Included { block: Option<u64> },
    Reverted { block: Option<u64> },
}

/// Async access to the registry contract
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Perform one read against `contract`, returning the raw result
    async fn read(&self, contract: Address, call: &ReadCall) -> Result<Value, TransportError>;

    /// Sign and broadcast one write, returning its hash once accepted by a node
    async fn submit(&self, contract: Address, call: &WriteCall) -> Result<TxHash, TransportError>;

    /// Inclusion outcome for `hash`, `None` while still pending
    async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptOutcome>, TransportError>;

    /// Address writes are sent from, when a signer is configured
    fn sender(&self) -> Option<Address>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_validation() {
        let empty_listing = WriteCall::CreateSkillListing {
            skill_offered: "Rust".into(),
            skill_wanted: " ".into(),
            description: "pairing".into(),
        };
        assert_eq!(
            empty_listing.validate(),
            Err("skill wanted must not be empty".to_string())
        );

        let proposal = WriteCall::CreateBarterProposal {
            listing_id: ListingId::new(0),
            proposal: "hi".into(),
        };
        assert!(proposal.validate().is_err());

        assert!(WriteCall::AcceptBarterProposal(ProposalId::new(2)).validate().is_ok());
    }

    #[test]
    fn test_read_call_display() {
        assert_eq!(ReadCall::SkillListing(ListingId::new(3)).to_string(), "getSkillListing(3)");
        assert_eq!(ReadCall::TotalProposals.to_string(), "getTotalProposals()");
    }
}
