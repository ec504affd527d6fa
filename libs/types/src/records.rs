//! Entity snapshots returned by registry point reads
//!
//! Each struct mirrors one contract return shape. Field order in these structs is
//! the canonical positional order the contract uses for its tuples.

use crate::common::identifiers::{Address, ListingId, ProposalId};
use serde::{Deserialize, Serialize};

/// Registered participant, keyed by network address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Address the record was read for (not part of the contract tuple)
    pub address: Address,

    /// Display name chosen at registration
    pub name: String,

    /// Skills the user offers, in registration order
    pub skills_offered: Vec<String>,

    /// Skills the user wants, in registration order
    pub skills_wanted: Vec<String>,

    /// Reputation score maintained by the contract
    pub reputation: u128,

    /// Whether the address has ever registered
    pub is_registered: bool,

    /// Completed trades counter
    pub total_trades: u128,
}

impl User {
    /// Empty profile for an address that never registered
    pub fn unregistered(address: Address) -> Self {
        Self {
            address,
            name: String::new(),
            skills_offered: Vec::new(),
            skills_wanted: Vec::new(),
            reputation: 0,
            is_registered: false,
            total_trades: 0,
        }
    }

    /// Drop every field of a never-registered address.
    ///
    /// The contract returns a zeroed struct for unknown addresses but nothing stops
    /// a relay from echoing leftovers, so an unregistered record is always reset.
    pub fn normalized(self) -> Self {
        if self.is_registered {
            self
        } else {
            Self::unregistered(self.address)
        }
    }

    /// Name to show, falling back when the stored name is blank
    pub fn display_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            fallback
        } else {
            trimmed
        }
    }
}

/// Skill listing offered by a creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub creator: Address,
    pub skill_offered: String,
    pub skill_wanted: String,
    pub description: String,
    /// Inactive listings stay readable but never appear in browse views
    pub is_active: bool,
    /// Creation time, seconds since epoch
    pub created_at: u64,
}

/// Barter proposal made against a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub listing_id: ListingId,
    pub proposer: Address,
    pub acceptor: Address,
    pub proposal: String,
    /// Lifecycle status code, interpreted only by the contract
    pub status: u64,
}

impl Proposal {
    /// Whether `participant` is the proposer or the acceptor
    pub fn involves(&self, participant: &Address) -> bool {
        self.proposer == *participant || self.acceptor == *participant
    }
}
