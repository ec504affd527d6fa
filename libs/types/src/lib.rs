//! # SkillSwap Registry Types
//!
//! Immutable snapshots of the entities held by the on-chain registry plus the
//! identifiers used to address them.
//!
//! ## Design Philosophy
//!
//! - **Remote Source of Truth**: Nothing here is mutated locally. Every record is a
//!   snapshot of one point read and is replaced wholesale by the next read.
//! - **Type Safety**: Listing, proposal and token ids are distinct types so a
//!   proposal id can never be passed where a listing id is expected.
//! - **Byte Addresses**: Addresses are stored as 20 raw bytes, which makes equality
//!   case-insensitive with respect to their hex rendering.
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Address, ListingId};
//!
//! let creator: Address = "0x00000000000000000000000000000000006D3993".parse().unwrap();
//! assert_eq!(creator.to_string(), "0x00000000000000000000000000000000006d3993");
//! assert_eq!(ListingId::new(3).inner(), 3);
//! ```

pub mod common;
pub mod records;

pub use common::errors::ValidationError;
pub use common::identifiers::{Address, ListingId, ProposalId, TokenId, TxHash};
pub use records::{Listing, Proposal, User};
