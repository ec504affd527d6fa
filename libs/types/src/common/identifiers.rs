//! # Registry Identifiers
//!
//! Two families of identifiers are used against the registry:
//!
//! ### 1. Byte identifiers
//! - [`Address`]: 20-byte account or contract address
//! - [`TxHash`]: 32-byte transaction hash returned by a submitted write
//!
//! Both parse from `0x`-prefixed (or bare) hex in any letter case and always render
//! as lowercase `0x` hex, so two spellings of the same address compare equal.
//!
//! ### 2. Typed sequential ids
//! - [`ListingId`], [`ProposalId`], [`TokenId`]
//!
//! Listing and proposal ids are dense: assigned from 1 up to the matching counter
//! with no gaps or reuse. Wrapping them keeps the two id spaces from mixing.
//!
//! ```rust
//! use types::{Address, ProposalId};
//!
//! let upper: Address = "0xABCDEF0000000000000000000000000000000001".parse().unwrap();
//! let lower: Address = "0xabcdef0000000000000000000000000000000001".parse().unwrap();
//! assert_eq!(upper, lower);
//! assert_eq!(upper.short(), "0xabcd...0001");
//!
//! let proposal = ProposalId::new(4);
//! assert_eq!(proposal.to_string(), "4");
//! ```

use crate::common::errors::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

fn decode_hex_bytes<const N: usize>(input: &str) -> Result<[u8; N], String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != N * 2 {
        return Err(format!("expected {} hex digits, got {}", N * 2, digits.len()));
    }

    let mut bytes = [0u8; N];
    hex::decode_to_slice(digits, &mut bytes).map_err(|e| e.to_string())?;
    Ok(bytes)
}

macro_rules! define_hex_identifier {
    (
        $(#[$meta:meta])*
        $name:ident, $len:expr, $err:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Length of the identifier in bytes
            pub const LEN: usize = $len;

            /// All-zero identifier
            pub const ZERO: Self = Self([0u8; $len]);

            /// Wrap raw bytes
            #[inline(always)]
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes
            #[inline(always)]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Whether every byte is zero
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }

            /// Lowercase `0x` hex rendering
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_hex_bytes::<$len>(s)
                    .map(Self)
                    .map_err(|reason| ValidationError::$err {
                        input: s.to_string(),
                        reason,
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_hex_identifier!(
    /// 20-byte network address of an account or contract
    Address, 20, InvalidAddress
);

define_hex_identifier!(
    /// Hash identifying a submitted transaction
    TxHash, 32, InvalidHash
);

impl Address {
    /// Abbreviated `0x1234...abcd` form used in listings and profile headers
    pub fn short(&self) -> String {
        let full = self.to_hex();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

macro_rules! define_typed_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new typed ID
            #[inline(always)]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Create a typed ID, rejecting the never-assigned zero id
            pub fn new_validated(id: u64) -> Result<Self, ValidationError> {
                if id == 0 {
                    return Err(ValidationError::NullId);
                }
                Ok(Self(id))
            }

            /// Extract the inner value
            #[inline(always)]
            pub const fn inner(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let id = s.trim().parse::<u64>().map_err(|_| ValidationError::InvalidId {
                    input: s.to_string(),
                })?;
                Self::new_validated(id)
            }
        }
    };
}

define_typed_id!(
    /// Skill listing id, dense from 1 up to the total-listings counter
    ListingId
);

define_typed_id!(
    /// Barter proposal id, dense from 1 up to the total-proposals counter
    ProposalId
);

define_typed_id!(
    /// Achievement token id
    TokenId
);
