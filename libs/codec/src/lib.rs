//! # SkillSwap Registry Codec
//!
//! Turns whatever a contract read returned into one canonical typed record.
//!
//! The same logical struct can reach this layer in two shapes:
//!
//! ```text
//! Positional: ["1", "0xabc…", "Rust", "Design", "pair on a CLI", true, "1700000000"]
//! Keyed:      {"id": "1", "creator": "0xabc…", "skillOffered": "Rust", …}
//! ```
//!
//! ABI token decoding yields the positional shape; JSON relays and mirror services
//! yield the keyed one, sometimes with numeric keys mixed in. Shape detection
//! happens exactly once per decode ([`RawRecord::detect`]) and every field is then
//! read name-first, position-second through a [`FieldReader`].
//!
//! Decoding never fails loudly: [`decode`] returns `None` for anything it cannot
//! normalize so a scan can skip the record and carry on.
//!
//! ```rust
//! use codec::decode;
//! use serde_json::json;
//! use types::{Listing, ListingId};
//!
//! let listing: Option<Listing> = decode(
//!     json!({"creator": "0x00000000000000000000000000000000006d3993", "isActive": true}),
//!     &ListingId::new(9),
//! );
//! assert_eq!(listing.unwrap().id, ListingId::new(9));
//! ```

pub mod coerce;
pub mod error;
pub mod raw;
pub mod records;

pub use error::DecodeError;
pub use raw::{FieldReader, RawRecord};
pub use records::{decode, decode_address, decode_counter, decode_token_ids, Record, RecordKind};
