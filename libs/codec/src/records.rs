//! Per-kind record decoding
//!
//! Each [`Record`] impl names its fields in canonical positional order. Field
//! lookup goes through [`FieldReader::field`], which tries the name before the
//! position, so the same impl handles positional, keyed and mixed shapes.

use crate::coerce;
use crate::error::DecodeError;
use crate::raw::{FieldReader, RawRecord};
use serde_json::Value;
use tracing::debug;
use types::{Address, Listing, ListingId, Proposal, ProposalId, TokenId, User};

/// Entity kinds the registry returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    User,
    Listing,
    Proposal,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Listing => f.write_str("listing"),
            Self::Proposal => f.write_str("proposal"),
        }
    }
}

/// A typed record decodable from a raw read result
pub trait Record: Sized {
    /// Key the record was requested by; fills fields the contract tuple omits
    type Key: Clone + std::fmt::Display;

    const KIND: RecordKind;

    /// Field names in the contract's positional order
    const FIELDS: &'static [&'static str];

    fn from_fields(fields: FieldReader<'_>, key: &Self::Key) -> Result<Self, DecodeError>;
}

/// Decode `value` as `R`, or `None` when it cannot be normalized.
///
/// Never panics and never returns an error: a malformed record is logged and
/// skipped by the caller.
pub fn decode<R: Record>(value: Value, key: &R::Key) -> Option<R> {
    let result = RawRecord::detect(value).and_then(|raw| R::from_fields(raw.reader(), key));
    match result {
        Ok(record) => Some(record),
        Err(e) => {
            debug!("Failed to decode {} {}: {}", R::KIND, key, e);
            None
        }
    }
}

/// Position of `name` in `R::FIELDS`
fn position<R: Record>(name: &'static str) -> usize {
    R::FIELDS
        .iter()
        .position(|field| *field == name)
        .unwrap_or(usize::MAX)
}

fn get<'a, R: Record>(fields: &FieldReader<'a>, name: &'static str) -> Option<&'a Value> {
    fields.field(name, position::<R>(name))
}

fn require<'a, R: Record>(
    fields: &FieldReader<'a>,
    name: &'static str,
) -> Result<&'a Value, DecodeError> {
    get::<R>(fields, name).ok_or(DecodeError::MissingField {
        field: name,
        position: position::<R>(name),
    })
}

/// Optional integer field; an unreadable value reads as 0 instead of failing the record
fn lenient_uint64<R: Record>(
    fields: &FieldReader<'_>,
    name: &'static str,
    key: &R::Key,
) -> u64 {
    match get::<R>(fields, name).map(coerce::uint64).transpose() {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            debug!("Ignoring {} of {} {}: {}", name, R::KIND, key, e);
            0
        }
    }
}

fn invalid(field: &'static str) -> impl FnOnce(String) -> DecodeError {
    move |reason| DecodeError::InvalidField { field, reason }
}

impl Record for User {
    type Key = Address;
    const KIND: RecordKind = RecordKind::User;
    const FIELDS: &'static [&'static str] = &[
        "name",
        "skillsOffered",
        "skillsWanted",
        "reputation",
        "isRegistered",
        "totalTrades",
    ];

    fn from_fields(fields: FieldReader<'_>, key: &Address) -> Result<Self, DecodeError> {
        let counter = |name: &'static str| -> Result<u128, DecodeError> {
            get::<Self>(&fields, name)
                .map(coerce::uint)
                .transpose()
                .map_err(invalid(name))
                .map(Option::unwrap_or_default)
        };

        let user = User {
            address: *key,
            name: coerce::text(get::<Self>(&fields, "name")),
            skills_offered: coerce::text_list(get::<Self>(&fields, "skillsOffered")),
            skills_wanted: coerce::text_list(get::<Self>(&fields, "skillsWanted")),
            reputation: counter("reputation")?,
            is_registered: coerce::boolean(get::<Self>(&fields, "isRegistered"))
                .map_err(invalid("isRegistered"))?,
            total_trades: counter("totalTrades")?,
        };
        Ok(user.normalized())
    }
}

impl Record for Listing {
    type Key = ListingId;
    const KIND: RecordKind = RecordKind::Listing;
    const FIELDS: &'static [&'static str] = &[
        "id",
        "creator",
        "skillOffered",
        "skillWanted",
        "description",
        "isActive",
        "createdAt",
    ];

    fn from_fields(fields: FieldReader<'_>, key: &ListingId) -> Result<Self, DecodeError> {
        let id = match get::<Self>(&fields, "id") {
            Some(v) => ListingId::new(coerce::uint64(v).map_err(invalid("id"))?),
            None => *key,
        };
        let created_at = match get::<Self>(&fields, "createdAt") {
            Some(v) => coerce::uint64(v).map_err(invalid("createdAt"))?,
            None => 0,
        };

        Ok(Listing {
            id,
            creator: coerce::address(require::<Self>(&fields, "creator")?)
                .map_err(invalid("creator"))?,
            skill_offered: coerce::text(get::<Self>(&fields, "skillOffered")),
            skill_wanted: coerce::text(get::<Self>(&fields, "skillWanted")),
            description: coerce::text(get::<Self>(&fields, "description")),
            is_active: coerce::boolean(get::<Self>(&fields, "isActive"))
                .map_err(invalid("isActive"))?,
            created_at,
        })
    }
}

impl Record for Proposal {
    type Key = ProposalId;
    const KIND: RecordKind = RecordKind::Proposal;
    const FIELDS: &'static [&'static str] = &[
        "id",
        "listingId",
        "proposer",
        "acceptor",
        "proposal",
        "status",
    ];

    fn from_fields(fields: FieldReader<'_>, key: &ProposalId) -> Result<Self, DecodeError> {
        let id = match get::<Self>(&fields, "id") {
            Some(v) => ProposalId::new(coerce::uint64(v).map_err(invalid("id"))?),
            None => *key,
        };
        let listing_id = lenient_uint64::<Self>(&fields, "listingId", key);
        // Unset until someone accepts; the contract reports the zero address
        let acceptor = get::<Self>(&fields, "acceptor")
            .map(coerce::address)
            .transpose()
            .map_err(invalid("acceptor"))?
            .unwrap_or(Address::ZERO);
        let status = lenient_uint64::<Self>(&fields, "status", key);

        Ok(Proposal {
            id,
            listing_id: ListingId::new(listing_id),
            proposer: coerce::address(require::<Self>(&fields, "proposer")?)
                .map_err(invalid("proposer"))?,
            acceptor,
            proposal: coerce::text(get::<Self>(&fields, "proposal")),
            status,
        })
    }
}

/// Strip the single-output wrapper some transports put around scalar results
fn unwrap_single(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    }
}

/// Counter result (`getTotalListings`, `getTotalProposals`)
pub fn decode_counter(value: &Value) -> Option<u64> {
    match coerce::uint64(unwrap_single(value)) {
        Ok(total) => Some(total),
        Err(e) => {
            debug!("Failed to decode counter: {}", e);
            None
        }
    }
}

/// Address result (`ownerOf`)
pub fn decode_address(value: &Value) -> Option<Address> {
    match coerce::address(unwrap_single(value)) {
        Ok(address) => Some(address),
        Err(e) => {
            debug!("Failed to decode address: {}", e);
            None
        }
    }
}

/// Token id list (`getUserNFTs`). Entries that are not integers are dropped.
pub fn decode_token_ids(value: &Value) -> Option<Vec<TokenId>> {
    let items = match value {
        Value::Array(items) if items.len() == 1 && items[0].is_array() => items[0].as_array()?,
        Value::Array(items) => items,
        other => {
            debug!("Token id list has unexpected shape: {}", other);
            return None;
        }
    };

    let ids = items
        .iter()
        .filter_map(|item| match coerce::uint64(item) {
            Ok(id) => Some(TokenId::new(id)),
            Err(e) => {
                debug!("Skipping undecodable token id: {}", e);
                None
            }
        })
        .collect();
    Some(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CREATOR: &str = "0x00000000000000000000000000000000006d3993";

    fn listing_positional() -> Value {
        json!(["2", CREATOR, "Rust", "Design", "pair on a CLI", true, "1700000000"])
    }

    fn listing_keyed() -> Value {
        json!({
            "id": 2,
            "creator": CREATOR.to_uppercase().replace("0X", "0x"),
            "skillOffered": "Rust",
            "skillWanted": "Design",
            "description": "pair on a CLI",
            "isActive": true,
            "createdAt": "0x6553f100"
        })
    }

    #[test]
    fn test_positional_and_keyed_listing_agree() {
        let a: Listing = decode(listing_positional(), &ListingId::new(2)).unwrap();
        let b: Listing = decode(listing_keyed(), &ListingId::new(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.created_at, 1_700_000_000);
        assert!(a.is_active);
    }

    #[test]
    fn test_mixed_shape_uses_numeric_keys() {
        let value = json!({"0": "5", "1": CREATOR, "skillOffered": "Go", "5": false});
        let listing: Listing = decode(value, &ListingId::new(5)).unwrap();
        assert_eq!(listing.id, ListingId::new(5));
        assert_eq!(listing.skill_offered, "Go");
        assert!(!listing.is_active);
        assert_eq!(listing.description, "");
    }

    #[test]
    fn test_missing_id_falls_back_to_requested() {
        let listing: Listing = decode(json!({"creator": CREATOR}), &ListingId::new(11)).unwrap();
        assert_eq!(listing.id, ListingId::new(11));
        assert_eq!(listing.created_at, 0);
    }

    #[test]
    fn test_unrecognized_shapes_are_absent() {
        assert!(decode::<Listing>(json!("garbage"), &ListingId::new(1)).is_none());
        assert!(decode::<Listing>(json!(42), &ListingId::new(1)).is_none());
        assert!(decode::<Listing>(Value::Null, &ListingId::new(1)).is_none());
        // Missing creator cannot be defaulted
        assert!(decode::<Listing>(json!({"id": 1}), &ListingId::new(1)).is_none());
        assert!(decode::<Listing>(json!(["1", "not-an-address"]), &ListingId::new(1)).is_none());
    }

    #[test]
    fn test_unregistered_user_decodes_empty() {
        let key: Address = CREATOR.parse().unwrap();
        let user: User = decode(
            json!(["leftover", ["Rust"], ["Go"], "77", false, "4"]),
            &key,
        )
        .unwrap();
        assert!(!user.is_registered);
        assert!(user.skills_offered.is_empty());
        assert_eq!(user.reputation, 0);
        assert_eq!(user.address, key);
    }

    #[test]
    fn test_registered_user_keeps_fields() {
        let key: Address = CREATOR.parse().unwrap();
        let user: User = decode(
            json!({"name": "Ada", "skillsOffered": ["Rust"], "skillsWanted": [],
                   "reputation": 100, "isRegistered": true, "totalTrades": "3"}),
            &key,
        )
        .unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.skills_offered, vec!["Rust"]);
        assert_eq!(user.reputation, 100);
        assert_eq!(user.total_trades, 3);
    }

    #[test]
    fn test_proposal_without_acceptor() {
        let proposal: Proposal = decode(
            json!(["3", "1", CREATOR, null, "swap lessons", 0]),
            &ProposalId::new(3),
        )
        .unwrap();
        assert_eq!(proposal.acceptor, Address::ZERO);
        assert_eq!(proposal.listing_id, ListingId::new(1));
        assert_eq!(proposal.proposal, "swap lessons");
    }

    #[test]
    fn test_proposal_tolerates_unreadable_status_and_listing() {
        let proposal: Proposal = decode(
            json!({"id": "1", "listingId": "n/a", "proposer": CREATOR, "acceptor": CREATOR,
                   "proposal": "x", "status": "Pending"}),
            &ProposalId::new(1),
        )
        .unwrap();
        assert_eq!(proposal.id, ProposalId::new(1));
        assert_eq!(proposal.listing_id, ListingId::new(0));
        assert_eq!(proposal.status, 0);
        assert_eq!(proposal.proposer, CREATOR.parse().unwrap());

        // Participants are still required
        assert!(decode::<Proposal>(
            json!({"id": "1", "proposer": "nobody", "status": "Pending"}),
            &ProposalId::new(1)
        )
        .is_none());
    }

    #[test]
    fn test_scalar_helpers() {
        assert_eq!(decode_counter(&json!("0x03")), Some(3));
        assert_eq!(decode_counter(&json!(["7"])), Some(7));
        assert_eq!(decode_counter(&json!({"total": 1})), None);
        assert_eq!(decode_address(&json!([CREATOR])), CREATOR.parse().ok());
        assert_eq!(
            decode_token_ids(&json!([["1", 2, "bad"]])),
            Some(vec![TokenId::new(1), TokenId::new(2)])
        );
        assert_eq!(decode_token_ids(&json!("1")), None);
    }
}
