//! Scan aggregation over a scripted registry

use registry_adapter::testing::{listing_value, ScriptedDirectory, ScriptedTransport};
use registry_adapter::{ReadCall, RegistryAdapter, TransportError};
use registry_config::RegistryConfig;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use types::{Address, Listing, ListingId, Proposal, ProposalId, TokenId, User};

const REGISTRY: Address = Address::from_bytes([0x6d; 20]);
const ALICE: Address = Address::from_bytes([0xab; 20]);
const BOB: Address = Address::from_bytes([0xcd; 20]);
const CAROL: Address = Address::from_bytes([0xef; 20]);

fn adapter_with_window(transport: Arc<ScriptedTransport>, scan_window: usize) -> RegistryAdapter {
    let mut config = RegistryConfig::default();
    config.reads.scan_window = scan_window;
    let directory =
        Arc::new(ScriptedDirectory::new().with_entry(&config.registry.contract_id, REGISTRY));
    RegistryAdapter::with_transport(config, transport, directory).unwrap()
}

fn adapter(transport: Arc<ScriptedTransport>) -> RegistryAdapter {
    adapter_with_window(transport, 1)
}

fn listing(id: u64, creator: Address, is_active: bool) -> Listing {
    Listing {
        id: ListingId::new(id),
        creator,
        skill_offered: format!("skill-{}", id),
        skill_wanted: "Rust".to_string(),
        description: format!("listing {}", id),
        is_active,
        created_at: 1_700_000_000 + id,
    }
}

fn proposal(id: u64, proposer: Address, acceptor: Address) -> Proposal {
    Proposal {
        id: ProposalId::new(id),
        listing_id: ListingId::new(1),
        proposer,
        acceptor,
        proposal: format!("offer {}", id),
        status: 0,
    }
}

fn ids(listings: &[Listing]) -> Vec<u64> {
    listings.iter().map(|l| l.id.inner()).collect()
}

/// Mixed-case rendering of an address, as some relays return it
fn upper_hex(address: &Address) -> String {
    format!("0x{}", address.to_hex()[2..].to_uppercase())
}

#[tokio::test]
async fn test_listings_by_creator_skips_inactive() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_listings(&[
        listing(1, ALICE, true),
        listing(2, ALICE, false),
        listing(3, ALICE, true),
    ]);
    let adapter = adapter(transport);

    let by_alice = adapter.listings_by_creator(ALICE).await;
    assert_eq!(ids(&by_alice), vec![1, 3]);

    // Alice created every active listing, so both views agree
    assert_eq!(adapter.active_listings().await, by_alice);
}

#[tokio::test]
async fn test_listings_by_creator_is_subset_of_active() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_listings(&[
        listing(1, ALICE, true),
        listing(2, BOB, true),
        listing(3, ALICE, false),
        listing(4, BOB, true),
        listing(5, ALICE, true),
    ]);
    let adapter = adapter(transport);

    let active = adapter.active_listings().await;
    assert_eq!(ids(&active), vec![1, 2, 4, 5]);

    for creator in [ALICE, BOB, CAROL] {
        let mine = adapter.listings_by_creator(creator).await;
        assert!(mine.iter().all(|l| active.contains(l)));
        assert!(mine.iter().all(|l| l.creator == creator));
    }
    assert!(adapter.listings_by_creator(CAROL).await.is_empty());
}

#[tokio::test]
async fn test_proposals_by_participant() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_proposals(&[
        proposal(1, BOB, ALICE),
        proposal(2, BOB, CAROL),
        proposal(3, CAROL, BOB),
        proposal(4, ALICE, Address::ZERO),
        proposal(5, CAROL, BOB),
    ]);
    let adapter = adapter(transport);

    let touching_alice = adapter.proposals_by_participant(ALICE).await;
    let found: Vec<u64> = touching_alice.iter().map(|p| p.id.inner()).collect();
    assert_eq!(found, vec![1, 4]);
}

#[tokio::test]
async fn test_address_match_ignores_case() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.set_read(ReadCall::TotalListings, json!(["2"]));
    // Creator rendered upper-case on the wire
    transport.set_read(
        ReadCall::SkillListing(ListingId::new(1)),
        json!([["1", upper_hex(&ALICE), "Go", "Rust", "pairing", true, "10"]]),
    );
    transport.set_read(
        ReadCall::SkillListing(ListingId::new(2)),
        listing_value(&listing(2, ALICE, true)),
    );
    let adapter = adapter(transport);

    let lower: Address = ALICE.to_hex().parse().unwrap();
    let upper: Address = upper_hex(&ALICE).parse().unwrap();

    let by_lower = adapter.listings_by_creator(lower).await;
    let by_upper = adapter.listings_by_creator(upper).await;
    assert_eq!(ids(&by_lower), vec![1, 2]);
    assert_eq!(by_lower, by_upper);
}

#[tokio::test]
async fn test_decode_failure_does_not_stop_scan() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_listings(&[
        listing(1, ALICE, true),
        listing(2, ALICE, true),
        listing(3, ALICE, true),
        listing(4, ALICE, true),
    ]);
    transport.set_read(ReadCall::SkillListing(ListingId::new(2)), json!(42));
    transport.fail_read(
        ReadCall::SkillListing(ListingId::new(3)),
        TransportError::Reverted("execution reverted".into()),
    );
    let adapter = adapter(transport);

    assert_eq!(ids(&adapter.active_listings().await), vec![1, 4]);
    assert_eq!(adapter.metrics().skipped_ids, 2);
}

#[tokio::test]
async fn test_keyed_and_positional_results_mix_in_one_scan() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.set_read(ReadCall::TotalListings, json!(["2"]));
    transport.set_read(
        ReadCall::SkillListing(ListingId::new(1)),
        listing_value(&listing(1, BOB, true)),
    );
    transport.set_read(
        ReadCall::SkillListing(ListingId::new(2)),
        json!({
            "id": "2",
            "creator": BOB.to_hex(),
            "skillOffered": "skill-2",
            "skillWanted": "Rust",
            "description": "listing 2",
            "isActive": true,
            "createdAt": "1700000002",
        }),
    );
    let adapter = adapter(transport);

    let listings = adapter.listings_by_creator(BOB).await;
    assert_eq!(listings, vec![listing(1, BOB, true), listing(2, BOB, true)]);
}

#[tokio::test(start_paused = true)]
async fn test_windowed_scan_keeps_ascending_order() {
    let transport = Arc::new(ScriptedTransport::new());
    let scripted: Vec<Listing> = (1..=7).map(|id| listing(id, ALICE, id != 5)).collect();
    transport.script_listings(&scripted);
    transport.set_read(ReadCall::SkillListing(ListingId::new(6)), json!(42));
    // Lower ids answer last, so every window completes in reverse
    for id in 1..=7u64 {
        transport.delay_read(
            ReadCall::SkillListing(ListingId::new(id)),
            Duration::from_millis((8 - id) * 10),
        );
    }
    let adapter = adapter_with_window(transport.clone(), 3);

    assert_eq!(ids(&adapter.active_listings().await), vec![1, 2, 3, 4, 7]);
    // One counter read, one read per id
    assert_eq!(transport.reads().len(), 8);

    let completed: Vec<ReadCall> = transport
        .completed_reads()
        .into_iter()
        .filter(|call| matches!(call, ReadCall::SkillListing(_)))
        .collect();
    assert_eq!(
        completed[..3],
        [3, 2, 1].map(|id| ReadCall::SkillListing(ListingId::new(id)))
    );
    assert_eq!(adapter.metrics().skipped_ids, 1);
}

#[tokio::test]
async fn test_unreadable_proposal_status_still_matches_participant() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.set_read(ReadCall::TotalProposals, json!(["2"]));
    transport.set_read(
        ReadCall::BarterProposal(ProposalId::new(1)),
        json!({
            "id": "1",
            "listingId": "n/a",
            "proposer": ALICE.to_hex(),
            "acceptor": ALICE.to_hex(),
            "proposal": "x",
            "status": "Pending",
        }),
    );
    transport.set_read(
        ReadCall::BarterProposal(ProposalId::new(2)),
        json!({"id": "2", "proposer": BOB.to_hex(), "status": "Accepted"}),
    );
    let adapter = adapter(transport);

    let found = adapter.proposals_by_participant(ALICE).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ProposalId::new(1));
    assert_eq!(found[0].status, 0);

    let metrics = adapter.metrics();
    assert_eq!(metrics.decode_failures, 0);
    assert_eq!(metrics.skipped_ids, 0);
}

#[tokio::test]
async fn test_failed_counter_yields_empty_scan() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.fail_read(
        ReadCall::TotalProposals,
        TransportError::Network("connection refused".into()),
    );
    let adapter = adapter(transport.clone());

    assert!(adapter.proposals_by_participant(ALICE).await.is_empty());
    assert_eq!(transport.reads(), vec![ReadCall::TotalProposals]);
}

#[tokio::test]
async fn test_owned_tokens_single_read() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.set_read(ReadCall::UserNfts(ALICE), json!([["3", "9"]]));
    let adapter = adapter(transport.clone());

    assert_eq!(
        adapter.owned_tokens(ALICE).await,
        vec![TokenId::new(3), TokenId::new(9)]
    );
    assert_eq!(transport.reads().len(), 1);

    // Unscripted owner: the read fails and the view is empty
    assert!(adapter.owned_tokens(BOB).await.is_empty());
}

#[tokio::test]
async fn test_verified_owned_tokens_checks_current_owner() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.set_read(ReadCall::UserNfts(ALICE), json!([["1", "2", "3"]]));
    transport.set_read(ReadCall::OwnerOf(TokenId::new(1)), json!([upper_hex(&ALICE)]));
    transport.set_read(ReadCall::OwnerOf(TokenId::new(2)), json!([BOB.to_hex()]));
    // token 3: ownerOf unscripted, so it fails and the token is dropped
    let adapter = adapter(transport.clone());

    assert_eq!(adapter.verified_owned_tokens(ALICE).await, vec![TokenId::new(1)]);

    // Ownership is re-read every time
    adapter.verified_owned_tokens(ALICE).await;
    assert_eq!(transport.read_count(&ReadCall::OwnerOf(TokenId::new(1))), 2);
}

#[tokio::test]
async fn test_unregistered_profile_is_empty() {
    let transport = Arc::new(ScriptedTransport::new());
    // Never registered, but the relay echoes leftover field values
    transport.set_read(
        ReadCall::User(CAROL),
        json!([["ghost", ["Rust"], ["Go"], "9", false, "4"]]),
    );
    transport.script_listings(&[listing(1, ALICE, true)]);
    transport.script_proposals(&[]);
    transport.set_read(ReadCall::UserNfts(CAROL), json!([[]]));
    let adapter = adapter(transport);

    let profile = adapter.profile(CAROL).await;
    assert!(!profile.is_registered());
    assert_eq!(profile.user, User::unregistered(CAROL));
    assert!(profile.user.skills_offered.is_empty());
    assert!(profile.user.skills_wanted.is_empty());
    assert_eq!(profile.user.reputation, 0);
    assert_eq!(profile.display_name, "SkillSwap User");
    assert!(profile.listings.is_empty());
    assert!(profile.proposals.is_empty());
    assert!(profile.tokens.is_empty());
}

#[tokio::test]
async fn test_registered_profile_gathers_all_views() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.script_user(&User {
        address: ALICE,
        name: "Alice".to_string(),
        skills_offered: vec!["Rust".to_string(), "Go".to_string()],
        skills_wanted: vec!["Guitar".to_string()],
        reputation: 12,
        is_registered: true,
        total_trades: 3,
    });
    transport.script_listings(&[
        listing(1, ALICE, true),
        listing(2, BOB, true),
        listing(3, ALICE, true),
    ]);
    transport.script_proposals(&[proposal(1, BOB, ALICE), proposal(2, BOB, CAROL)]);
    transport.set_read(ReadCall::UserNfts(ALICE), json!([["7"]]));
    let adapter = adapter(transport);

    let profile = adapter.profile(ALICE).await;
    assert!(profile.is_registered());
    assert_eq!(profile.display_name, "Alice");
    assert_eq!(profile.user.skills_offered, vec!["Rust", "Go"]);
    assert_eq!(profile.user.reputation, 12);
    assert_eq!(ids(&profile.listings), vec![1, 3]);
    assert_eq!(profile.proposals.len(), 1);
    assert_eq!(profile.tokens, vec![TokenId::new(7)]);
}
