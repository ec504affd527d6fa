//! Write lifecycle over a scripted registry

use registry_adapter::testing::{ScriptedDirectory, ScriptedTransport, SubmitScript};
use registry_adapter::{
    RegistrationCheck, RegistryAdapter, TransportError, TxFailure, TxStatus, WriteCall,
};
use registry_config::RegistryConfig;
use std::sync::Arc;
use types::{Address, ListingId, ProposalId, User};

const REGISTRY: Address = Address::from_bytes([0x6d; 20]);
const SENDER: Address = Address::from_bytes([0x5e; 20]);

fn adapter(transport: Arc<ScriptedTransport>) -> RegistryAdapter {
    let mut config = RegistryConfig::default();
    config.lifecycle.poll_interval_ms = 10;
    config.lifecycle.confirmation_timeout_secs = 5;
    let directory =
        Arc::new(ScriptedDirectory::new().with_entry(&config.registry.contract_id, REGISTRY));
    RegistryAdapter::with_transport(config, transport, directory).unwrap()
}

fn signing_transport() -> Arc<ScriptedTransport> {
    Arc::new(ScriptedTransport::new().with_sender(SENDER))
}

fn saw_submitted(history: &[TxStatus]) -> bool {
    history.iter().any(|s| matches!(s, TxStatus::Submitted(_)))
}

#[tokio::test]
async fn test_signer_rejection_never_reaches_submitted() {
    let transport = signing_transport();
    transport.script_submit(
        "createSkillListing",
        SubmitScript::Reject(TransportError::Rejected("user denied signature".into())),
    );
    let adapter = adapter(transport);

    let handle = adapter
        .lifecycle()
        .create_skill_listing("Rust", "Go", "pairing sessions")
        .await;

    let status = handle.wait().await;
    assert!(matches!(
        status,
        TxStatus::Failed {
            hash: None,
            reason: TxFailure::Rejected(_)
        }
    ));
    assert!(!saw_submitted(&handle.history()));
    assert_eq!(handle.history().len(), 2);
    assert!(!handle.is_confirmed());
    assert_eq!(handle.explorer_link(), None);
}

#[tokio::test]
async fn test_missing_signer_fails_with_reason() {
    let adapter = adapter(Arc::new(ScriptedTransport::new()));

    let handle = adapter
        .lifecycle()
        .accept_barter_proposal(ProposalId::new(1))
        .await;
    let status = handle.wait().await;
    assert_eq!(
        status,
        TxStatus::Failed {
            hash: None,
            reason: TxFailure::NoSigner
        }
    );
    assert!(status.to_string().contains("private_key"));
}

#[tokio::test]
async fn test_invalid_arguments_fail_before_submission() {
    let transport = signing_transport();
    let adapter = adapter(transport.clone());

    let handle = adapter.lifecycle().create_skill_listing("Rust", "Go", "  ").await;
    assert!(matches!(
        handle.status(),
        TxStatus::Failed {
            reason: TxFailure::InvalidArguments(_),
            ..
        }
    ));

    let handle = adapter
        .lifecycle()
        .create_barter_proposal(ListingId::new(0), "trade?")
        .await;
    assert!(matches!(
        handle.status(),
        TxStatus::Failed {
            reason: TxFailure::InvalidArguments(_),
            ..
        }
    ));

    assert!(transport.submitted().is_empty());
}

#[tokio::test]
async fn test_confirmed_after_pending_polls() {
    let transport = signing_transport();
    transport.script_submit("markBarterCompleted", SubmitScript::Include { pending_polls: 3 });
    let adapter = adapter(transport);

    let handle = adapter
        .lifecycle()
        .mark_barter_completed(ProposalId::new(2))
        .await;
    let hash = handle.hash().expect("submitted write has a hash");

    let status = handle.wait().await;
    assert_eq!(
        status,
        TxStatus::Confirmed {
            hash,
            block: Some(1)
        }
    );
    assert!(handle.is_confirmed());
    assert_eq!(
        handle.history(),
        vec![
            TxStatus::Composing,
            TxStatus::Submitted(hash),
            TxStatus::Confirmed {
                hash,
                block: Some(1)
            },
        ]
    );
    assert_eq!(
        handle.explorer_link(),
        Some(format!("https://hashscan.io/testnet/transaction/{}", hash))
    );
}

#[tokio::test]
async fn test_revert_on_inclusion_fails_with_hash() {
    let transport = signing_transport();
    transport.script_submit("raiseDispute", SubmitScript::Revert);
    let adapter = adapter(transport);

    let handle = adapter
        .lifecycle()
        .raise_dispute(ProposalId::new(3), "no show")
        .await;
    let status = handle.wait().await;

    assert!(matches!(
        status,
        TxStatus::Failed {
            hash: Some(_),
            reason: TxFailure::Reverted { block: Some(1) }
        }
    ));
    assert!(saw_submitted(&handle.history()));
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_write_times_out() {
    let transport = signing_transport();
    transport.script_submit("acceptBarterProposal", SubmitScript::NeverInclude);
    let adapter = adapter(transport);

    let handle = adapter
        .lifecycle()
        .accept_barter_proposal(ProposalId::new(4))
        .await;
    let status = handle.wait().await;

    assert!(matches!(
        status,
        TxStatus::Failed {
            hash: Some(_),
            reason: TxFailure::Timeout(5)
        }
    ));
}

#[tokio::test]
async fn test_subscriber_sees_terminal_state() {
    let transport = signing_transport();
    let adapter = adapter(transport);

    let handle = adapter
        .lifecycle()
        .create_barter_proposal(ListingId::new(1), "lessons for lessons")
        .await;
    let mut updates = handle.subscribe();
    let confirmed = updates
        .wait_for(|status| status.is_terminal())
        .await
        .map(|status| matches!(*status, TxStatus::Confirmed { .. }))
        .unwrap_or(false);
    assert!(confirmed);
}

#[tokio::test]
async fn test_failed_pre_registration_is_ignored() {
    let transport = signing_transport();
    // getUser(sender) unscripted: registration state unknown
    transport.script_submit(
        "registerUser",
        SubmitScript::Reject(TransportError::Reverted(
            "execution reverted: User already registered".into(),
        )),
    );
    let adapter = adapter(transport.clone());

    let handle = adapter
        .lifecycle()
        .create_listing_ensuring_registered("Rust", "Go", "pairing sessions")
        .await;
    assert!(handle.wait().await.is_terminal());
    assert!(handle.is_confirmed());

    assert_eq!(
        transport.submitted(),
        vec![
            WriteCall::RegisterUser {
                name: "SkillSwap User".to_string(),
                skills_offered: vec!["Rust".to_string()],
                skills_wanted: vec!["Go".to_string()],
            },
            WriteCall::CreateSkillListing {
                skill_offered: "Rust".to_string(),
                skill_wanted: "Go".to_string(),
                description: "pairing sessions".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_registered_sender_skips_registration() {
    let transport = signing_transport();
    transport.script_user(&User {
        name: "Sam".to_string(),
        skills_offered: vec!["Rust".to_string()],
        is_registered: true,
        ..User::unregistered(SENDER)
    });
    let adapter = adapter(transport.clone());

    let check = adapter
        .lifecycle()
        .ensure_registered(vec!["Rust".into()], vec![])
        .await;
    assert_eq!(check, RegistrationCheck::AlreadyRegistered);
    assert!(transport.submitted().is_empty());

    let handle = adapter
        .lifecycle()
        .create_listing_ensuring_registered("Rust", "Go", "pairing")
        .await;
    handle.wait().await;
    assert_eq!(transport.submitted().len(), 1);
    assert_eq!(transport.submitted()[0].function_name(), "createSkillListing");
}

#[tokio::test]
async fn test_unregistered_sender_is_registered_first() {
    let transport = signing_transport();
    transport.script_user(&User::unregistered(SENDER));
    let adapter = adapter(transport.clone());

    let check = adapter
        .lifecycle()
        .ensure_registered(vec!["Rust".into()], vec![])
        .await;
    assert_eq!(check, RegistrationCheck::Registered);
    assert_eq!(transport.submitted()[0].function_name(), "registerUser");
}

#[tokio::test]
async fn test_register_from_comma_separated_text() {
    let transport = signing_transport();
    let adapter = adapter(transport.clone());

    let handle = adapter
        .lifecycle()
        .register_user_from_text(" Ada ", "Rust, Go,,", " guitar ")
        .await;
    handle.wait().await;

    assert_eq!(
        transport.submitted(),
        vec![WriteCall::RegisterUser {
            name: "Ada".to_string(),
            skills_offered: vec!["Rust".to_string(), "Go".to_string()],
            skills_wanted: vec!["guitar".to_string()],
        }]
    );
}
