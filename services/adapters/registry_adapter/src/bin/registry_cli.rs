//! SkillSwap Registry CLI
//!
//! Query the registry and send writes from the command line. Reads print JSON;
//! writes wait for confirmation and print the explorer link.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use registry_adapter::{split_skills, RegistryAdapter, TxHandle, TxStatus};
use registry_config::{load_config, RegistryConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::{Address, ListingId, ProposalId};

#[derive(Parser)]
#[command(name = "registry_cli")]
#[command(about = "Read and write the SkillSwap registry")]
struct Args {
    /// Configuration file path (defaults to config/skillswap.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the effective configuration, key redacted
    ShowConfig,
    /// Resolve the registry id to its contract address
    Resolve,
    /// All active listings
    Listings,
    /// Active listings created by an address
    ListingsBy { creator: String },
    /// Proposals where an address is proposer or acceptor
    ProposalsBy { participant: String },
    /// Raw user record
    User { address: String },
    /// Profile view: user, listings, proposals, tokens
    Profile { address: String },
    /// Achievement tokens held by an address
    Tokens {
        owner: String,
        /// Keep only tokens whose current owner is still `owner`
        #[arg(long)]
        verify: bool,
    },
    /// Register the signer
    Register {
        name: String,
        /// Comma-separated skills offered
        #[arg(long, default_value = "")]
        offered: String,
        /// Comma-separated skills wanted
        #[arg(long, default_value = "")]
        wanted: String,
    },
    /// Create a skill listing
    CreateListing {
        offered: String,
        wanted: String,
        description: String,
        /// Register under the default display name first if needed
        #[arg(long)]
        ensure_registered: bool,
    },
    /// Propose a barter against a listing
    Propose { listing_id: u64, proposal: String },
    /// Accept a barter proposal
    Accept { proposal_id: u64 },
    /// Mark a barter as completed
    Complete { proposal_id: u64 },
    /// Raise a dispute on a barter
    Dispute { proposal_id: u64, reason: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    init_logging(&config, args.debug)?;

    info!("🚀 SkillSwap registry CLI");
    let adapter = RegistryAdapter::new(config.clone())?;

    let result = run(&adapter, &config, args.command).await;
    info!("📊 Read metrics: {:?}", adapter.metrics());
    result
}

fn init_logging(config: &RegistryConfig, debug: bool) -> Result<()> {
    let default_directive = if debug {
        "registry_adapter=debug,codec=debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_directive))
        .context("Invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn run(adapter: &RegistryAdapter, config: &RegistryConfig, command: Command) -> Result<()> {
    let lifecycle = adapter.lifecycle();

    match command {
        Command::ShowConfig => {
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Resolve => match adapter.resolve().await {
            Some(address) => {
                println!("{} -> {}", config.registry.contract_id, address);
                Ok(())
            }
            None => bail!("Could not resolve registry {}", config.registry.contract_id),
        },
        Command::Listings => print_json(&adapter.active_listings().await),
        Command::ListingsBy { creator } => {
            print_json(&adapter.listings_by_creator(parse_address(&creator)?).await)
        }
        Command::ProposalsBy { participant } => {
            print_json(&adapter.proposals_by_participant(parse_address(&participant)?).await)
        }
        Command::User { address } => print_json(&adapter.user(parse_address(&address)?).await),
        Command::Profile { address } => {
            print_json(&adapter.profile(parse_address(&address)?).await)
        }
        Command::Tokens { owner, verify } => {
            let owner = parse_address(&owner)?;
            let tokens = if verify {
                adapter.verified_owned_tokens(owner).await
            } else {
                adapter.owned_tokens(owner).await
            };
            print_json(&tokens)
        }
        Command::Register {
            name,
            offered,
            wanted,
        } => {
            let handle = lifecycle
                .register_user(&name, split_skills(&offered), split_skills(&wanted))
                .await;
            finish(handle).await
        }
        Command::CreateListing {
            offered,
            wanted,
            description,
            ensure_registered,
        } => {
            let handle = if ensure_registered {
                lifecycle
                    .create_listing_ensuring_registered(&offered, &wanted, &description)
                    .await
            } else {
                lifecycle
                    .create_skill_listing(&offered, &wanted, &description)
                    .await
            };
            finish(handle).await
        }
        Command::Propose {
            listing_id,
            proposal,
        } => {
            let listing_id = ListingId::new_validated(listing_id)?;
            finish(lifecycle.create_barter_proposal(listing_id, &proposal).await).await
        }
        Command::Accept { proposal_id } => {
            let proposal_id = ProposalId::new_validated(proposal_id)?;
            finish(lifecycle.accept_barter_proposal(proposal_id).await).await
        }
        Command::Complete { proposal_id } => {
            let proposal_id = ProposalId::new_validated(proposal_id)?;
            finish(lifecycle.mark_barter_completed(proposal_id).await).await
        }
        Command::Dispute {
            proposal_id,
            reason,
        } => {
            let proposal_id = ProposalId::new_validated(proposal_id)?;
            finish(lifecycle.raise_dispute(proposal_id, &reason).await).await
        }
    }
}

fn parse_address(input: &str) -> Result<Address> {
    input
        .parse()
        .with_context(|| format!("Invalid address {}", input))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Wait for the terminal state and report it
async fn finish(handle: TxHandle) -> Result<()> {
    if let Some(hash) = handle.hash() {
        info!("⏳ Waiting for {} {}", handle.function(), hash);
    }

    let status = handle.wait().await;
    if let Some(link) = handle.explorer_link() {
        println!("{}", link);
    }

    match status {
        TxStatus::Confirmed { hash, block } => {
            println!(
                "{} confirmed in block {}: {}",
                handle.function(),
                block.map_or_else(|| "?".to_string(), |b| b.to_string()),
                hash
            );
            Ok(())
        }
        TxStatus::Failed { reason, .. } => bail!("{} failed: {}", handle.function(), reason),
        other => bail!("{} ended in unexpected state {}", handle.function(), other),
    }
}
