//! JSON-RPC transport for the registry contract
//!
//! Reads go through `eth_call` on the primary endpoint. Writes are filled, signed
//! locally and broadcast as raw transactions, falling back to the backup endpoints
//! in order when the primary refuses or times out.

use crate::error::TransportError;
use crate::transport::{ReadCall, ReceiptOutcome, RegistryTransport, WriteCall};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::abi::{Abi, Function, Token};
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Bytes, TransactionRequest, H160, H256, U256};
use registry_config::{NetworkSettings, SignerSettings};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use types::{Address, TxHash};
use url::Url;

/// Registry contract ABI
const SKILLSWAP_ABI: &str = include_str!("../abi/skillswap.json");

/// ethers-backed [`RegistryTransport`]
pub struct RpcTransport {
    abi: Abi,
    primary_provider: Arc<Provider<Http>>,
    backup_providers: Vec<Arc<Provider<Http>>>,
    wallet: Option<LocalWallet>,
    request_timeout: Duration,
}

impl RpcTransport {
    /// Build providers sharing one pooled HTTP client, plus the signer if a key is set
    pub fn new(network: &NetworkSettings, signer: &SignerSettings) -> Result<Self> {
        let abi: Abi = serde_json::from_str(SKILLSWAP_ABI).context("Invalid registry ABI")?;
        let request_timeout = Duration::from_millis(network.request_timeout_ms);

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(5)
            .timeout(request_timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let url: Url = network.rpc_url.parse().context("Invalid primary RPC URL")?;
        let primary_provider = Arc::new(Provider::new(Http::new_with_client(
            url,
            http_client.clone(),
        )));

        let backup_providers: Result<Vec<_>> = network
            .backup_rpc_urls
            .iter()
            .map(|url| {
                let parsed_url: Url = url.parse().context("Invalid backup RPC URL")?;
                let http_transport = Http::new_with_client(parsed_url, http_client.clone());
                Ok(Arc::new(Provider::new(http_transport)))
            })
            .collect();
        let backup_providers = backup_providers?;

        let wallet = match &signer.private_key {
            Some(key) => {
                let wallet = key
                    .trim()
                    .trim_start_matches("0x")
                    .parse::<LocalWallet>()
                    .context("Invalid private key format")?
                    .with_chain_id(network.chain_id);
                info!("🔑 Signer configured: {:#x}", wallet.address());
                Some(wallet)
            }
            None => {
                info!("No signer configured, writes are unavailable");
                None
            }
        };

        info!("✅ RPC transport ready");
        info!("   - Primary RPC: {}", network.rpc_url);
        info!("   - Backup RPCs: {}", backup_providers.len());

        Ok(Self {
            abi,
            primary_provider,
            backup_providers,
            wallet,
            request_timeout,
        })
    }

    fn function(&self, name: &str) -> Result<&Function, TransportError> {
        self.abi
            .function(name)
            .map_err(|e| TransportError::Decode(format!("{}: {}", name, e)))
    }

    fn timeout_ms(&self) -> u64 {
        self.request_timeout.as_millis() as u64
    }

    /// Broadcast a signed transaction, primary first then each backup
    async fn broadcast(&self, raw_tx: Bytes) -> Result<H256, TransportError> {
        let providers = std::iter::once(&self.primary_provider).chain(&self.backup_providers);
        let mut last_error = TransportError::Network("no RPC providers configured".to_string());

        for (i, provider) in providers.enumerate() {
            match timeout(self.request_timeout, provider.send_raw_transaction(raw_tx.clone())).await
            {
                Ok(Ok(pending_tx)) => {
                    let tx_hash = pending_tx.tx_hash();
                    info!("✅ Transaction submitted via RPC {}: {:#x}", i, tx_hash);
                    return Ok(tx_hash);
                }
                Ok(Err(e)) => {
                    warn!("RPC {} refused transaction: {}", i, e);
                    last_error = TransportError::from_rpc_message(e.to_string());
                    // A revert is the contract's answer; other endpoints will agree
                    if matches!(last_error, TransportError::Reverted(_)) {
                        break;
                    }
                }
                Err(_) => {
                    warn!("RPC {} timeout while submitting", i);
                    last_error = TransportError::Timeout(self.timeout_ms());
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl RegistryTransport for RpcTransport {
    async fn read(&self, contract: Address, call: &ReadCall) -> Result<Value, TransportError> {
        let function = self.function(call.function_name())?;
        let data = function
            .encode_input(&read_arguments(call))
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        let tx: TypedTransaction = TransactionRequest::new()
            .to(to_h160(&contract))
            .data(data)
            .into();

        let output = match timeout(self.request_timeout, self.primary_provider.call(&tx, None)).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(TransportError::from_rpc_message(e.to_string())),
            Err(_) => return Err(TransportError::Timeout(self.timeout_ms())),
        };

        let tokens = function
            .decode_output(&output)
            .map_err(|e| TransportError::Decode(format!("{}: {}", call, e)))?;
        debug!("{} returned {} output(s)", call, tokens.len());

        Ok(Value::Array(tokens.into_iter().map(token_to_json).collect()))
    }

    async fn submit(&self, contract: Address, call: &WriteCall) -> Result<TxHash, TransportError> {
        let wallet = self.wallet.as_ref().ok_or(TransportError::NoSigner)?;
        let function = self.function(call.function_name())?;
        let data = function
            .encode_input(&write_arguments(call))
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        let mut typed_tx: TypedTransaction = TransactionRequest::new()
            .from(wallet.address())
            .to(to_h160(&contract))
            .data(data)
            .chain_id(wallet.chain_id())
            .into();

        // Nonce, gas and price; gas estimation surfaces contract reverts here
        match timeout(
            self.request_timeout,
            self.primary_provider.fill_transaction(&mut typed_tx, None),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TransportError::from_rpc_message(e.to_string())),
            Err(_) => return Err(TransportError::Timeout(self.timeout_ms())),
        }

        let signature = wallet
            .sign_transaction(&typed_tx)
            .await
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        let raw_tx = typed_tx.rlp_signed(&signature);

        let tx_hash = self.broadcast(raw_tx).await?;
        Ok(TxHash::from_bytes(tx_hash.0))
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptOutcome>, TransportError> {
        let receipt = self
            .primary_provider
            .get_transaction_receipt(H256::from(*hash.as_bytes()))
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(receipt.map(|receipt| {
            let block = receipt.block_number.map(|b| b.as_u64());
            match receipt.status.map(|s| s.as_u64()) {
                Some(0) => ReceiptOutcome::Reverted { block },
                _ => ReceiptOutcome::Included { block },
            }
        }))
    }

    fn sender(&self) -> Option<Address> {
        self.wallet
            .as_ref()
            .map(|wallet| Address::from_bytes(wallet.address().0))
    }
}

fn to_h160(address: &Address) -> H160 {
    H160::from(*address.as_bytes())
}

fn uint(id: u64) -> Token {
    Token::Uint(U256::from(id))
}

fn string_array(items: &[String]) -> Token {
    Token::Array(items.iter().cloned().map(Token::String).collect())
}

fn read_arguments(call: &ReadCall) -> Vec<Token> {
    match call {
        ReadCall::TotalListings | ReadCall::TotalProposals => Vec::new(),
        ReadCall::SkillListing(id) => vec![uint(id.inner())],
        ReadCall::BarterProposal(id) => vec![uint(id.inner())],
        ReadCall::OwnerOf(id) => vec![uint(id.inner())],
        ReadCall::User(address) | ReadCall::UserNfts(address) => {
            vec![Token::Address(to_h160(address))]
        }
    }
}

fn write_arguments(call: &WriteCall) -> Vec<Token> {
    match call {
        WriteCall::RegisterUser {
            name,
            skills_offered,
            skills_wanted,
        } => vec![
            Token::String(name.clone()),
            string_array(skills_offered),
            string_array(skills_wanted),
        ],
        WriteCall::CreateSkillListing {
            skill_offered,
            skill_wanted,
            description,
        } => vec![
            Token::String(skill_offered.clone()),
            Token::String(skill_wanted.clone()),
            Token::String(description.clone()),
        ],
        WriteCall::CreateBarterProposal { listing_id, proposal } => {
            vec![uint(listing_id.inner()), Token::String(proposal.clone())]
        }
        WriteCall::AcceptBarterProposal(id) | WriteCall::MarkBarterCompleted(id) => {
            vec![uint(id.inner())]
        }
        WriteCall::RaiseDispute { proposal_id, reason } => {
            vec![uint(proposal_id.inner()), Token::String(reason.clone())]
        }
    }
}

/// Convert decoded ABI output into the JSON shape the codec consumes.
///
/// Tuples become positional arrays, integers become decimal strings so nothing
/// wider than 64 bits is lost.
fn token_to_json(token: Token) -> Value {
    match token {
        Token::Address(address) => Value::String(format!("0x{}", hex::encode(address.as_bytes()))),
        Token::Uint(value) | Token::Int(value) => Value::String(value.to_string()),
        Token::Bool(flag) => Value::Bool(flag),
        Token::String(text) => Value::String(text),
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            Value::Array(items.into_iter().map(token_to_json).collect())
        }
    }
}
