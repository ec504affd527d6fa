//! # SkillSwap Registry Configuration
//!
//! Centralized configuration for the registry client: which network to talk to,
//! where the registry lives, how scans and confirmations behave, and what key
//! signs writes.
//!
//! ## Sources (lowest to highest precedence)
//!
//! 1. Built-in defaults targeting Hedera testnet ([`defaults`])
//! 2. A TOML file (`config/skillswap.toml` unless a path is given)
//! 3. `SKILLSWAP_`-prefixed environment variables, nested with `__`
//!    (`SKILLSWAP_NETWORK__RPC_URL`, `SKILLSWAP_SIGNER__PRIVATE_KEY`)
//!
//! `${VAR}` references inside URLs and the signer key are expanded after loading.
//!
//! ```rust,no_run
//! use registry_config::load_config;
//!
//! let config = load_config(None).unwrap();
//! println!("registry {} via {}", config.registry.contract_id, config.network.rpc_url);
//! ```

pub mod defaults;
pub mod service_config;

pub use service_config::{
    load_config, LifecycleSettings, LoggingSettings, NetworkSettings, ReadSettings,
    RegistryConfig, RegistrySettings, SignerSettings,
};
