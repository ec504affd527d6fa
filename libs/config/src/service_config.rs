//! Registry Client Configuration Module
//!
//! Loads [`RegistryConfig`] from TOML with environment overrides. Every section
//! has defaults, so a partial file (or none at all) is valid.

use crate::defaults::*;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main registry client configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub network: NetworkSettings,
    pub registry: RegistrySettings,
    pub reads: ReadSettings,
    pub lifecycle: LifecycleSettings,
    pub signer: SignerSettings,
    pub logging: LoggingSettings,
}

/// RPC endpoint settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NetworkSettings {
    /// Primary JSON-RPC endpoint
    pub rpc_url: String,

    /// Tried in order when the primary endpoint fails a submission
    pub backup_rpc_urls: Vec<String>,

    pub chain_id: u64,

    /// Per-request timeout for reads and submissions
    pub request_timeout_ms: u64,

    /// Explorer base URL; transaction links are `{explorer_url}/transaction/{hash}`
    pub explorer_url: String,
}

/// Where the registry contract lives
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RegistrySettings {
    /// Human-facing registry id (`shard.realm.num`)
    pub contract_id: String,

    /// Directory service resolving `contract_id` to an EVM address
    pub directory_url: String,

    /// Skip directory lookup and use this EVM address directly
    pub evm_address: Option<String>,
}

/// Aggregation scan behaviour
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReadSettings {
    /// Point reads in flight per scan; 1 scans strictly one id at a time
    pub scan_window: usize,
}

/// Transaction lifecycle behaviour
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LifecycleSettings {
    pub poll_interval_ms: u64,
    pub confirmation_timeout_secs: u64,

    /// Name used by the implicit registration before a first listing
    pub default_display_name: String,
}

/// Write signing key
#[derive(Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SignerSettings {
    /// Hex private key; writes are unavailable without one
    pub private_key: Option<String>,
}

// Keep key material out of logs
impl std::fmt::Debug for SignerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerSettings")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON log lines instead of human-readable text
    pub json: bool,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            rpc_url: HEDERA_TESTNET_RPC.to_string(),
            backup_rpc_urls: Vec::new(),
            chain_id: HEDERA_TESTNET_CHAIN_ID,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            explorer_url: HASHSCAN_TESTNET.to_string(),
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            contract_id: REGISTRY_CONTRACT_ID.to_string(),
            directory_url: MIRROR_NODE_TESTNET.to_string(),
            evm_address: None,
        }
    }
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self { scan_window: 1 }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            default_display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "registry_adapter=info".to_string(),
            json: false,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from a TOML file with environment overrides.
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut loaded: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        loaded.expand_env_vars()?;
        loaded.validate()?;

        info!(
            "Loaded registry config: contract {} on chain {}",
            loaded.registry.contract_id, loaded.network.chain_id
        );
        Ok(loaded)
    }

    /// Parse a TOML document directly (no file or environment sources)
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut parsed: Self = toml::from_str(text).context("Failed to parse TOML config")?;
        parsed.expand_env_vars()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Render the effective configuration, key material redacted
    pub fn to_toml_string(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.signer.private_key.is_some() {
            redacted.signer.private_key = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&redacted).context("Failed to serialize configuration")
    }

    /// Expand `${VAR}` references in URLs and the signer key
    pub fn expand_env_vars(&mut self) -> Result<()> {
        fn expand(value: &str, what: &str) -> Result<String> {
            shellexpand::env(value)
                .map(|expanded| expanded.to_string())
                .with_context(|| format!("Failed to expand {}", what))
        }

        self.network.rpc_url = expand(&self.network.rpc_url, "RPC URL")?;
        for url in &mut self.network.backup_rpc_urls {
            *url = expand(url, "backup RPC URL")?;
        }
        self.registry.directory_url = expand(&self.registry.directory_url, "directory URL")?;
        if let Some(address) = &self.registry.evm_address {
            self.registry.evm_address = Some(expand(address, "registry EVM address")?);
        }
        if let Some(key) = &self.signer.private_key {
            self.signer.private_key = Some(expand(key, "signer private key")?);
        }

        debug!("Expanded environment references in config");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.rpc_url.trim().is_empty() {
            bail!("network.rpc_url must not be empty");
        }
        if self.registry.contract_id.trim().is_empty() && self.registry.evm_address.is_none() {
            bail!("registry.contract_id or registry.evm_address must be set");
        }
        if self.reads.scan_window == 0 {
            bail!("reads.scan_window must be at least 1");
        }
        if self.lifecycle.poll_interval_ms == 0 {
            bail!("lifecycle.poll_interval_ms must be positive");
        }
        Ok(())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>) -> Result<RegistryConfig> {
    RegistryConfig::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("skillswap.toml");

        let config_content = r#"
[network]
rpc_url = "http://localhost:7546"

[reads]
scan_window = 4

[lifecycle]
poll_interval_ms = 50
"#;
        fs::write(&config_path, config_content).unwrap();

        let config = RegistryConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.network.rpc_url, "http://localhost:7546");
        assert_eq!(config.network.chain_id, HEDERA_TESTNET_CHAIN_ID);
        assert_eq!(config.reads.scan_window, 4);
        assert_eq!(config.lifecycle.poll_interval_ms, 50);
        assert_eq!(config.lifecycle.default_display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(config.registry.contract_id, REGISTRY_CONTRACT_ID);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(RegistryConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_zero_scan_window_rejected() {
        let result = RegistryConfig::from_toml_str("[reads]\nscan_window = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialized_config_redacts_key() {
        let mut config = RegistryConfig::default();
        config.signer.private_key = Some("0xdeadbeef".to_string());
        let rendered = config.to_toml_string().unwrap();
        assert!(!rendered.contains("deadbeef"));
        assert!(format!("{:?}", config.signer).contains("redacted"));
    }

    #[test]
    fn test_evm_address_override_round_trips() {
        let config = RegistryConfig::from_toml_str(
            "[registry]\nevm_address = \"0x00000000000000000000000000000000006d3993\"\n",
        )
        .unwrap();
        assert_eq!(
            config.registry.evm_address.as_deref(),
            Some("0x00000000000000000000000000000000006d3993")
        );
    }
}
