//! Default values for a Hedera testnet deployment of the SkillSwap registry

/// Hedera testnet EVM chain id
pub const HEDERA_TESTNET_CHAIN_ID: u64 = 296;

/// JSON-RPC relay for Hedera testnet
pub const HEDERA_TESTNET_RPC: &str = "https://testnet.hashio.io/api";

/// Block explorer used for transaction links
pub const HASHSCAN_TESTNET: &str = "https://hashscan.io/testnet";

/// Mirror node that maps registry ids to EVM addresses
pub const MIRROR_NODE_TESTNET: &str = "https://testnet.mirrornode.hedera.com";

/// Deployed SkillSwap registry contract id
pub const REGISTRY_CONTRACT_ID: &str = "0.0.7158163";

/// Name used when a user is registered implicitly before their first listing
pub const DEFAULT_DISPLAY_NAME: &str = "SkillSwap User";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/skillswap.toml";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SKILLSWAP";
