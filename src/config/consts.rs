//! Defaults used when neither the command line nor the config file sets a value.

// =============================================================================
// Files
// =============================================================================

/// Config file read from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "lottery.toml";

// =============================================================================
// Chain
// =============================================================================

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_FACTORY_ADDRESS: &str = "0x41604169696E57E7351CEDa7977A4Bb9A6C80FA2";

/// Websocket reconnect attempts before a subscription gives up
pub const DEFAULT_MAX_WS_RETRIES: u32 = u32::MAX;

// =============================================================================
// Providers
// =============================================================================

pub const INJECTED_PROVIDER_UUID: &str = "injected";
pub const INJECTED_PROVIDER_NAME: &str = "Injected";

/// First Hardhat account, used against a local node when no key is configured
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
