pub mod consts;

use crate::provider_directory::{ProviderDetail, ProviderDirectory, ProviderEndpoint, ProviderInfo};
use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::Args;
use consts::{
    DEFAULT_CONFIG_FILE, DEFAULT_FACTORY_ADDRESS, DEFAULT_MAX_WS_RETRIES, DEFAULT_RPC_URL,
    DEV_PRIVATE_KEY, INJECTED_PROVIDER_NAME, INJECTED_PROVIDER_UUID,
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Connection options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// Path to a TOML config file listing providers
    #[arg(long, global = true, env = "LOTTERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Provider to connect through, by name or uuid
    #[arg(long, global = true, env = "LOTTERY_PROVIDER")]
    pub provider: Option<String>,

    /// LotteryFactory contract address
    #[arg(long, global = true, env = "FACTORY_ADDRESS")]
    pub factory_address: Option<String>,

    /// Ethereum RPC endpoint (will be converted to WebSocket)
    #[arg(long, global = true, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Private key of the injected provider
    #[arg(long, global = true, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
}

/// One `[[providers]]` entry of the config file
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    pub name: String,
    pub uuid: Option<String>,
    pub rdns: Option<String>,
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub private_keys: Vec<String>,
}

impl ProviderEntry {
    fn into_detail(self, default_rpc_url: &str) -> ProviderDetail {
        let uuid = self.uuid.unwrap_or_else(|| format!("config:{}", self.name));
        ProviderDetail {
            info: ProviderInfo {
                uuid,
                name: self.name,
                rdns: self.rdns,
            },
            endpoint: ProviderEndpoint {
                rpc_url: self.rpc_url.unwrap_or_else(|| default_rpc_url.to_string()),
                private_keys: self.private_keys,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub factory_address: Option<String>,
    pub rpc_url: Option<String>,
    pub max_ws_retries: Option<u32>,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

/// Load configuration from a TOML file.
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg: FileConfig =
        toml::from_str(&s).with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(cfg)
}

/// Client configuration with all required values resolved
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub factory_address: Address,
    pub max_ws_retries: u32,
    pub providers: Vec<ProviderDetail>,
    pub injected: Option<ProviderDetail>,
    /// Provider requested on the command line
    pub provider: Option<String>,
}

impl ClientConfig {
    /// Load configuration with priority: CLI/env -> config file -> defaults
    pub fn load(args: ChainArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => load_config_from_path(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                load_config_from_path(DEFAULT_CONFIG_FILE)?
            }
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    pub fn resolve(args: ChainArgs, file: FileConfig) -> Result<Self> {
        let rpc_url = args
            .rpc_url
            .or(file.rpc_url)
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let factory_address = args
            .factory_address
            .or(file.factory_address)
            .unwrap_or_else(|| DEFAULT_FACTORY_ADDRESS.to_string())
            .parse::<Address>()
            .context("invalid factory address")?;

        let max_ws_retries = file.max_ws_retries.unwrap_or(DEFAULT_MAX_WS_RETRIES);

        let providers: Vec<_> = file
            .providers
            .into_iter()
            .map(|entry| entry.into_detail(&rpc_url))
            .collect();

        let injected_key = match args.private_key {
            Some(key) => Some(key),
            None if providers.is_empty() => {
                warn!("no provider configured, using the development account");
                Some(DEV_PRIVATE_KEY.to_string())
            }
            None => None,
        };
        let injected = injected_key.map(|key| ProviderDetail {
            info: ProviderInfo {
                uuid: INJECTED_PROVIDER_UUID.to_string(),
                name: INJECTED_PROVIDER_NAME.to_string(),
                rdns: None,
            },
            endpoint: ProviderEndpoint {
                rpc_url: rpc_url.clone(),
                private_keys: vec![key],
            },
        });

        info!(
            "Loaded ClientConfig: rpc_url={rpc_url}, factory_address={factory_address}, providers={}",
            providers.len()
        );
        Ok(ClientConfig {
            rpc_url,
            factory_address,
            max_ws_retries,
            providers,
            injected,
            provider: args.provider,
        })
    }

    /// Build the provider directory from the configured providers.
    pub fn directory(&self) -> ProviderDirectory {
        let directory = ProviderDirectory::new(self.injected.clone());
        for provider in &self.providers {
            directory.announce(provider.clone());
        }
        directory
    }

    /// The provider to connect through: the one named on the command line,
    /// otherwise the directory default.
    pub fn select_provider(&self, directory: &ProviderDirectory) -> Result<ProviderDetail> {
        match &self.provider {
            Some(key) => directory
                .find(key)
                .with_context(|| format!("no provider named {key}")),
            None => directory
                .default_provider()
                .context("no provider available, configure one or pass --private-key"),
        }
    }
}
