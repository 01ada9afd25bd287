use crate::{
    factory_client::FactoryClient,
    lottery_client::LotteryClient,
    roles::{ChainBinder, FactoryContract, LotteryContract},
};
use alloy::{
    network::{Ethereum, EthereumWallet, NetworkWallet},
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    signers::local::PrivateKeySigner,
};
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Connection settings shared by every contract binding.
#[derive(Debug, Clone)]
pub struct ContractConfig {
    pub rpc_url: String,
    pub factory_address: Address,
    pub max_ws_retries: u32,
}

impl ContractConfig {
    pub fn new(rpc_url: String, factory_address: Address) -> Self {
        Self {
            rpc_url,
            factory_address,
            max_ws_retries: u32::MAX,
        }
    }
}

/// Turn an http(s) endpoint into its websocket counterpart.
pub fn to_ws_url(rpc_url: &str) -> String {
    rpc_url
        .replace("http://", "ws://")
        .replace("https://", "wss://")
}

fn parse_signer(private_key: &str) -> Result<PrivateKeySigner> {
    private_key
        .trim()
        .parse::<PrivateKeySigner>()
        .context("invalid private key")
}

/// Websocket provider holding one or more local signing accounts.
///
/// The first key is the default account.
#[derive(Clone)]
pub struct AlloyBinder {
    provider: DynProvider,
    wallet: EthereumWallet,
    factory_address: Address,
    tx_lock: Arc<Mutex<()>>,
}

impl AlloyBinder {
    pub async fn connect(config: &ContractConfig, private_keys: &[String]) -> Result<Self> {
        let mut keys = private_keys.iter();
        let first = keys
            .next()
            .ok_or_else(|| anyhow!("provider exposes no accounts"))?;
        let mut wallet = EthereumWallet::from(parse_signer(first)?);
        for key in keys {
            wallet.register_signer(parse_signer(key)?);
        }

        let ws = WsConnect::new(to_ws_url(&config.rpc_url)).with_max_retries(config.max_ws_retries);
        let provider: DynProvider = ProviderBuilder::new()
            .wallet(wallet.clone())
            .with_simple_nonce_management()
            .with_gas_estimation()
            .connect_ws(ws)
            .await
            .with_context(|| format!("failed to connect to {}", config.rpc_url))?
            .erased();

        let binder = Self {
            provider,
            wallet,
            factory_address: config.factory_address,
            tx_lock: Arc::new(Mutex::new(())),
        };
        info!(
            rpc_url = %config.rpc_url,
            signer = %binder.signer_address(),
            accounts = binder.accounts().len(),
            "connected"
        );
        Ok(binder)
    }

    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }

    /// Every account the wallet can sign for.
    pub fn accounts(&self) -> Vec<Address> {
        <EthereumWallet as NetworkWallet<Ethereum>>::signer_addresses(&self.wallet).collect()
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }
}

impl ChainBinder for AlloyBinder {
    fn signer_address(&self) -> Address {
        <EthereumWallet as NetworkWallet<Ethereum>>::default_signer_address(&self.wallet)
    }

    fn factory(&self, signer: Address) -> Arc<dyn FactoryContract> {
        Arc::new(FactoryClient::new(
            self.provider.clone(),
            self.factory_address,
            signer,
            self.tx_lock.clone(),
        ))
    }

    fn lottery(&self, address: Address, signer: Address) -> Arc<dyn LotteryContract> {
        Arc::new(LotteryClient::new(
            self.provider.clone(),
            address,
            signer,
            self.tx_lock.clone(),
        ))
    }
}
