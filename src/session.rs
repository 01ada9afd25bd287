//! # Sessions
//!
//! A [`Session`] is everything tied to one connected signing provider: the
//! handle cache, the reconciler task, the projection and the dispatcher.
//! [`Client`] holds at most one session and swaps it when the provider
//! changes.

use crate::{
    cache::HandleCache,
    dispatcher::{ActionError, Dispatcher},
    projection::{Projection, ProjectionReader, ProjectionStore, open_lotteries},
    provider_directory::{ProviderDetail, ProviderInfo},
    reconciler::{Command, Reconciler},
    snapshot,
    types::LotteryRecord,
};
use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use lottery_contract_clients::{AlloyBinder, ChainBinder, ContractConfig};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::info;

/// Turns a provider entry into a connected signing provider.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, provider: &ProviderDetail) -> Result<Arc<dyn ChainBinder>>;
}

/// Connects over websockets with the provider's local keys.
#[derive(Debug, Clone)]
pub struct AlloyConnector {
    factory_address: Address,
    max_ws_retries: u32,
}

impl AlloyConnector {
    pub fn new(factory_address: Address, max_ws_retries: u32) -> Self {
        Self {
            factory_address,
            max_ws_retries,
        }
    }
}

#[async_trait]
impl Connector for AlloyConnector {
    async fn connect(&self, provider: &ProviderDetail) -> Result<Arc<dyn ChainBinder>> {
        let config = ContractConfig {
            rpc_url: provider.endpoint.rpc_url.clone(),
            factory_address: self.factory_address,
            max_ws_retries: self.max_ws_retries,
        };
        let binder = AlloyBinder::connect(&config, &provider.endpoint.private_keys)
            .await
            .with_context(|| format!("failed to connect through {}", provider.info.name))?;
        Ok(Arc::new(binder))
    }
}

pub struct Session {
    signer: Address,
    cache: Arc<HandleCache>,
    dispatcher: Dispatcher,
    projection: ProjectionReader,
    reconciler: JoinHandle<()>,
}

impl Session {
    /// Start the reconciler and load every lottery.
    ///
    /// Returns once the snapshot is visible in the projection. On failure
    /// nothing started here is left running.
    pub async fn open(binder: Arc<dyn ChainBinder>) -> Result<Self> {
        let signer = binder.signer_address();
        let (commands, receiver) = mpsc::unbounded_channel();
        let cache = Arc::new(HandleCache::new(binder.clone(), signer, commands.clone()));
        let store = ProjectionStore::new();
        let projection = store.reader();
        let reconciler = Reconciler::new(cache.clone(), store, receiver).spawn();
        let dispatcher = Dispatcher::new(binder.clone(), cache.clone(), commands.clone());

        let session = Self {
            signer,
            cache,
            dispatcher,
            projection,
            reconciler,
        };

        let factory = binder.factory(signer);
        let records = snapshot::load_all(factory.as_ref(), &session.cache).await?;

        let (done, installed) = oneshot::channel();
        commands
            .send(Command::Install { records, done })
            .map_err(|_| anyhow!("reconciler stopped before the snapshot was installed"))?;
        installed
            .await
            .context("reconciler stopped before the snapshot was installed")?;

        info!(
            signer = %signer,
            lotteries = session.projection.snapshot().len(),
            "session opened"
        );
        Ok(session)
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn lotteries(&self) -> Projection {
        self.projection.snapshot()
    }

    /// A reader woken on every projection change from now on.
    pub fn projection(&self) -> ProjectionReader {
        self.projection.fresh()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn cache(&self) -> &HandleCache {
        &self.cache
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reconciler.abort();
        self.cache.clear();
        info!(signer = %self.signer, "session closed");
    }
}

/// Entry point for the presentation layer.
pub struct Client<C = AlloyConnector> {
    connector: C,
    provider: Option<ProviderInfo>,
    session: Option<Session>,
}

impl<C: Connector> Client<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            provider: None,
            session: None,
        }
    }

    /// Connect through `provider` and load its lotteries, replacing any
    /// previous session.
    ///
    /// If connecting or loading fails the client is left without a session.
    pub async fn choose_provider(&mut self, provider: &ProviderDetail) -> Result<()> {
        self.change_provider();

        let binder = self.connector.connect(provider).await?;
        let session = Session::open(binder)
            .await
            .with_context(|| format!("failed to load lotteries through {}", provider.info.name))?;

        info!(provider = %provider.info.name, signer = %session.signer(), "provider chosen");
        self.provider = Some(provider.info.clone());
        self.session = Some(session);
        Ok(())
    }

    /// Tear down the current session, if any.
    pub fn change_provider(&mut self) {
        if let Some(provider) = self.provider.take() {
            info!(provider = %provider.name, "disconnecting provider");
        }
        self.session = None;
    }

    pub fn provider(&self) -> Option<&ProviderInfo> {
        self.provider.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn lotteries(&self) -> Projection {
        self.session
            .as_ref()
            .map(Session::lotteries)
            .unwrap_or_default()
    }

    pub fn open_lotteries(&self) -> Vec<LotteryRecord> {
        open_lotteries(&self.lotteries())
    }

    /// Look up a lottery in the current projection.
    pub fn lottery(&self, address: Address) -> Option<LotteryRecord> {
        self.lotteries()
            .iter()
            .find(|r| r.address == address)
            .cloned()
    }

    pub async fn follow_factory(&self) -> Result<bool> {
        match &self.session {
            Some(session) => {
                session.dispatcher().follow_factory().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Create a lottery owned by `owner`, or by the session signer.
    ///
    /// `Ok(None)` means there is no session.
    pub async fn create_lottery(
        &self,
        max_players: U256,
        entry_fee: U256,
        owner: Option<Address>,
    ) -> Result<Option<B256>, ActionError> {
        let Some(session) = &self.session else {
            return Ok(None);
        };
        let signer = owner.unwrap_or(session.signer());
        session
            .dispatcher()
            .create_lottery(max_players, entry_fee, signer)
            .await
            .map(Some)
    }

    pub async fn enter(&self, record: &LotteryRecord) -> Result<Option<B256>, ActionError> {
        match &self.session {
            Some(session) => session.dispatcher().enter(record).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn close(&self, record: &LotteryRecord) -> Result<Option<B256>, ActionError> {
        match &self.session {
            Some(session) => session.dispatcher().close(record).await.map(Some),
            None => Ok(None),
        }
    }
}
