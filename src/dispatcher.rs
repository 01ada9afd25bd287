//! # Action dispatcher
//!
//! User actions against the factory and individual lotteries. Nothing here
//! touches the projection; confirmed transactions show up through the
//! events they emit.

use crate::{
    cache::{HandleCache, forward_events},
    reconciler::CommandSender,
    types::{LotteryRecord, LotteryUpdate},
};
use alloy::primitives::{Address, B256, U256};
use anyhow::Context;
use lottery_contract_clients::{ChainBinder, FactoryContract, LotteryCreatedEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::{sync::OnceCell, task::AbortHandle};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{sender} is not the owner of lottery {lottery} (owner is {owner})")]
    NotOwner {
        lottery: Address,
        sender: Address,
        owner: Address,
    },
    #[error(transparent)]
    Transaction(#[from] anyhow::Error),
}

pub struct Dispatcher {
    binder: Arc<dyn ChainBinder>,
    factory: Arc<dyn FactoryContract>,
    cache: Arc<HandleCache>,
    commands: CommandSender,
    created_listener: OnceCell<AbortHandle>,
}

impl Dispatcher {
    pub fn new(
        binder: Arc<dyn ChainBinder>,
        cache: Arc<HandleCache>,
        commands: CommandSender,
    ) -> Self {
        let factory = binder.factory(binder.signer_address());
        Self {
            binder,
            factory,
            cache,
            commands,
            created_listener: OnceCell::new(),
        }
    }

    /// Start forwarding `LotteryCreated` events to the reconciler.
    ///
    /// Subscribes at most once; the subscription is live when this returns.
    pub async fn follow_factory(&self) -> anyhow::Result<()> {
        self.created_listener
            .get_or_try_init(|| async {
                let stream = self
                    .factory
                    .lottery_created()
                    .await
                    .context("failed to subscribe to LotteryCreated")?;
                info!(factory = %self.factory.address(), "following new lotteries");
                Ok::<_, anyhow::Error>(forward_events(
                    self.factory.address(),
                    "LotteryCreated",
                    async move { Ok(stream) },
                    |_, e: LotteryCreatedEvent| LotteryUpdate::LotteryCreated {
                        creator: e.creator,
                        lottery: e.lottery,
                        max_players: e.maxPlayers,
                        entry_fee: e.entryFee,
                    },
                    self.commands.clone(),
                ))
            })
            .await?;
        Ok(())
    }

    pub fn is_following_factory(&self) -> bool {
        self.created_listener.initialized()
    }

    /// Send `createLottery` from `signer`, which also becomes the owner.
    pub async fn create_lottery(
        &self,
        max_players: U256,
        entry_fee: U256,
        signer: Address,
    ) -> Result<B256, ActionError> {
        self.follow_factory().await?;

        let factory = if signer == self.binder.signer_address() {
            self.factory.clone()
        } else {
            self.binder.factory(signer)
        };
        let tx_hash = factory
            .create_lottery(max_players, entry_fee, signer)
            .await
            .inspect_err(|e| error!(signer = %signer, error = %e, "failed to create lottery"))?;
        info!(
            tx_hash = ?tx_hash,
            max_players = %max_players,
            entry_fee = %entry_fee,
            "lottery creation confirmed"
        );
        Ok(tx_hash)
    }

    /// Enter `record`, paying its entry fee.
    pub async fn enter(&self, record: &LotteryRecord) -> Result<B256, ActionError> {
        let handle = self.cache.get_or_create(record.address).into_handle();
        let tx_hash = handle
            .contract()
            .enter(record.entry_fee)
            .await
            .inspect_err(
                |e| error!(lottery = %record.address, error = %e, "failed to enter lottery"),
            )?;
        info!(lottery = %record.address, tx_hash = ?tx_hash, "entered lottery");
        Ok(tx_hash)
    }

    /// Request the draw that closes `record`.
    ///
    /// A failure from an account that does not own the lottery is reported
    /// as [`ActionError::NotOwner`].
    pub async fn close(&self, record: &LotteryRecord) -> Result<B256, ActionError> {
        let handle = self.cache.get_or_create(record.address).into_handle();
        let contract = handle.contract();
        let err = match contract.request_close().await {
            Ok(tx_hash) => {
                info!(lottery = %record.address, tx_hash = ?tx_hash, "lottery close requested");
                return Ok(tx_hash);
            }
            Err(e) => e,
        };

        let sender = contract.sender();
        match contract.owner().await {
            Ok(owner) if owner != sender => {
                warn!(lottery = %record.address, sender = %sender, owner = %owner, "only the owner can close a lottery");
                Err(ActionError::NotOwner {
                    lottery: record.address,
                    sender,
                    owner,
                })
            }
            Ok(_) => {
                error!(lottery = %record.address, error = %err, "failed to close lottery");
                Err(ActionError::Transaction(err))
            }
            Err(owner_err) => {
                error!(
                    lottery = %record.address,
                    error = %err,
                    owner_error = %owner_err,
                    "failed to close lottery and to read its owner"
                );
                Err(ActionError::Transaction(err))
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(listener) = self.created_listener.get() {
            listener.abort();
        }
    }
}
