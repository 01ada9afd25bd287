use crate::{
    common::{event_helper, tx_submitter::TransactionSubmitter},
    contracts::{
        Lottery::LotteryInstance, LotteryClosedEvent, PlayerEnteredEvent, ReceivedEvent,
    },
    roles::{EventStream, LotteryEvents, LotteryReader, LotteryWriter},
};
use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Client for a single Lottery contract, sending as `signer`.
#[derive(Clone)]
pub struct LotteryClient<P: Provider + Clone> {
    contract: LotteryInstance<P>,
    signer: Address,
    submitter: TransactionSubmitter,
}

impl<P: Provider + Clone> LotteryClient<P> {
    pub fn new(provider: P, address: Address, signer: Address, tx_lock: Arc<Mutex<()>>) -> Self {
        let contract = LotteryInstance::new(address, provider);
        Self {
            contract,
            signer,
            submitter: TransactionSubmitter::new(tx_lock),
        }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> LotteryReader for LotteryClient<P> {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn is_active(&self) -> Result<bool> {
        Ok(self.contract.isActive().call().await?)
    }

    async fn balance(&self) -> Result<U256> {
        Ok(self.contract.getBalance().call().await?)
    }

    async fn link_balance(&self) -> Result<U256> {
        Ok(self.contract.getLinkBalance().call().await?)
    }

    async fn owner(&self) -> Result<Address> {
        Ok(self.contract.owner().call().await?)
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> LotteryWriter for LotteryClient<P> {
    fn sender(&self) -> Address {
        self.signer
    }

    async fn enter(&self, value: U256) -> Result<B256> {
        let call = self.contract.enter().value(value).from(self.signer);
        self.submitter.invoke("enter", call).await
    }

    async fn request_close(&self) -> Result<B256> {
        let call = self.contract.requestRandomWords(true).from(self.signer);
        self.submitter.invoke("requestRandomWords", call).await
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> LotteryEvents for LotteryClient<P> {
    async fn player_entered(&self) -> Result<EventStream<PlayerEnteredEvent>> {
        event_helper::subscribe(self.contract.event_filter::<PlayerEnteredEvent>()).await
    }

    async fn lottery_closed(&self) -> Result<EventStream<LotteryClosedEvent>> {
        event_helper::subscribe(self.contract.event_filter::<LotteryClosedEvent>()).await
    }

    async fn received(&self) -> Result<EventStream<ReceivedEvent>> {
        event_helper::subscribe(self.contract.event_filter::<ReceivedEvent>()).await
    }
}
