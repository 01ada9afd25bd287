use crate::{
    common::{event_helper, tx_submitter::TransactionSubmitter},
    contracts::{LotteryCreatedEvent, LotteryFactory::LotteryFactoryInstance},
    roles::{EventStream, FactoryEvents, FactoryReader, FactoryWriter, LotteriesDetails},
};
use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Client for the LotteryFactory contract, sending as `signer`.
#[derive(Clone)]
pub struct FactoryClient<P: Provider + Clone> {
    contract: LotteryFactoryInstance<P>,
    signer: Address,
    submitter: TransactionSubmitter,
}

impl<P: Provider + Clone> FactoryClient<P> {
    pub fn new(provider: P, address: Address, signer: Address, tx_lock: Arc<Mutex<()>>) -> Self {
        let contract = LotteryFactoryInstance::new(address, provider);
        Self {
            contract,
            signer,
            submitter: TransactionSubmitter::new(tx_lock),
        }
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> FactoryReader for FactoryClient<P> {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn lotteries_details(&self) -> Result<LotteriesDetails> {
        let details = self.contract.getLotteriesDetails().call().await?;
        Ok(LotteriesDetails {
            lotteries: details.lotteries,
            max_players: details.maxPlayers,
            entry_fees: details.entryFees,
            player_counts: details.playerCounts,
            creators: details.creators,
        })
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> FactoryWriter for FactoryClient<P> {
    async fn create_lottery(
        &self,
        max_players: U256,
        entry_fee: U256,
        owner: Address,
    ) -> Result<B256> {
        let call = self
            .contract
            .createLottery(max_players, entry_fee, owner)
            .from(self.signer);
        self.submitter.invoke("createLottery", call).await
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> FactoryEvents for FactoryClient<P> {
    async fn lottery_created(&self) -> Result<EventStream<LotteryCreatedEvent>> {
        event_helper::subscribe(self.contract.event_filter::<LotteryCreatedEvent>()).await
    }
}
