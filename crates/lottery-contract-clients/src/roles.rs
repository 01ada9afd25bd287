//! # Contract roles
//!
//! Each on-chain contract is split into the roles the client actually needs:
//! reading, writing and streaming events. The alloy bindings in
//! [`crate::factory_client`] and [`crate::lottery_client`] implement them over
//! a live provider; tests implement them in memory.

use crate::contracts::{
    LotteryClosedEvent, LotteryCreatedEvent, PlayerEnteredEvent, ReceivedEvent,
};
use alloy::primitives::{Address, B256, U256};
use anyhow::{Result, bail};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;

/// A live event feed. It ends when the underlying subscription is dropped.
pub type EventStream<E> = BoxStream<'static, E>;

/// Index-aligned parallel arrays returned by `getLotteriesDetails()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotteriesDetails {
    pub lotteries: Vec<Address>,
    pub max_players: Vec<U256>,
    pub entry_fees: Vec<U256>,
    pub player_counts: Vec<U256>,
    pub creators: Vec<Address>,
}

impl LotteriesDetails {
    /// Number of lotteries, as defined by the address array.
    pub fn len(&self) -> usize {
        self.lotteries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lotteries.is_empty()
    }

    /// Fails if any column is shorter than the address array.
    pub fn ensure_aligned(&self) -> Result<()> {
        let n = self.lotteries.len();
        let columns = [
            ("maxPlayers", self.max_players.len()),
            ("entryFees", self.entry_fees.len()),
            ("playerCounts", self.player_counts.len()),
            ("creators", self.creators.len()),
        ];
        for (column, len) in columns {
            if len < n {
                bail!("getLotteriesDetails returned {n} lotteries but only {len} {column}");
            }
        }
        Ok(())
    }
}

#[async_trait]
pub trait FactoryReader: Send + Sync {
    fn address(&self) -> Address;
    async fn lotteries_details(&self) -> Result<LotteriesDetails>;
}

#[async_trait]
pub trait FactoryWriter: Send + Sync {
    /// Sends `createLottery` and waits for the receipt.
    async fn create_lottery(
        &self,
        max_players: U256,
        entry_fee: U256,
        owner: Address,
    ) -> Result<B256>;
}

#[async_trait]
pub trait FactoryEvents: Send + Sync {
    async fn lottery_created(&self) -> Result<EventStream<LotteryCreatedEvent>>;
}

#[async_trait]
pub trait LotteryReader: Send + Sync {
    fn address(&self) -> Address;
    async fn is_active(&self) -> Result<bool>;
    async fn balance(&self) -> Result<U256>;
    async fn link_balance(&self) -> Result<U256>;
    async fn owner(&self) -> Result<Address>;
}

#[async_trait]
pub trait LotteryWriter: Send + Sync {
    /// Account the transactions of this binding are sent from.
    fn sender(&self) -> Address;
    async fn enter(&self, value: U256) -> Result<B256>;
    /// Owner-only `requestRandomWords(true)`.
    async fn request_close(&self) -> Result<B256>;
}

#[async_trait]
pub trait LotteryEvents: Send + Sync {
    async fn player_entered(&self) -> Result<EventStream<PlayerEnteredEvent>>;
    async fn lottery_closed(&self) -> Result<EventStream<LotteryClosedEvent>>;
    async fn received(&self) -> Result<EventStream<ReceivedEvent>>;
}

pub trait FactoryContract: FactoryReader + FactoryWriter + FactoryEvents {}

impl<T: FactoryReader + FactoryWriter + FactoryEvents> FactoryContract for T {}

pub trait LotteryContract: LotteryReader + LotteryWriter + LotteryEvents {}

impl<T: LotteryReader + LotteryWriter + LotteryEvents> LotteryContract for T {}

/// A connected signing provider able to bind contracts for a given account.
pub trait ChainBinder: Send + Sync {
    /// Default account of the provider.
    fn signer_address(&self) -> Address;

    fn factory(&self, signer: Address) -> Arc<dyn FactoryContract>;

    fn lottery(&self, address: Address, signer: Address) -> Arc<dyn LotteryContract>;
}
