//! In-memory fakes of the contract roles, driven by mpsc channels.

use crate::types::LotteryRecord;
use alloy::primitives::{Address, B256, U256};
use anyhow::{Result, bail};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use lottery_contract_clients::{
    ChainBinder, EventStream, FactoryContract, FactoryEvents, FactoryReader, FactoryWriter,
    LotteriesDetails, LotteryClosedEvent, LotteryContract, LotteryCreatedEvent, LotteryEvents,
    LotteryReader, LotteryWriter, PlayerEnteredEvent, ReceivedEvent,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use tokio::sync::mpsc::{self, UnboundedSender};

#[derive(Debug, Clone)]
pub struct FakeContract {
    pub active: bool,
    pub balance: U256,
    pub link_balance: U256,
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTx {
    pub method: &'static str,
    pub to: Address,
    pub from: Address,
    pub value: U256,
    pub args: Vec<U256>,
}

#[derive(Default)]
struct ChainState {
    details: LotteriesDetails,
    contracts: HashMap<Address, FakeContract>,
    failing_reads: HashSet<Address>,
    stalled_reads: HashSet<Address>,
    reads_in_flight: usize,
    fail_details: bool,
    fail_sends: bool,
    bindings: HashMap<Address, usize>,
    player_entered: HashMap<Address, Vec<UnboundedSender<PlayerEnteredEvent>>>,
    lottery_closed: HashMap<Address, Vec<UnboundedSender<LotteryClosedEvent>>>,
    received: HashMap<Address, Vec<UnboundedSender<ReceivedEvent>>>,
    lottery_created: Vec<UnboundedSender<LotteryCreatedEvent>>,
    sent: Vec<SentTx>,
}

fn into_stream<E: Send + 'static>(rx: mpsc::UnboundedReceiver<E>) -> EventStream<E> {
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|e| (e, rx)) }).boxed()
}

fn emit<E: Clone>(senders: Option<&Vec<UnboundedSender<E>>>, event: E) {
    for tx in senders.into_iter().flatten() {
        let _ = tx.send(event.clone());
    }
}

fn live<E>(senders: &[UnboundedSender<E>]) -> usize {
    senders.iter().filter(|tx| !tx.is_closed()).count()
}

/// A fake chain shared by every binding made from it.
#[derive(Clone)]
pub struct FakeChain {
    state: Arc<Mutex<ChainState>>,
    signer: Address,
    factory: Address,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::with_signer(Address::repeat_byte(0x5e))
    }

    pub fn with_signer(signer: Address) -> Self {
        Self {
            state: Arc::default(),
            signer,
            factory: Address::repeat_byte(0xfa),
        }
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn binder(&self) -> Arc<dyn ChainBinder> {
        Arc::new(self.clone())
    }

    /// Deploy a lottery contract without listing it in the factory.
    pub fn deploy(&self, address: Address, contract: FakeContract) {
        self.state.lock().unwrap().contracts.insert(address, contract);
    }

    /// Deploy a lottery and list it in `getLotteriesDetails`.
    pub fn add_lottery(&self, record: &LotteryRecord, owner: Address) {
        self.deploy(
            record.address,
            FakeContract {
                active: record.open,
                balance: record.eth_balance,
                link_balance: record.link_balance,
                owner,
            },
        );
        let mut state = self.state.lock().unwrap();
        let details = &mut state.details;
        details.lotteries.push(record.address);
        details.max_players.push(record.max_players);
        details.entry_fees.push(record.entry_fee);
        details.player_counts.push(record.player_count);
        details.creators.push(record.creator);
    }

    pub fn set_details(&self, details: LotteriesDetails) {
        self.state.lock().unwrap().details = details;
    }

    pub fn fail_reads_of(&self, address: Address) {
        self.state.lock().unwrap().failing_reads.insert(address);
    }

    pub fn allow_reads_of(&self, address: Address) {
        let mut state = self.state.lock().unwrap();
        state.failing_reads.remove(&address);
        state.stalled_reads.remove(&address);
    }

    /// Make reads of `address` hang until [`FakeChain::allow_reads_of`].
    pub fn stall_reads_of(&self, address: Address) {
        self.state.lock().unwrap().stalled_reads.insert(address);
    }

    /// Reads currently held by [`FakeChain::stall_reads_of`].
    pub fn reads_in_flight(&self) -> usize {
        self.state.lock().unwrap().reads_in_flight
    }

    pub fn fail_details(&self) {
        self.state.lock().unwrap().fail_details = true;
    }

    pub fn fail_sends(&self) {
        self.state.lock().unwrap().fail_sends = true;
    }

    pub fn emit_player_entered(&self, lottery: Address, player: Address, count: U256) {
        let state = self.state.lock().unwrap();
        emit(
            state.player_entered.get(&lottery),
            PlayerEnteredEvent {
                player,
                playerCount: count,
            },
        );
    }

    pub fn emit_lottery_closed(&self, lottery: Address, chosen: U256, winner: Address) {
        let state = self.state.lock().unwrap();
        emit(
            state.lottery_closed.get(&lottery),
            LotteryClosedEvent {
                chosenNumber: chosen,
                winner,
            },
        );
    }

    pub fn emit_received(&self, lottery: Address, sender: Address, amount: U256) {
        let state = self.state.lock().unwrap();
        emit(
            state.received.get(&lottery),
            ReceivedEvent { sender, amount },
        );
    }

    pub fn emit_created(&self, creator: Address, lottery: Address, max_players: U256, fee: U256) {
        let state = self.state.lock().unwrap();
        emit(
            Some(&state.lottery_created),
            LotteryCreatedEvent {
                creator,
                lottery,
                maxPlayers: max_players,
                entryFee: fee,
            },
        );
    }

    /// Number of times a binding was made for `address`.
    pub fn bindings(&self, address: Address) -> usize {
        self.state
            .lock()
            .unwrap()
            .bindings
            .get(&address)
            .copied()
            .unwrap_or(0)
    }

    /// Subscriptions ever made on `address`, across all three event kinds.
    pub fn subscriptions(&self, address: Address) -> usize {
        let state = self.state.lock().unwrap();
        state.player_entered.get(&address).map_or(0, Vec::len)
            + state.lottery_closed.get(&address).map_or(0, Vec::len)
            + state.received.get(&address).map_or(0, Vec::len)
    }

    /// Lottery subscriptions whose receiving end is still alive.
    pub fn live_subscriptions(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.player_entered.values().map(|v| live(v)).sum::<usize>()
            + state.lottery_closed.values().map(|v| live(v)).sum::<usize>()
            + state.received.values().map(|v| live(v)).sum::<usize>()
    }

    pub fn factory_subscriptions(&self) -> usize {
        self.state.lock().unwrap().lottery_created.len()
    }

    pub fn live_factory_subscriptions(&self) -> usize {
        live(&self.state.lock().unwrap().lottery_created)
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Let spawned tasks run until they block.
    pub async fn settle(&self) {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    fn stalled(&self, address: Address) -> bool {
        self.state.lock().unwrap().stalled_reads.contains(&address)
    }

    async fn stall(&self, address: Address) {
        if !self.stalled(address) {
            return;
        }
        self.state.lock().unwrap().reads_in_flight += 1;
        let _guard = InFlight(self.clone());
        while self.stalled(address) {
            tokio::task::yield_now().await;
        }
    }

    fn read(&self, address: Address) -> Result<FakeContract> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.contains(&address) {
            bail!("call to {address} failed: connection reset");
        }
        match state.contracts.get(&address) {
            Some(contract) => Ok(contract.clone()),
            None => bail!("no contract deployed at {address}"),
        }
    }

    fn send(&self, tx: SentTx) -> Result<B256> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            bail!("{} failed to send: connection reset", tx.method);
        }
        state.sent.push(tx);
        Ok(B256::with_last_byte(state.sent.len() as u8))
    }
}

struct InFlight(FakeChain);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.state.lock().unwrap().reads_in_flight -= 1;
    }
}

impl ChainBinder for FakeChain {
    fn signer_address(&self) -> Address {
        self.signer
    }

    fn factory(&self, signer: Address) -> Arc<dyn FactoryContract> {
        Arc::new(FakeFactory {
            chain: self.clone(),
            signer,
        })
    }

    fn lottery(&self, address: Address, signer: Address) -> Arc<dyn LotteryContract> {
        *self
            .state
            .lock()
            .unwrap()
            .bindings
            .entry(address)
            .or_default() += 1;
        Arc::new(FakeLottery {
            chain: self.clone(),
            address,
            signer,
        })
    }
}

pub struct FakeFactory {
    chain: FakeChain,
    signer: Address,
}

#[async_trait]
impl FactoryReader for FakeFactory {
    fn address(&self) -> Address {
        self.chain.factory
    }

    async fn lotteries_details(&self) -> Result<LotteriesDetails> {
        let state = self.chain.state.lock().unwrap();
        if state.fail_details {
            bail!("getLotteriesDetails failed: connection reset");
        }
        Ok(state.details.clone())
    }
}

#[async_trait]
impl FactoryWriter for FakeFactory {
    async fn create_lottery(
        &self,
        max_players: U256,
        entry_fee: U256,
        owner: Address,
    ) -> Result<B256> {
        self.chain.send(SentTx {
            method: "createLottery",
            to: self.chain.factory,
            from: self.signer,
            value: U256::ZERO,
            args: vec![max_players, entry_fee, U256::from_be_slice(owner.as_slice())],
        })
    }
}

#[async_trait]
impl FactoryEvents for FakeFactory {
    async fn lottery_created(&self) -> Result<EventStream<LotteryCreatedEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.chain.state.lock().unwrap().lottery_created.push(tx);
        Ok(into_stream(rx))
    }
}

pub struct FakeLottery {
    chain: FakeChain,
    address: Address,
    signer: Address,
}

#[async_trait]
impl LotteryReader for FakeLottery {
    fn address(&self) -> Address {
        self.address
    }

    async fn is_active(&self) -> Result<bool> {
        self.chain.stall(self.address).await;
        Ok(self.chain.read(self.address)?.active)
    }

    async fn balance(&self) -> Result<U256> {
        Ok(self.chain.read(self.address)?.balance)
    }

    async fn link_balance(&self) -> Result<U256> {
        Ok(self.chain.read(self.address)?.link_balance)
    }

    async fn owner(&self) -> Result<Address> {
        Ok(self.chain.read(self.address)?.owner)
    }
}

#[async_trait]
impl LotteryWriter for FakeLottery {
    fn sender(&self) -> Address {
        self.signer
    }

    async fn enter(&self, value: U256) -> Result<B256> {
        if !self.chain.read(self.address)?.active {
            bail!("enter reverted: execution reverted (lottery is closed)");
        }
        self.chain.send(SentTx {
            method: "enter",
            to: self.address,
            from: self.signer,
            value,
            args: Vec::new(),
        })
    }

    async fn request_close(&self) -> Result<B256> {
        if self.chain.read(self.address)?.owner != self.signer {
            bail!("requestRandomWords reverted: execution reverted");
        }
        self.chain.send(SentTx {
            method: "requestRandomWords",
            to: self.address,
            from: self.signer,
            value: U256::ZERO,
            args: vec![U256::from(1)],
        })
    }
}

#[async_trait]
impl LotteryEvents for FakeLottery {
    async fn player_entered(&self) -> Result<EventStream<PlayerEnteredEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.chain.state.lock().unwrap();
        state.player_entered.entry(self.address).or_default().push(tx);
        Ok(into_stream(rx))
    }

    async fn lottery_closed(&self) -> Result<EventStream<LotteryClosedEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.chain.state.lock().unwrap();
        state.lottery_closed.entry(self.address).or_default().push(tx);
        Ok(into_stream(rx))
    }

    async fn received(&self) -> Result<EventStream<ReceivedEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.chain.state.lock().unwrap();
        state.received.entry(self.address).or_default().push(tx);
        Ok(into_stream(rx))
    }
}

/// An open lottery record with no players and no balance.
pub fn record(address: Address, max_players: u64, entry_fee: u64) -> LotteryRecord {
    LotteryRecord {
        address,
        creator: Address::repeat_byte(0xcc),
        max_players: U256::from(max_players),
        entry_fee: U256::from(entry_fee),
        player_count: U256::ZERO,
        open: true,
        eth_balance: U256::ZERO,
        link_balance: U256::ZERO,
    }
}
