//! # Remote handle cache
//!
//! One live contract binding per lottery address, together with the event
//! listeners attached to it. Both the snapshot fetcher and the reconciler go
//! through [`HandleCache::get_or_create`], so a lottery discovered twice is
//! still bound and subscribed once.

use crate::{
    reconciler::{Command, CommandSender},
    types::LotteryUpdate,
};
use alloy::primitives::Address;
use anyhow::Result;
use futures_util::StreamExt;
use lottery_contract_clients::{
    ChainBinder, EventStream, LotteryClosedEvent, LotteryContract, PlayerEnteredEvent,
    ReceivedEvent,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::task::AbortHandle;
use tracing::{debug, error, info};

/// A lottery contract binding and its event listeners.
pub struct RemoteHandle {
    address: Address,
    contract: Arc<dyn LotteryContract>,
    listeners: Vec<AbortHandle>,
}

impl RemoteHandle {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn contract(&self) -> &Arc<dyn LotteryContract> {
        &self.contract
    }

    fn release(&self) {
        for listener in &self.listeners {
            listener.abort();
        }
    }
}

/// Result of [`HandleCache::get_or_create`].
#[derive(Clone)]
pub enum Lookup {
    /// The address was already bound; nothing was subscribed.
    Existing(Arc<RemoteHandle>),
    /// A new binding was made and its listeners started.
    Created(Arc<RemoteHandle>),
}

impl Lookup {
    pub fn handle(&self) -> &Arc<RemoteHandle> {
        match self {
            Self::Existing(handle) | Self::Created(handle) => handle,
        }
    }

    pub fn into_handle(self) -> Arc<RemoteHandle> {
        match self {
            Self::Existing(handle) | Self::Created(handle) => handle,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

pub struct HandleCache {
    binder: Arc<dyn ChainBinder>,
    signer: Address,
    commands: CommandSender,
    handles: Mutex<HashMap<Address, Arc<RemoteHandle>>>,
}

impl HandleCache {
    pub fn new(binder: Arc<dyn ChainBinder>, signer: Address, commands: CommandSender) -> Self {
        Self {
            binder,
            signer,
            commands,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Return the handle for `address`, binding and subscribing it first if
    /// this is the first time the address is seen.
    ///
    /// The lookup and the insert happen under one lock with no await in
    /// between. Subscriptions are set up by the spawned listener tasks.
    pub fn get_or_create(&self, address: Address) -> Lookup {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = handles.get(&address) {
            return Lookup::Existing(handle.clone());
        }

        let contract = self.binder.lottery(address, self.signer);
        let listeners = vec![
            forward_events(
                address,
                "PlayerEntered",
                {
                    let contract = contract.clone();
                    async move { contract.player_entered().await }
                },
                |lottery, e: PlayerEnteredEvent| LotteryUpdate::PlayerEntered {
                    lottery,
                    player: e.player,
                    player_count: e.playerCount,
                },
                self.commands.clone(),
            ),
            forward_events(
                address,
                "LotteryClosed",
                {
                    let contract = contract.clone();
                    async move { contract.lottery_closed().await }
                },
                |lottery, e: LotteryClosedEvent| LotteryUpdate::LotteryClosed {
                    lottery,
                    chosen_number: e.chosenNumber,
                    winner: e.winner,
                },
                self.commands.clone(),
            ),
            forward_events(
                address,
                "Received",
                {
                    let contract = contract.clone();
                    async move { contract.received().await }
                },
                |lottery, e: ReceivedEvent| LotteryUpdate::Received {
                    lottery,
                    from: e.sender,
                    value: e.amount,
                },
                self.commands.clone(),
            ),
        ];

        let handle = Arc::new(RemoteHandle {
            address,
            contract,
            listeners,
        });
        handles.insert(address, handle.clone());
        debug!(lottery = %address, "lottery handle created");
        Lookup::Created(handle)
    }

    pub fn get(&self, address: &Address) -> Option<Arc<RemoteHandle>> {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every handle and abort its listeners.
    pub fn clear(&self) {
        let drained: Vec<_> = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        if drained.is_empty() {
            return;
        }
        for handle in &drained {
            handle.release();
        }
        info!(handles = drained.len(), "lottery handles released");
    }
}

impl Drop for HandleCache {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Spawn a task that subscribes to one event kind and forwards every event to
/// the reconciler, tagged with `source`.
pub(crate) fn forward_events<E, Fut>(
    source: Address,
    event: &'static str,
    subscription: Fut,
    to_update: fn(Address, E) -> LotteryUpdate,
    commands: CommandSender,
) -> AbortHandle
where
    E: Send + 'static,
    Fut: Future<Output = Result<EventStream<E>>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut stream = match subscription.await {
            Ok(stream) => stream,
            Err(e) => {
                error!(source = %source, event, error = %e, "failed to subscribe");
                return;
            }
        };
        debug!(source = %source, event, "subscribed");

        while let Some(event_data) = stream.next().await {
            let update = to_update(source, event_data);
            if commands.send(Command::Apply(update)).is_err() {
                break;
            }
        }
        debug!(source = %source, event, "event stream ended");
    })
    .abort_handle()
}
