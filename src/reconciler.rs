//! # Event reconciler
//!
//! A single task owns the lottery projection. Listeners and the snapshot
//! loader talk to it through [`Command`]s, discovery reads run as tasks it
//! owns, and every change is published as a whole new collection.

use crate::{
    cache::{HandleCache, Lookup},
    projection::ProjectionStore,
    snapshot::read_record,
    types::{LotteryRecord, LotteryTerms, LotteryUpdate},
};
use alloy::primitives::{Address, U256};
use anyhow::Result;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub enum Command {
    /// A contract event.
    Apply(LotteryUpdate),
    /// Replace the projection with a freshly loaded snapshot.
    Install {
        records: Vec<LotteryRecord>,
        done: oneshot::Sender<()>,
    },
}

pub type CommandSender = mpsc::UnboundedSender<Command>;
pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

/// Events for lotteries that are bound but not listed yet, by address.
pub type Pending = HashMap<Address, Vec<LotteryUpdate>>;

/// Apply a lottery event to `records`.
///
/// Returns `None` when no record matches the event's address, or for
/// `LotteryCreated`, which is handled by discovery instead.
pub fn apply(records: &[LotteryRecord], update: &LotteryUpdate) -> Option<Vec<LotteryRecord>> {
    let index = records.iter().position(|r| r.address == update.lottery())?;
    let mut next = records.to_vec();
    let record = &mut next[index];
    match *update {
        LotteryUpdate::PlayerEntered { player_count, .. } => {
            record.player_count = if record.open {
                record.player_count.max(player_count)
            } else {
                player_count
            };
            record.eth_balance = record.eth_balance.saturating_add(record.entry_fee);
        }
        LotteryUpdate::LotteryClosed { .. } => record.open = false,
        LotteryUpdate::Received { value, .. } => {
            record.eth_balance = record.eth_balance.saturating_add(value);
        }
        LotteryUpdate::LotteryCreated { .. } => return None,
    }
    Some(next)
}

/// Merge a snapshot into the current records.
///
/// The snapshot wins for every address it contains and keeps its order;
/// records discovered while the snapshot was loading are kept after it.
pub fn install(current: &[LotteryRecord], snapshot: Vec<LotteryRecord>) -> Vec<LotteryRecord> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    let mut next: Vec<_> = snapshot
        .into_iter()
        .filter(|r| seen.insert(r.address))
        .collect();
    next.extend(
        current
            .iter()
            .filter(|r| !seen.contains(&r.address))
            .cloned(),
    );
    next
}

/// Append `record` unless its address is already present.
pub fn append(current: &[LotteryRecord], record: LotteryRecord) -> Option<Vec<LotteryRecord>> {
    if current.iter().any(|r| r.address == record.address) {
        return None;
    }
    let mut next = Vec::with_capacity(current.len() + 1);
    next.extend_from_slice(current);
    next.push(record);
    Some(next)
}

/// Fold the events held for every listed lottery into its freshly read
/// record, removing them from `pending`.
///
/// A record's balance is read after its listeners were started, so it
/// already counts these events: only the player count (the larger of the two)
/// and the open flag move. Events for lotteries still unlisted stay held.
pub fn replay(mut records: Vec<LotteryRecord>, pending: &mut Pending) -> Vec<LotteryRecord> {
    if pending.is_empty() {
        return records;
    }
    for record in &mut records {
        let Some(updates) = pending.remove(&record.address) else {
            continue;
        };
        for update in updates {
            match update {
                LotteryUpdate::PlayerEntered { player_count, .. } => {
                    record.player_count = record.player_count.max(player_count);
                }
                LotteryUpdate::LotteryClosed { .. } => record.open = false,
                LotteryUpdate::Received { .. } | LotteryUpdate::LotteryCreated { .. } => {}
            }
        }
        debug!(lottery = %record.address, "held events replayed");
    }
    records
}

pub struct Reconciler {
    cache: Arc<HandleCache>,
    store: ProjectionStore,
    receiver: CommandReceiver,
    pending: Pending,
    /// Created lotteries whose reads failed; the next announcement retries.
    unread: HashSet<Address>,
    discoveries: JoinSet<(Address, Result<LotteryRecord>)>,
}

impl Reconciler {
    pub fn new(cache: Arc<HandleCache>, store: ProjectionStore, receiver: CommandReceiver) -> Self {
        Self {
            cache,
            store,
            receiver,
            pending: Pending::new(),
            unread: HashSet::new(),
            discoveries: JoinSet::new(),
        }
    }

    /// Run on a new task. Aborting it also aborts any discovery still reading.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(joined) = self.discoveries.join_next() => match joined {
                    Ok((lottery, read)) => self.discovered(lottery, read),
                    Err(e) => error!(error = %e, "discovery task failed"),
                },
            }
        }
        debug!("reconciler stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Apply(LotteryUpdate::LotteryCreated {
                creator,
                lottery,
                max_players,
                entry_fee,
            }) => self.discover(LotteryTerms {
                address: lottery,
                creator,
                max_players,
                entry_fee,
                player_count: U256::ZERO,
            }),
            Command::Apply(update) => {
                let lottery = update.lottery();
                match apply(&self.store.current(), &update) {
                    Some(next) => {
                        debug!(lottery = %lottery, event = update.kind(), "event applied");
                        self.store.replace(next);
                    }
                    None if self.cache.contains(&lottery) => {
                        debug!(lottery = %lottery, event = update.kind(), "event held until lottery is listed");
                        self.pending.entry(lottery).or_default().push(update);
                    }
                    None => {
                        debug!(lottery = %lottery, event = update.kind(), "event for unknown lottery dropped");
                    }
                }
            }
            Command::Install { records, done } => {
                let next = replay(install(&self.store.current(), records), &mut self.pending);
                info!(lotteries = next.len(), "snapshot installed");
                self.store.replace(next);
                let _ = done.send(());
            }
        }
    }

    fn discover(&mut self, terms: LotteryTerms) {
        let address = terms.address;
        let handle = match self.cache.get_or_create(address) {
            Lookup::Created(handle) => handle,
            Lookup::Existing(handle) if self.unread.remove(&address) => {
                info!(lottery = %address, "retrying reads of created lottery");
                handle
            }
            Lookup::Existing(_) => {
                debug!(lottery = %address, "created lottery already tracked");
                return;
            }
        };

        self.discoveries.spawn(async move {
            let read = read_record(handle.contract().as_ref(), terms).await;
            (address, read)
        });
    }

    fn discovered(&mut self, lottery: Address, read: Result<LotteryRecord>) {
        let record = match read {
            Ok(record) => record,
            Err(e) => {
                warn!(lottery = %lottery, error = %e, "failed to read created lottery");
                self.unread.insert(lottery);
                return;
            }
        };
        match append(&self.store.current(), record) {
            Some(next) => {
                info!(lottery = %lottery, "new lottery added");
                self.store.replace(replay(next, &mut self.pending));
            }
            None => debug!(lottery = %lottery, "lottery already listed"),
        }
    }
}
