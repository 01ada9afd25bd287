use crate::types::LotteryRecord;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;

/// An immutable view of every known lottery, in discovery order.
pub type Projection = Arc<Vec<LotteryRecord>>;

/// Write side of the projection. Owned by the reconciler.
pub struct ProjectionStore {
    tx: watch::Sender<Projection>,
}

impl ProjectionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// Publish a new collection, replacing the previous one wholesale.
    pub fn replace(&self, records: Vec<LotteryRecord>) {
        self.tx.send_replace(Arc::new(records));
    }

    pub fn current(&self) -> Projection {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> ProjectionReader {
        ProjectionReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ProjectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ProjectionReader {
    rx: watch::Receiver<Projection>,
}

impl ProjectionReader {
    pub fn snapshot(&self) -> Projection {
        self.rx.borrow().clone()
    }

    /// A reader that only wakes on changes published after this call.
    pub fn fresh(&self) -> Self {
        let mut rx = self.rx.clone();
        let _ = rx.borrow_and_update();
        Self { rx }
    }

    /// Wait for the next published collection.
    ///
    /// Fails once the reconciler is gone.
    pub async fn changed(&mut self) -> Result<Projection> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

/// Records that are still accepting players.
pub fn open_lotteries(records: &[LotteryRecord]) -> Vec<LotteryRecord> {
    records.iter().filter(|r| r.open).cloned().collect()
}
