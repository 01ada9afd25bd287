use alloy::{
    contract::{CallBuilder, CallDecoder},
    primitives::B256,
    providers::Provider,
};
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::errors::describe_error;

/// Simulates, sends and confirms contract transactions one at a time.
#[derive(Clone)]
pub(crate) struct TransactionSubmitter {
    tx_lock: Arc<Mutex<()>>,
}

impl TransactionSubmitter {
    pub(crate) fn new(tx_lock: Arc<Mutex<()>>) -> Self {
        Self { tx_lock }
    }

    pub(crate) async fn invoke<P, D>(&self, method: &str, call: CallBuilder<P, D>) -> Result<B256>
    where
        P: Provider + Clone,
        D: CallDecoder + Clone,
    {
        // Pre-simulate to catch reverts with proper error messages
        if let Err(e) = call.call().await {
            let e = describe_error(&e);
            return Err(anyhow!("{method} reverted: {e}"));
        }

        // Acquire lock and send
        let _guard = self.tx_lock.lock().await;
        let pending = call.send().await.map_err(|e| {
            let e = describe_error(&e);
            anyhow!("{method} failed to send: {e}")
        })?;
        debug!(method = %method, tx_hash = ?pending.tx_hash(), "transaction sent");

        let receipt = pending
            .get_receipt()
            .await
            .with_context(|| format!("{method} was sent but never confirmed"))?;
        let tx_hash = receipt.transaction_hash;

        if !receipt.status() {
            return Err(anyhow!("{method} reverted on-chain. Tx hash: {tx_hash:?}"));
        }

        info!(
            method = %method,
            tx_hash = ?tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "transaction confirmed"
        );
        Ok(tx_hash)
    }
}
