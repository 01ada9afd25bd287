//! Initial bulk load of every lottery listed by the factory.

use crate::{
    cache::HandleCache,
    types::{LotteryRecord, LotteryTerms},
};
use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use lottery_contract_clients::{FactoryReader, LotteryReader};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed getLotteriesDetails response: {0}")]
    MalformedDetails(String),
}

/// Read every lottery the factory knows about.
///
/// Each lottery is bound through `cache` before it is read. Any failed read
/// fails the whole load.
pub async fn load_all<F>(factory: &F, cache: &HandleCache) -> Result<Vec<LotteryRecord>>
where
    F: FactoryReader + ?Sized,
{
    let details = factory
        .lotteries_details()
        .await
        .context("failed to read lotteries from factory")?;
    details
        .ensure_aligned()
        .map_err(|e| SnapshotError::MalformedDetails(e.to_string()))?;

    let reads = (0..details.len()).map(|i| {
        let terms = LotteryTerms {
            address: details.lotteries[i],
            creator: details.creators[i],
            max_players: details.max_players[i],
            entry_fee: details.entry_fees[i],
            player_count: details.player_counts[i],
        };
        let handle = cache.get_or_create(terms.address).into_handle();
        async move { read_record(handle.contract().as_ref(), terms).await }
    });
    let records = try_join_all(reads).await?;

    info!(lotteries = records.len(), "lotteries loaded");
    Ok(records)
}

/// Read the live state of one lottery and combine it with its terms.
pub async fn read_record<R>(lottery: &R, terms: LotteryTerms) -> Result<LotteryRecord>
where
    R: LotteryReader + ?Sized,
{
    let (open, eth_balance, link_balance) = tokio::try_join!(
        lottery.is_active(),
        lottery.balance(),
        lottery.link_balance()
    )
    .with_context(|| format!("failed to read lottery {}", terms.address))?;
    Ok(terms.into_record(open, eth_balance, link_balance))
}
