//! # Event Helper
//!
//! Turns an alloy event filter into a live [`EventStream`] of decoded events.
//! Decoding or transport errors on individual logs are logged and skipped so
//! one bad log never tears down the subscription.

use crate::roles::EventStream;
use alloy::{contract::Event, providers::Provider, sol_types::SolEvent};
use anyhow::{Context, Result};
use futures_util::StreamExt;
use tracing::error;

/// Subscribe to `filter` and yield only successfully decoded events.
pub(crate) async fn subscribe<P, E>(filter: Event<P, E>) -> Result<EventStream<E>>
where
    P: Provider,
    E: SolEvent + Send + 'static,
{
    let stream = filter
        .subscribe()
        .await
        .with_context(|| format!("Failed to subscribe to {} events", E::SIGNATURE))?
        .into_stream()
        .filter_map(|e| async move {
            match e {
                Ok((event, _log)) => Some(event),
                Err(e) => {
                    error!("Failed to receive {} event: {e}", E::SIGNATURE);
                    None
                }
            }
        })
        .boxed();
    Ok(stream)
}
