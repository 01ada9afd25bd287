pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod display;
pub mod projection;
pub mod provider_directory;
pub mod reconciler;
pub mod session;
pub mod shutdown;
pub mod snapshot;
pub mod types;

#[cfg(test)]
mod testing;

pub use cache::{HandleCache, Lookup, RemoteHandle};
pub use dispatcher::{ActionError, Dispatcher};
pub use projection::{Projection, ProjectionReader, ProjectionStore};
pub use provider_directory::{ProviderDetail, ProviderDirectory, ProviderEndpoint, ProviderInfo};
pub use session::{AlloyConnector, Client, Connector, Session};
pub use snapshot::SnapshotError;
pub use types::{LotteryRecord, LotteryTerms, LotteryUpdate};
