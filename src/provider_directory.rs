//! Registry of the signing providers a client can connect through.

use std::{fmt, sync::Arc};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Unique key of the provider within a directory.
    pub uuid: String,
    pub name: String,
    /// Reverse-DNS identifier, e.g. `io.metamask`.
    pub rdns: Option<String>,
}

/// How to reach a provider and which accounts it signs for.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub rpc_url: String,
    pub private_keys: Vec<String>,
}

impl fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("rpc_url", &self.rpc_url)
            .field("private_keys", &format!("<{} redacted>", self.private_keys.len()))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDetail {
    pub info: ProviderInfo,
    pub endpoint: ProviderEndpoint,
}

/// Announced providers plus an optional legacy injected one.
pub struct ProviderDirectory {
    providers: watch::Sender<Arc<Vec<ProviderDetail>>>,
    injected: Option<ProviderDetail>,
}

impl ProviderDirectory {
    pub fn new(injected: Option<ProviderDetail>) -> Self {
        let (providers, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            providers,
            injected,
        }
    }

    /// Add `detail` unless a provider with the same uuid is already known.
    ///
    /// Subscribers are only woken when the list actually grows.
    pub fn announce(&self, detail: ProviderDetail) -> bool {
        let uuid = detail.info.uuid.clone();
        let added = self.providers.send_if_modified(|providers| {
            if providers.iter().any(|p| p.info.uuid == detail.info.uuid) {
                return false;
            }
            let mut next = providers.as_ref().clone();
            next.push(detail);
            *providers = Arc::new(next);
            true
        });
        if added {
            info!(uuid = %uuid, "provider announced");
        } else {
            debug!(uuid = %uuid, "provider already announced");
        }
        added
    }

    pub fn snapshot(&self) -> Arc<Vec<ProviderDetail>> {
        self.providers.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<ProviderDetail>>> {
        self.providers.subscribe()
    }

    pub fn injected(&self) -> Option<&ProviderDetail> {
        self.injected.as_ref()
    }

    /// True when there is nothing to connect through.
    pub fn is_empty(&self) -> bool {
        self.injected.is_none() && self.providers.borrow().is_empty()
    }

    /// Find a provider by uuid or name, announced ones first.
    pub fn find(&self, key: &str) -> Option<ProviderDetail> {
        let matches = |p: &ProviderDetail| p.info.uuid == key || p.info.name == key;
        self.providers
            .borrow()
            .iter()
            .find(|&p| matches(p))
            .cloned()
            .or_else(|| self.injected.iter().find(|&p| matches(p)).cloned())
    }

    /// The provider used when none is named: the first announced one, or
    /// the injected one.
    pub fn default_provider(&self) -> Option<ProviderDetail> {
        self.providers
            .borrow()
            .first()
            .cloned()
            .or_else(|| self.injected.clone())
    }
}
