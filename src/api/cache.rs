//! Client cache keyed by token
//!
//! The router asks for a client on every call. A new client (and with it a new
//! account lookup) is only built when the resolved token differs from the one
//! the cached client was built with.

use std::sync::{Arc, Mutex, MutexGuard};

use super::client::{ClientConfig, ClientError, FizzyApi, HttpClient};
use crate::config::Credentials;

/// Builds a client for the given configuration
pub type ClientFactory =
    Arc<dyn Fn(ClientConfig) -> Result<Arc<dyn FizzyApi>, ClientError> + Send + Sync>;

struct CachedClient {
    token: String,
    client: Arc<dyn FizzyApi>,
}

pub struct ClientCache {
    factory: ClientFactory,
    slot: Mutex<Option<CachedClient>>,
}

impl ClientCache {
    pub fn new(factory: ClientFactory) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
        }
    }

    /// Cache producing real HTTP clients
    pub fn http() -> Self {
        Self::new(Arc::new(
            |config: ClientConfig| -> Result<Arc<dyn FizzyApi>, ClientError> {
                let client: Arc<dyn FizzyApi> = Arc::new(HttpClient::new(config)?);
                Ok(client)
            },
        ))
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedClient>> {
        // A panic while holding the lock cannot leave the slot half-written.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Client for `credentials`, or `None` when there is no token.
    ///
    /// A failed construction leaves the cache empty so the next call retries.
    pub fn client_for(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Arc<dyn FizzyApi>>, ClientError> {
        let Some(config) = ClientConfig::from_credentials(credentials) else {
            self.invalidate();
            return Ok(None);
        };

        let mut slot = self.lock();
        if let Some(cached) = slot.as_ref() {
            if cached.token == config.token {
                return Ok(Some(cached.client.clone()));
            }
            tracing::info!("API token changed, rebuilding Fizzy client");
        }

        *slot = None;
        let token = config.token.clone();
        let client = (self.factory)(config)?;
        *slot = Some(CachedClient {
            token,
            client: client.clone(),
        });
        tracing::debug!(url = %credentials.url, "Built Fizzy client");
        Ok(Some(client))
    }

    /// Drop the cached client; the next call builds a fresh one
    pub fn invalidate(&self) {
        self.lock().take();
    }

    pub fn is_populated(&self) -> bool {
        self.lock().is_some()
    }
}

impl Default for ClientCache {
    fn default() -> Self {
        Self::http()
    }
}
