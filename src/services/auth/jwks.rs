//! Signing key set (JWKS) retrieval and caching.
//!
//! `KeySource` is the seam to the identity authority; `HttpKeySource` talks to
//! its well-known endpoint. `KeySetCache` sits in front of a source and is
//! shared by all requests:
//! - the current set is an `Arc` swapped wholesale under a read-write lock
//! - refreshes are serialized so concurrent misses produce one fetch
//! - an unknown `kid` triggers a refresh at most once per `min_refresh_interval`

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use url::Url;

use super::failure::AuthFailure;

#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("key set request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("key set endpoint returned status {0}")]
    Status(u16),
    #[error("key set unavailable: {0}")]
    Unavailable(String),
}

/// Public keys published by the identity authority, looked up by `kid`.
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    keys: JwkSet,
}

impl SigningKeySet {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }

    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.find(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.keys.is_empty()
    }
}

/// Where signing keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<SigningKeySet, KeyFetchError>;
}

/// Fetches the key set from `https://<domain>/.well-known/jwks.json` (or a configured URL).
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, KeyFetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySource for HttpKeySource {
    async fn fetch(&self) -> Result<SigningKeySet, KeyFetchError> {
        debug!(url = %self.url, "fetching signing key set");

        let resp = self.client.get(self.url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(KeyFetchError::Status(status.as_u16()));
        }

        let keys: JwkSet = resp.json().await?;
        Ok(SigningKeySet::new(keys))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeySetCachePolicy {
    // How long a fetched set is served without refetching. Zero disables caching.
    pub ttl: Duration,
    // Lower bound between refreshes caused by an unknown `kid`.
    pub min_refresh_interval: Duration,
    // Extra attempts after a failed fetch.
    pub fetch_retries: u32,
    // First retry delay; doubles on every attempt.
    pub retry_backoff: Duration,
}

impl Default for KeySetCachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            min_refresh_interval: Duration::from_secs(30),
            fetch_retries: 1,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

struct CachedKeySet {
    keys: Arc<SigningKeySet>,
    fetched_at: Instant,
}

pub struct KeySetCache {
    source: Arc<dyn KeySource>,
    policy: KeySetCachePolicy,
    current: RwLock<Option<CachedKeySet>>,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("policy", &self.policy)
            .finish()
    }
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySource>, policy: KeySetCachePolicy) -> Self {
        Self {
            source,
            policy,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Resolve the public key for `kid`, refreshing the set when needed.
    pub async fn key_for(&self, kid: &str) -> Result<Jwk, AuthFailure> {
        let seen = self.snapshot().await;

        if let Some((keys, fetched_at)) = &seen {
            let age = fetched_at.elapsed();
            if age < self.policy.ttl {
                if let Some(jwk) = keys.find(kid) {
                    return Ok(jwk.clone());
                }
                if age < self.policy.min_refresh_interval {
                    return Err(AuthFailure::SigningKeyNotFound);
                }
            }
        }

        let keys = self.refresh(seen.map(|(_, at)| at)).await?;
        keys.find(kid)
            .cloned()
            .ok_or(AuthFailure::SigningKeyNotFound)
    }

    async fn snapshot(&self) -> Option<(Arc<SigningKeySet>, Instant)> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|c| (Arc::clone(&c.keys), c.fetched_at))
    }

    async fn refresh(&self, seen: Option<Instant>) -> Result<Arc<SigningKeySet>, AuthFailure> {
        let _guard = self.refresh_lock.lock().await;

        // Another request refreshed while we were waiting for the lock.
        if let Some((keys, fetched_at)) = self.snapshot().await
            && seen.is_none_or(|s| fetched_at > s)
        {
            return Ok(keys);
        }

        let keys = self.fetch_with_retry().await.map_err(|err| {
            warn!(error = %err, "signing key set fetch failed");
            AuthFailure::KeyFetchFailed
        })?;

        debug!(keys = keys.len(), "signing key set refreshed");

        let keys = Arc::new(keys);
        *self.current.write().await = Some(CachedKeySet {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });

        Ok(keys)
    }

    async fn fetch_with_retry(&self) -> Result<SigningKeySet, KeyFetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.source.fetch().await {
                Ok(keys) => return Ok(keys),
                Err(err) if attempt < self.policy.fetch_retries => {
                    let delay = self
                        .policy
                        .retry_backoff
                        .saturating_mul(1u32 << attempt.min(16));
                    warn!(error = %err, attempt, ?delay, "signing key set fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
