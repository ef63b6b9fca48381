/// Factory: build `AuthGate` from application `Config`.
use std::{sync::Arc, time::Duration};

use crate::config::Config;
use crate::services::auth::{
    AuthGate, HttpKeySource, KeyFetchError, KeySetCache, KeySetCachePolicy, TokenVerifier,
    VerifierPolicy,
};

pub fn build_auth_gate(config: &Config) -> Result<Arc<AuthGate>, KeyFetchError> {
    let source = HttpKeySource::new(
        config.jwks_url.clone(),
        Duration::from_secs(config.jwks_fetch_timeout_seconds),
    )?;

    let cache = KeySetCache::new(
        Arc::new(source),
        KeySetCachePolicy {
            ttl: Duration::from_secs(config.jwks_cache_ttl_seconds),
            min_refresh_interval: Duration::from_secs(config.jwks_min_refresh_seconds),
            fetch_retries: config.jwks_fetch_retries,
            ..KeySetCachePolicy::default()
        },
    );

    let verifier = TokenVerifier::new(
        cache,
        VerifierPolicy {
            audience: config.api_audience.clone(),
            issuer: config
                .auth_enforce_issuer
                .then(|| config.auth_issuer.clone()),
            algorithms: config.algorithms.clone(),
            leeway_seconds: config.access_token_leeway_seconds,
        },
    );

    Ok(Arc::new(AuthGate::new(verifier)))
}
