#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use coffee_shop_api::{
    AppState,
    repos::{DrinkRepo, DrinkRow, Ingredient, error::RepoError},
    services::auth::{
        AuthGate, KeyFetchError, KeySetCache, KeySetCachePolicy, KeySource, SigningKeySet,
        TokenVerifier, VerifierPolicy,
    },
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, jwk::JwkSet};
use serde_json::{Value, json};
use sqlx::types::Json;

pub const ISSUER: &str = "https://coffee.test.auth0.com/";
pub const AUDIENCE: &str = "drinks";

pub const TRUSTED_KID: &str = "trusted-key";
pub const ROTATED_KID: &str = "rotated-key";

pub const TRUSTED_PEM: &str = include_str!("../fixtures/trusted_rsa.pem");
pub const ROGUE_PEM: &str = include_str!("../fixtures/rogue_rsa.pem");

const TRUSTED_N: &str = "5cTJIw7zMQzTdxgRkLYu9QPExIW9KOtEdi6vAtXt8sfuSpNo8FkqLZRZs7osHCKa617dCHzn_FvCE_tFzYvmROg8hFXzhJjMPhyNrGs8HX9Fd8dZd5nDaGWpWgvNOVpD-qlGI44xb0qDIDMVGtViCFQMOASoWEa0Tjioh1WYHwscy59BvAThtSXb03t0j-rnN458hybEPCShzF0ie7TKnsALaOSRm_8BnvbXRgIoYa-n8XxKIWoDli4b_AQSf5jmMVPd8i8Sc6-SO7Num2_mmkBohl3LNl97mElSQFYg9kZAr_ox4MHn9lX0envqdPqQXLRTXOlJKAN2xDtWSNU1yw";
const ROGUE_N: &str = "u1hJwvRDQ0eZWlAr2xwJKnTDq01ixh7eNntAM_bjs0UuY84q-IcFexOtCEnctCJMfpbDsBd-4TsvxU4TwOFwtAqcSCUl2z0oyrB7txQCAu8vv07wzpThOCrwHHzuT__zY3LS_xG_YhVU0TC8o8pdj0CFeWC1KKp1K1CZVNsvcaznUOF47kbDji5GtP7VE_3Cf_qijG8LOKT9_EXw9Z7uXWSf_Hutg2pquIuvreKKEdc6_OeLOzGvnVMh5Mf61f6FgosFht8BMsUOIYzvZgvFKz0bGZyW-Ss0qMEmlUHcfDKsPmr5mtDtz8mYcrNeLGaDTxW3dnh2FXj-6FeQlXwX_Q";

fn rsa_jwk(kid: &str, n: &str) -> Value {
    json!({
        "kty": "RSA",
        "use": "sig",
        "alg": "RS256",
        "kid": kid,
        "n": n,
        "e": "AQAB",
    })
}

/// `{"keys": [...]}` with the trusted public key under `TRUSTED_KID`.
pub fn trusted_jwks_json() -> Value {
    json!({ "keys": [rsa_jwk(TRUSTED_KID, TRUSTED_N)] })
}

/// After rotation the authority publishes the rogue key under `ROTATED_KID` as well.
pub fn rotated_jwks_json() -> Value {
    json!({ "keys": [rsa_jwk(TRUSTED_KID, TRUSTED_N), rsa_jwk(ROTATED_KID, ROGUE_N)] })
}

pub fn key_set(value: Value) -> SigningKeySet {
    let keys: JwkSet = serde_json::from_value(value).expect("jwks json");
    SigningKeySet::new(keys)
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn claims(permissions: &[&str]) -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|barista",
        "iat": now(),
        "exp": now() + 3600,
        "permissions": permissions,
    })
}

pub fn mint(kid: Option<&str>, pem: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("rsa pem");
    jsonwebtoken::encode(&header, claims, &key).expect("sign")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Trusted-key token with the given permissions.
pub fn token_with(permissions: &[&str]) -> String {
    mint(Some(TRUSTED_KID), TRUSTED_PEM, &claims(permissions))
}

/// In-memory key source; serves `sets` in order, repeating the last one.
pub struct StaticKeySource {
    sets: Vec<Value>,
    fetches: AtomicUsize,
    delay: Duration,
}

impl StaticKeySource {
    pub fn new(jwks: Value) -> Self {
        Self::rotating(vec![jwks])
    }

    pub fn rotating(sets: Vec<Value>) -> Self {
        Self {
            sets,
            fetches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<SigningKeySet, KeyFetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        let value = self.sets[n.min(self.sets.len() - 1)].clone();
        Ok(key_set(value))
    }
}

/// Always fails, counting attempts.
#[derive(Default)]
pub struct UnreachableKeySource {
    attempts: AtomicUsize,
}

impl UnreachableKeySource {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for UnreachableKeySource {
    async fn fetch(&self) -> Result<SigningKeySet, KeyFetchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(KeyFetchError::Unavailable("authority unreachable".into()))
    }
}

pub fn cache_policy() -> KeySetCachePolicy {
    KeySetCachePolicy {
        ttl: Duration::from_secs(600),
        min_refresh_interval: Duration::from_secs(30),
        fetch_retries: 0,
        retry_backoff: Duration::from_millis(1),
    }
}

pub fn verifier_policy() -> VerifierPolicy {
    VerifierPolicy {
        audience: AUDIENCE.to_string(),
        issuer: Some(ISSUER.to_string()),
        algorithms: vec![Algorithm::RS256],
        leeway_seconds: 0,
    }
}

pub fn gate_with(source: Arc<dyn KeySource>, policy: KeySetCachePolicy) -> AuthGate {
    let cache = KeySetCache::new(source, policy);
    AuthGate::new(TokenVerifier::new(cache, verifier_policy()))
}

pub fn gate(source: Arc<dyn KeySource>) -> AuthGate {
    gate_with(source, cache_policy())
}

#[derive(Default)]
pub struct MemoryDrinkRepo {
    rows: Mutex<Vec<DrinkRow>>,
    next_id: AtomicUsize,
}

impl MemoryDrinkRepo {
    pub fn seeded(drinks: &[(&str, Vec<Ingredient>)]) -> Self {
        let repo = Self::default();
        for (title, recipe) in drinks {
            repo.insert(title, recipe.clone()).expect("seed");
        }
        repo
    }

    fn insert(&self, title: &str, recipe: Vec<Ingredient>) -> Result<DrinkRow, RepoError> {
        let mut rows = self.rows.lock().expect("lock");
        if rows.iter().any(|r| r.title == title) {
            return Err(RepoError::Conflict);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let row = DrinkRow {
            id,
            title: title.to_string(),
            recipe: Json(recipe),
        };
        rows.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl DrinkRepo for MemoryDrinkRepo {
    async fn list(&self) -> Result<Vec<DrinkRow>, RepoError> {
        Ok(self.rows.lock().expect("lock").clone())
    }

    async fn create(&self, title: &str, recipe: &[Ingredient]) -> Result<DrinkRow, RepoError> {
        self.insert(title, recipe.to_vec())
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> Result<Option<DrinkRow>, RepoError> {
        let mut rows = self.rows.lock().expect("lock");
        if let Some(title) = title
            && rows.iter().any(|r| r.title == title && r.id != id)
        {
            return Err(RepoError::Conflict);
        }
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            row.title = title.to_string();
        }
        if let Some(recipe) = recipe {
            row.recipe = Json(recipe.to_vec());
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let mut rows = self.rows.lock().expect("lock");
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}

pub fn ingredient(name: &str, color: &str, parts: u32) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        color: color.to_string(),
        parts,
    }
}

pub fn app_state(repo: MemoryDrinkRepo) -> AppState {
    let source = Arc::new(StaticKeySource::new(trusted_jwks_json()));
    AppState::new(Arc::new(repo), Arc::new(gate(source)))
}
