use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Verified, decoded access-token payload.
///
/// Only produced by `TokenVerifier` after signature, `exp`, `aud` (and `iss`
/// when enforced) have been checked. Other claims are carried through as-is
/// and are not validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClaimSet {
    claims: Map<String, Value>,
}

impl ClaimSet {
    pub(crate) fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.get("exp")
            .and_then(Value::as_i64)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// The `permissions` collection, if the claim is present as an array.
    ///
    /// - `None`: claim absent (or not an array)
    /// - `Some(vec![])`: claim present but empty
    ///
    /// Non-string entries are skipped.
    pub fn permissions(&self) -> Option<Vec<&str>> {
        match self.get("permissions")? {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }
}
