use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

/// Raw `Authorization` header value, handed to `AuthGate::authorize`.
///
/// Never rejects: a missing header is `None` and is reported by the gate.
/// Non-UTF-8 bytes are replaced so the gate sees a malformed header instead of
/// a missing one.
#[derive(Debug, Clone)]
pub struct AuthorizationHeader(pub Option<String>);

impl AuthorizationHeader {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for AuthorizationHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        Ok(Self(value))
    }
}
