use std::collections::HashSet;

use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header, errors::ErrorKind,
};
use serde_json::{Map, Value};
use tracing::debug;

use super::{claims::ClaimSet, failure::AuthFailure, jwks::KeySetCache};

/// What a token must satisfy besides a valid signature.
#[derive(Debug, Clone)]
pub struct VerifierPolicy {
    pub audience: String,
    // `None` disables the `iss` check.
    pub issuer: Option<String>,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
}

/// Verifies an access token against the identity authority's signing keys.
///
/// 1. decode the header (unverified) and take its `kid`
/// 2. resolve the key from the key-set cache
/// 3. verify the signature with the header's algorithm (must be allowed by policy)
/// 4. validate `exp`, `aud` and, when configured, `iss`
#[derive(Debug)]
pub struct TokenVerifier {
    keys: KeySetCache,
    policy: VerifierPolicy,
}

impl TokenVerifier {
    pub fn new(keys: KeySetCache, policy: VerifierPolicy) -> Self {
        Self { keys, policy }
    }

    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthFailure> {
        if token.split('.').count() != 3 {
            return Err(AuthFailure::TokenMalformed);
        }

        let header = decode_header(token).map_err(|err| {
            debug!(error = %err, "undecodable token header");
            AuthFailure::TokenMalformed
        })?;
        let kid = header.kid.ok_or(AuthFailure::TokenMalformed)?;

        if !self.policy.algorithms.contains(&header.alg) {
            debug!(alg = ?header.alg, "token algorithm not accepted");
            return Err(AuthFailure::TokenInvalid);
        }

        let jwk = self.keys.key_for(&kid).await?;
        let decoding_key = DecodingKey::from_jwk(&jwk).map_err(|err| {
            debug!(error = %err, kid = %kid, "unusable signing key");
            AuthFailure::TokenInvalid
        })?;

        let validation = self.validation(header.alg);
        let data = decode::<Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(|err| classify(err.kind()))?;

        Ok(ClaimSet::new(data.claims))
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.policy.leeway_seconds;
        validation.set_audience(&[&self.policy.audience]);

        let mut required: HashSet<String> = ["exp", "aud"].map(String::from).into();
        if let Some(issuer) = &self.policy.issuer {
            validation.set_issuer(&[issuer]);
            required.insert("iss".to_string());
        }
        validation.required_spec_claims = required;

        validation
    }
}

fn classify(kind: &ErrorKind) -> AuthFailure {
    match kind {
        // the header already decoded and the signature is checked before the payload,
        // so undecodable base64 at this point is the signature segment
        ErrorKind::InvalidSignature | ErrorKind::Base64(_) => AuthFailure::SignatureInvalid,
        ErrorKind::ExpiredSignature => AuthFailure::TokenExpired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => AuthFailure::InvalidClaims,
        other => {
            debug!(error = ?other, "token rejected");
            AuthFailure::TokenInvalid
        }
    }
}
