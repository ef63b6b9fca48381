/*
 * Responsibility
 * - Typed failures of the authorization gate (extract -> verify -> permission)
 * - Each kind carries a fixed HTTP status and a human-readable message
 * - No axum response logic here: conversion to a response happens in crate::error
 */
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Authorization header is expected.")]
    AuthorizationHeaderMissing,

    #[error("Authorization header must be a bearer token: \"Bearer <token>\".")]
    AuthorizationHeaderMalformed,

    #[error("Unable to parse authentication token.")]
    TokenMalformed,

    #[error("Unable to find the appropriate signing key.")]
    SigningKeyNotFound,

    #[error("Unable to fetch signing keys from the identity authority.")]
    KeyFetchFailed,

    #[error("Token signature is invalid.")]
    SignatureInvalid,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("Token is invalid.")]
    TokenInvalid,

    #[error("Permissions not included in token.")]
    PermissionsClaimMissing,

    #[error("Permission not found.")]
    PermissionNotFound,
}

impl AuthFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PermissionsClaimMissing | Self::PermissionNotFound => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable snake_case identifier, used as a log field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthorizationHeaderMissing => "authorization_header_missing",
            Self::AuthorizationHeaderMalformed => "authorization_header_malformed",
            Self::TokenMalformed => "token_malformed",
            Self::SigningKeyNotFound => "signing_key_not_found",
            Self::KeyFetchFailed => "key_fetch_failed",
            Self::SignatureInvalid => "signature_invalid",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims => "invalid_claims",
            Self::TokenInvalid => "token_invalid",
            Self::PermissionsClaimMissing => "permissions_claim_missing",
            Self::PermissionNotFound => "permission_not_found",
        }
    }
}
