//! `Authorization: Bearer <token>` parsing.

use super::failure::AuthFailure;

/// Pull the bearer token out of a raw `Authorization` header value.
///
/// The value must split on whitespace into exactly two parts: the scheme
/// `bearer` (any case) and a token. The token is returned as-is.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthFailure> {
    let header = header.ok_or(AuthFailure::AuthorizationHeaderMissing)?;

    let mut parts = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthFailure::AuthorizationHeaderMalformed);
    };

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthFailure::AuthorizationHeaderMalformed);
    }

    Ok(token)
}
