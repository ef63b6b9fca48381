use super::{claims::ClaimSet, failure::AuthFailure};

/// Allow when `claims.permissions` contains `required` exactly (case-sensitive).
///
/// A missing `permissions` claim and a present-but-lacking one are reported
/// as different failures so that misconfigured tokens are easy to spot.
pub fn check_permission(required: &str, claims: ClaimSet) -> Result<ClaimSet, AuthFailure> {
    let granted = claims
        .permissions()
        .ok_or(AuthFailure::PermissionsClaimMissing)?;

    if !granted.contains(&required) {
        return Err(AuthFailure::PermissionNotFound);
    }

    Ok(claims)
}
