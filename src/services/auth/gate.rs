use tracing::warn;

use super::{
    bearer::bearer_token, claims::ClaimSet, failure::AuthFailure,
    permissions::check_permission, verifier::TokenVerifier,
};

/// Authorization gate called at the top of every protected handler.
///
/// Header -> bearer token -> verified claims -> required permission.
/// The first failing stage ends the pipeline.
#[derive(Debug)]
pub struct AuthGate {
    verifier: TokenVerifier,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        permission: &str,
    ) -> Result<ClaimSet, AuthFailure> {
        let result = self.run(authorization, permission).await;

        if let Err(failure) = &result {
            warn!(
                kind = failure.code(),
                status = failure.status().as_u16(),
                permission,
                "authorization denied"
            );
        }

        result
    }

    async fn run(
        &self,
        authorization: Option<&str>,
        permission: &str,
    ) -> Result<ClaimSet, AuthFailure> {
        let token = bearer_token(authorization)?;
        let claims = self.verifier.verify(token).await?;
        check_permission(permission, claims)
    }
}
