pub mod bearer;
pub mod claims;
pub mod factory;
pub mod failure;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

pub use bearer::bearer_token;
pub use claims::ClaimSet;
pub use factory::build_auth_gate;
pub use failure::AuthFailure;
pub use gate::AuthGate;
pub use jwks::{HttpKeySource, KeyFetchError, KeySetCache, KeySetCachePolicy, KeySource, SigningKeySet};
pub use permissions::check_permission;
pub use verifier::{TokenVerifier, VerifierPolicy};
