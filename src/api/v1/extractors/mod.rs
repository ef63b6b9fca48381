/*!
 * Request extractors shared by v1 handlers.
 */
mod authorization;

pub use authorization::AuthorizationHeader;
