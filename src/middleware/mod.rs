/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 認可は middleware ではなく handler 側 (services::auth::AuthGate)
 */
pub mod cors;
pub mod http;
pub mod security_headers;
