/*
 * Responsibility
 * - モジュール構成の公開 (main.rs と tests/ の両方から使う)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;

pub use app::build_router;
pub use state::AppState;
