/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /drinks, /drinks-detail, /drinks/{id}
 * - 認可は route_layer ではなく各 handler の先頭で (必要な permission が handler ごとに異なるため)
 */
use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    drinks::{create_drink, delete_drink, list_drink_details, list_drinks, update_drink},
    health::health,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/drinks", get(list_drinks).post(create_drink))
        .route("/drinks-detail", get(list_drink_details))
        .route("/drinks/{id}", patch(update_drink).delete(delete_drink))
}
