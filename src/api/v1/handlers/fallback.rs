/*
 * Responsibility
 * - 未定義のパス (404) / メソッド (405) も JSON のエラーボディで返す
 */
use crate::error::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
