/*
 * Responsibility
 * - /drinks 系 handler
 * - 保護された操作は先頭で AuthGate::authorize(header, permission) を明示的に呼ぶ
 *   (body / path の解釈より先に認可する: 401/403 が 422/404 より優先)
 * - short / long の表現は dto 側で組み立てる
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::{debug, info};

use crate::{
    api::v1::{
        dto::drinks::{
            CreateDrinkRequest, DeleteResponse, DrinkLong, DrinkShort, DrinksResponse,
            UpdateDrinkRequest,
        },
        extractors::AuthorizationHeader,
    },
    error::AppError,
    state::AppState,
};

pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub const POST_DRINKS: &str = "post:drinks";
pub const PATCH_DRINKS: &str = "patch:drinks";
pub const DELETE_DRINKS: &str = "delete:drinks";

fn drink_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|err| {
        debug!(error = %err, "invalid drink id");
        AppError::NotFound
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(req)| req).map_err(|err| {
        debug!(error = %err, "rejected drink body");
        // body limit hit while buffering
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::Unprocessable
        }
    })
}

async fn all_long(state: &AppState) -> Result<Vec<DrinkLong>, AppError> {
    let rows = state.drinks.list().await?;
    Ok(rows.into_iter().map(DrinkLong::from).collect())
}

pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<Vec<DrinkShort>>>, AppError> {
    let rows = state.drinks.list().await?;
    let drinks = rows.into_iter().map(DrinkShort::from).collect();

    Ok(Json(DrinksResponse::ok(drinks)))
}

pub async fn list_drink_details(
    State(state): State<AppState>,
    authorization: AuthorizationHeader,
) -> Result<Json<DrinksResponse<Vec<DrinkLong>>>, AppError> {
    state
        .auth
        .authorize(authorization.as_deref(), GET_DRINKS_DETAIL)
        .await?;

    Ok(Json(DrinksResponse::ok(all_long(&state).await?)))
}

pub async fn create_drink(
    State(state): State<AppState>,
    authorization: AuthorizationHeader,
    body: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Vec<DrinkLong>>>, AppError> {
    let claims = state
        .auth
        .authorize(authorization.as_deref(), POST_DRINKS)
        .await?;

    let (title, recipe) = json_body(body)?.validate().map_err(|reason| {
        debug!(reason, "invalid drink");
        AppError::Unprocessable
    })?;

    let row = state.drinks.create(&title, &recipe).await?;
    info!(
        id = row.id,
        sub = claims.subject(),
        token_exp = ?claims.expires_at(),
        "drink created"
    );

    Ok(Json(DrinksResponse::ok(all_long(&state).await?)))
}

pub async fn update_drink(
    State(state): State<AppState>,
    authorization: AuthorizationHeader,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let claims = state
        .auth
        .authorize(authorization.as_deref(), PATCH_DRINKS)
        .await?;

    let id = drink_id(path)?;
    let req = json_body(body)?;
    req.validate().map_err(|reason| {
        debug!(reason, "invalid drink update");
        AppError::Unprocessable
    })?;

    let recipe = req.recipe.map(|r| r.into_ingredients());
    let row = state
        .drinks
        .update(id, req.title.as_deref(), recipe.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;
    info!(
        id,
        sub = claims.subject(),
        token_exp = ?claims.expires_at(),
        "drink updated"
    );

    Ok(Json(DrinksResponse::ok(DrinkLong::from(row))))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    authorization: AuthorizationHeader,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let claims = state
        .auth
        .authorize(authorization.as_deref(), DELETE_DRINKS)
        .await?;

    let id = drink_id(path)?;
    if !state.drinks.delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!(
        id,
        sub = claims.subject(),
        token_exp = ?claims.expires_at(),
        "drink deleted"
    );

    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
