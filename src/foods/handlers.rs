use axum::{extract::State, routing::get, Router};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{FoodListQuery, FoodRequest};
use super::repo_types::Food;
use super::services;
use crate::{
    auth::services::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    response::ApiResponse,
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route(
            "/foods/:id",
            get(get_food).put(update_food).delete(delete_food),
        )
}

#[instrument(skip(state, auth))]
pub async fn list_foods(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiQuery(q): ApiQuery<FoodListQuery>,
) -> Result<ApiResponse<Vec<Food>>, AppError> {
    let foods = services::list_foods(state.foods.as_ref(), AuthUser::identity(auth), q).await?;
    Ok(ApiResponse::ok("Foods fetched", foods))
}

#[instrument(skip(state, auth))]
pub async fn get_food(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<Food>, AppError> {
    let food = services::get_food(state.foods.as_ref(), AuthUser::identity(auth), id).await?;
    Ok(ApiResponse::ok("Food fetched", food))
}

#[instrument(skip(state, auth, body))]
pub async fn create_food(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiJson(body): ApiJson<FoodRequest>,
) -> Result<ApiResponse<Food>, AppError> {
    let food = services::create_food(
        state.foods.as_ref(),
        AuthUser::identity(auth),
        body,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(ApiResponse::created("Food created", food))
}

#[instrument(skip(state, auth, body))]
pub async fn update_food(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<FoodRequest>,
) -> Result<ApiResponse<Food>, AppError> {
    let food =
        services::update_food(state.foods.as_ref(), AuthUser::identity(auth), id, body).await?;
    Ok(ApiResponse::ok("Food updated", food))
}

#[instrument(skip(state, auth))]
pub async fn delete_food(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    services::delete_food(state.foods.as_ref(), AuthUser::identity(auth), id).await?;
    Ok(ApiResponse::done("Food deleted"))
}
