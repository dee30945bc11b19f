use axum::{
    extract::State,
    routing::{delete, get, post},
    Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    ActivityRequest, FoodEntryRequest, LogWithSummary, RangeQuery, UpdateFoodEntryRequest,
    WaterRequest,
};
use super::repo_types::{ActivityEntry, DailyLogWithEntries, FoodEntry, WaterEntry};
use super::services;
use super::summary::{DailySummary, RangeSummary};
use crate::{
    auth::services::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    response::ApiResponse,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs))
        .route("/logs/today", get(today_log))
        .route("/logs/today/summary", get(today_summary))
        .route("/logs/:id", get(get_log))
        .route("/summary", get(range_summary))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/logs/today/foods", post(append_food))
        .route("/logs/today/activities", post(append_activity))
        .route("/logs/today/water", post(append_water))
        .route(
            "/logs/foods/:id",
            delete(delete_food_entry).patch(update_food_entry),
        )
        .route("/logs/activities/:id", delete(delete_activity_entry))
        .route("/logs/water/:id", delete(delete_water_entry))
}

#[instrument(skip(state, auth))]
pub async fn today_log(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Result<ApiResponse<DailyLogWithEntries>, AppError> {
    let log = services::get_or_create_today_log(
        state.logs.as_ref(),
        AuthUser::identity(auth),
        state.config.day_offset,
    )
    .await?;
    Ok(ApiResponse::ok("Today's log fetched", log))
}

#[instrument(skip(state, auth))]
pub async fn today_summary(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Result<ApiResponse<DailySummary>, AppError> {
    let summary = services::today_summary(
        state.logs.as_ref(),
        AuthUser::identity(auth),
        OffsetDateTime::now_utc(),
        state.config.day_offset,
    )
    .await?;
    Ok(ApiResponse::ok("Today's summary fetched", summary))
}

#[instrument(skip(state, auth))]
pub async fn get_log(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<DailyLogWithEntries>, AppError> {
    let log = services::get_log(state.logs.as_ref(), AuthUser::identity(auth), id).await?;
    Ok(ApiResponse::ok("Log fetched", log))
}

#[instrument(skip(state, auth))]
pub async fn list_logs(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiQuery(q): ApiQuery<RangeQuery>,
) -> Result<ApiResponse<Vec<LogWithSummary>>, AppError> {
    let logs = services::list_logs(
        state.logs.as_ref(),
        AuthUser::identity(auth),
        q,
        OffsetDateTime::now_utc(),
        state.config.day_offset,
    )
    .await?;
    Ok(ApiResponse::ok("Logs fetched", logs))
}

#[instrument(skip(state, auth))]
pub async fn range_summary(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiQuery(q): ApiQuery<RangeQuery>,
) -> Result<ApiResponse<RangeSummary>, AppError> {
    let summary = services::range_summary(
        state.logs.as_ref(),
        AuthUser::identity(auth),
        q,
        OffsetDateTime::now_utc(),
        state.config.day_offset,
    )
    .await?;
    Ok(ApiResponse::ok("Summary fetched", summary))
}

#[instrument(skip(state, auth, body))]
pub async fn append_food(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiJson(body): ApiJson<FoodEntryRequest>,
) -> Result<ApiResponse<FoodEntry>, AppError> {
    let entry = services::append_food_entry(
        state.logs.as_ref(),
        state.foods.as_ref(),
        AuthUser::identity(auth),
        body,
        OffsetDateTime::now_utc(),
        state.config.day_offset,
    )
    .await?;
    Ok(ApiResponse::created("Food entry added", entry))
}

#[instrument(skip(state, auth, body))]
pub async fn append_activity(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiJson(body): ApiJson<ActivityRequest>,
) -> Result<ApiResponse<ActivityEntry>, AppError> {
    let entry = services::append_activity_entry(
        state.logs.as_ref(),
        AuthUser::identity(auth),
        body,
        OffsetDateTime::now_utc(),
        state.config.day_offset,
    )
    .await?;
    Ok(ApiResponse::created("Activity added", entry))
}

#[instrument(skip(state, auth))]
pub async fn append_water(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiJson(body): ApiJson<WaterRequest>,
) -> Result<ApiResponse<WaterEntry>, AppError> {
    let entry = services::append_water_entry(
        state.logs.as_ref(),
        AuthUser::identity(auth),
        body,
        OffsetDateTime::now_utc(),
        state.config.day_offset,
    )
    .await?;
    Ok(ApiResponse::created("Water intake added", entry))
}

#[instrument(skip(state, auth, body))]
pub async fn update_food_entry(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateFoodEntryRequest>,
) -> Result<ApiResponse<FoodEntry>, AppError> {
    let entry =
        services::update_food_entry(state.logs.as_ref(), AuthUser::identity(auth), id, body)
            .await?;
    Ok(ApiResponse::ok("Food entry updated", entry))
}

#[instrument(skip(state, auth))]
pub async fn delete_food_entry(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    services::delete_food_entry(state.logs.as_ref(), AuthUser::identity(auth), id).await?;
    Ok(ApiResponse::done("Food entry deleted"))
}

#[instrument(skip(state, auth))]
pub async fn delete_activity_entry(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    services::delete_activity_entry(state.logs.as_ref(), AuthUser::identity(auth), id).await?;
    Ok(ApiResponse::done("Activity deleted"))
}

#[instrument(skip(state, auth))]
pub async fn delete_water_entry(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<()>, AppError> {
    services::delete_water_entry(state.logs.as_ref(), AuthUser::identity(auth), id).await?;
    Ok(ApiResponse::done("Water entry deleted"))
}
