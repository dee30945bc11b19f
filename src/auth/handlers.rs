use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, CredentialsRequest, PublicUser, RefreshRequest},
        services::{self, AuthUser, JwtKeys},
    },
    error::AppError,
    extract::ApiJson,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let auth = services::register(&state.db, &keys, payload).await?;
    Ok(ApiResponse::created("Account created", auth))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let auth = services::login(&state.db, &keys, payload).await?;
    Ok(ApiResponse::ok("Logged in", auth))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let auth = services::refresh(&state.db, &keys, &payload.refresh_token).await?;
    Ok(ApiResponse::ok("Token refreshed", auth))
}

#[instrument(skip(state, auth))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    let user = services::me(&state.db, AuthUser::identity(auth)).await?;
    Ok(ApiResponse::ok("Current user", user))
}
