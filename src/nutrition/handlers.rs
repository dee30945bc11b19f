use axum::{routing::get, Router};
use serde::Deserialize;
use tracing::instrument;

use super::calories::{CalorieResult, MacroKind, MacronutrientAmount};
use crate::{error::AppError, extract::ApiQuery, response::ApiResponse, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CalorieQuery {
    pub grams: Option<f64>,
    pub kind: Option<String>,
}

pub fn nutrition_routes() -> Router<AppState> {
    Router::new().route("/nutrition/calories", get(calculate_calories))
}

#[instrument]
pub async fn calculate_calories(
    ApiQuery(q): ApiQuery<CalorieQuery>,
) -> Result<ApiResponse<CalorieResult>, AppError> {
    let grams = q.grams.ok_or_else(|| AppError::validation("grams is required"))?;
    let kind: MacroKind = q
        .kind
        .as_deref()
        .ok_or_else(|| AppError::validation("kind is required"))?
        .parse()?;
    let result = MacronutrientAmount::new(grams, kind)?.calories();
    Ok(ApiResponse::ok("Calories calculated", result))
}
