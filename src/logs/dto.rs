use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::DailyLogWithEntries;
use super::summary::DailySummary;

/// Either `food_id` (macros copied from the food) or a manual `name`
/// with per-serving macros.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodEntryRequest {
    pub food_id: Option<Uuid>,
    pub name: Option<String>,
    pub servings: Option<f64>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFoodEntryRequest {
    pub name: Option<String>,
    pub servings: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRequest {
    pub name: String,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default)]
    pub calories_burned: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WaterRequest {
    pub amount_ml: i32,
}

/// `from`/`to` as `YYYY-MM-DD`, both inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogWithSummary {
    #[serde(flatten)]
    pub log: DailyLogWithEntries,
    pub summary: DailySummary,
}
