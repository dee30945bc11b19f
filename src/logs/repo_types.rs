use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::day::iso_date;
use crate::nutrition::MacroTotals;

/// One aggregate log per user per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DailyLog {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(serialize_with = "iso_date::serialize")]
    pub log_date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Food eaten; macros are per serving.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct FoodEntry {
    pub id: Uuid,
    pub log_id: Uuid,
    pub user_id: Uuid,
    pub food_id: Option<Uuid>,
    pub name: String,
    pub servings: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl FoodEntry {
    pub fn totals(&self) -> MacroTotals {
        MacroTotals::scaled(
            self.calories,
            self.protein_g,
            self.carbs_g,
            self.fat_g,
            self.servings,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub log_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub calories_burned: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WaterEntry {
    pub id: Uuid,
    pub log_id: Uuid,
    pub user_id: Uuid,
    pub amount_ml: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogEntries {
    pub foods: Vec<FoodEntry>,
    pub activities: Vec<ActivityEntry>,
    pub water: Vec<WaterEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLogWithEntries {
    #[serde(flatten)]
    pub log: DailyLog,
    #[serde(flatten)]
    pub entries: LogEntries,
}

// ---- insert payloads (already validated) ----

#[derive(Debug, Clone)]
pub struct NewFoodEntry {
    pub food_id: Option<Uuid>,
    pub name: String,
    pub servings: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone)]
pub struct NewActivityEntry {
    pub name: String,
    pub duration_minutes: i32,
    pub calories_burned: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct NewWaterEntry {
    pub amount_ml: i32,
}

#[derive(Debug, Clone, Default)]
pub struct FoodEntryChanges {
    pub name: Option<String>,
    pub servings: Option<f64>,
}
