use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Food database item. `owner_id = None` marks a shared catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: f64,
    pub calories: f64,  // per serving
    pub protein_g: f64, // per serving
    pub carbs_g: f64,   // per serving
    pub fat_g: f64,     // per serving
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated food fields, used for both insert and full update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFood {
    pub name: String,
    pub brand: Option<String>,
    pub serving_size_g: f64,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FoodSearch {
    pub text: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
