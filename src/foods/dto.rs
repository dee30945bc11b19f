use serde::Deserialize;

/// Body for creating or replacing a food. Macros are per serving.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodRequest {
    pub name: String,
    pub brand: Option<String>,
    #[serde(default = "default_serving_size")]
    pub serving_size_g: f64,
    /// Computed from macros when omitted.
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

fn default_serving_size() -> f64 {
    100.0
}

#[derive(Debug, Deserialize)]
pub struct FoodListQuery {
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
