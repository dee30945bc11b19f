use serde::Serialize;
use time::Date;

use super::day::iso_date;
use super::repo_types::DailyLogWithEntries;
use crate::nutrition::MacroTotals;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    #[serde(serialize_with = "iso_date::serialize")]
    pub date: Date,
    pub consumed: MacroTotals,
    pub calories_burned: f64,
    pub net_calories: f64,
    pub water_ml: i64,
    pub food_entries: usize,
    pub activity_entries: usize,
    pub water_entries: usize,
}

impl DailySummary {
    pub fn of(log: &DailyLogWithEntries) -> Self {
        let e = &log.entries;
        let consumed: MacroTotals = e.foods.iter().map(|f| f.totals()).sum();
        let calories_burned: f64 = e.activities.iter().map(|a| a.calories_burned).sum();
        let water_ml = e.water.iter().map(|w| i64::from(w.amount_ml)).sum();
        Self {
            date: log.log.log_date,
            consumed,
            calories_burned,
            net_calories: consumed.calories - calories_burned,
            water_ml,
            food_entries: e.foods.len(),
            activity_entries: e.activities.len(),
            water_entries: e.water.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSummary {
    #[serde(serialize_with = "iso_date::serialize")]
    pub from: Date,
    #[serde(serialize_with = "iso_date::serialize")]
    pub to: Date,
    pub logged_days: usize,
    pub totals: MacroTotals,
    /// Averaged over days that have a log.
    pub daily_average: MacroTotals,
    pub calories_burned: f64,
    pub water_ml: i64,
    pub days: Vec<DailySummary>,
}

impl RangeSummary {
    pub fn new(from: Date, to: Date, days: Vec<DailySummary>) -> Self {
        let totals: MacroTotals = days.iter().map(|d| d.consumed).sum();
        Self {
            from,
            to,
            logged_days: days.len(),
            daily_average: totals.divided_by(days.len()),
            totals,
            calories_burned: days.iter().map(|d| d.calories_burned).sum(),
            water_ml: days.iter().map(|d| d.water_ml).sum(),
            days,
        }
    }
}
