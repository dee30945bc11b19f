use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::day::{iso_date, DayRange, DayWindow};
use super::dto::{
    ActivityRequest, FoodEntryRequest, LogWithSummary, RangeQuery, UpdateFoodEntryRequest,
    WaterRequest,
};
use super::repo::LogStore;
use super::repo_types::{
    ActivityEntry, DailyLog, DailyLogWithEntries, FoodEntry, FoodEntryChanges, NewActivityEntry,
    NewFoodEntry, NewWaterEntry, WaterEntry,
};
use super::summary::{DailySummary, RangeSummary};
use crate::{
    auth::services::require_identity, error::AppError, foods::repo::FoodStore,
    nutrition::calories_from_macros,
};

const MAX_WATER_ML: i32 = 10_000;
const DEFAULT_RANGE_DAYS: i64 = 7;

/// Find-or-create of the user's log for the day containing `now`.
async fn resolve_log(
    store: &dyn LogStore,
    user_id: Uuid,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<DailyLog, AppError> {
    let window = DayWindow::containing(now, offset)
        .ok_or_else(|| anyhow::anyhow!("no day window contains {now}"))?;
    if let Some(log) = store.find_log_in_window(user_id, &window).await? {
        return Ok(log);
    }
    let log = store
        .create_log(user_id, &window, now)
        .await?
        .ok_or(AppError::UpstreamCreateFailed("daily log"))?;
    info!(%user_id, log_id = %log.id, date = %log.log_date, "daily log created");
    Ok(log)
}

async fn resolve_for_append(
    store: &dyn LogStore,
    user_id: Uuid,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<DailyLog, AppError> {
    resolve_log(store, user_id, now, offset)
        .await
        .map_err(|e| match e {
            AppError::UpstreamCreateFailed(_) => {
                warn!(%user_id, "no daily log to append to");
                AppError::LogResolutionFailed
            }
            other => other,
        })
}

async fn with_entries(
    store: &dyn LogStore,
    log: DailyLog,
) -> Result<DailyLogWithEntries, AppError> {
    let mut entries = store.load_entries(&[log.id]).await?;
    let entries = entries.remove(&log.id).unwrap_or_default();
    Ok(DailyLogWithEntries { log, entries })
}

pub async fn get_or_create_log_at(
    store: &dyn LogStore,
    identity: Option<Uuid>,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<DailyLogWithEntries, AppError> {
    let user_id = require_identity(identity)?;
    let log = resolve_log(store, user_id, now, offset).await?;
    with_entries(store, log).await
}

pub async fn get_or_create_today_log(
    store: &dyn LogStore,
    identity: Option<Uuid>,
    offset: UtcOffset,
) -> Result<DailyLogWithEntries, AppError> {
    get_or_create_log_at(store, identity, OffsetDateTime::now_utc(), offset).await
}

pub async fn today_summary(
    store: &dyn LogStore,
    identity: Option<Uuid>,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<DailySummary, AppError> {
    let log = get_or_create_log_at(store, identity, now, offset).await?;
    Ok(DailySummary::of(&log))
}

// ---- appends ----

fn non_negative(value: Option<f64>, field: &str) -> Result<f64, AppError> {
    let v = value.unwrap_or(0.0);
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(AppError::validation(format!("{field} must be a non-negative number")))
    }
}

fn valid_servings(servings: f64) -> Result<f64, AppError> {
    if servings.is_finite() && servings > 0.0 {
        Ok(servings)
    } else {
        Err(AppError::validation("servings must be positive"))
    }
}

fn valid_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    Ok(name.to_string())
}

async fn build_food_entry(
    foods: &dyn FoodStore,
    user_id: Uuid,
    req: FoodEntryRequest,
) -> Result<NewFoodEntry, AppError> {
    let servings = valid_servings(req.servings.unwrap_or(1.0))?;

    if let Some(food_id) = req.food_id {
        let food = foods
            .get_food(user_id, food_id)
            .await?
            .ok_or(AppError::NotFound("food"))?;
        return Ok(NewFoodEntry {
            food_id: Some(food.id),
            name: food.name,
            servings,
            calories: food.calories,
            protein_g: food.protein_g,
            carbs_g: food.carbs_g,
            fat_g: food.fat_g,
        });
    }

    let name = valid_name(req.name.as_deref().unwrap_or_default())?;
    let protein_g = non_negative(req.protein_g, "protein_g")?;
    let carbs_g = non_negative(req.carbs_g, "carbs_g")?;
    let fat_g = non_negative(req.fat_g, "fat_g")?;
    let calories = match req.calories {
        Some(_) => non_negative(req.calories, "calories")?,
        None => calories_from_macros(protein_g, carbs_g, fat_g),
    };
    Ok(NewFoodEntry {
        food_id: None,
        name,
        servings,
        calories,
        protein_g,
        carbs_g,
        fat_g,
    })
}

pub async fn append_food_entry(
    logs: &dyn LogStore,
    foods: &dyn FoodStore,
    identity: Option<Uuid>,
    req: FoodEntryRequest,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<FoodEntry, AppError> {
    let user_id = require_identity(identity)?;
    let entry = build_food_entry(foods, user_id, req).await?;
    let log = resolve_for_append(logs, user_id, now, offset).await?;
    let row = logs
        .insert_food_entry(log.id, user_id, &entry, now)
        .await?
        .ok_or(AppError::UpstreamCreateFailed("food entry"))?;
    info!(%user_id, log_id = %log.id, entry_id = %row.id, "food entry appended");
    Ok(row)
}

pub async fn append_activity_entry(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    req: ActivityRequest,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<ActivityEntry, AppError> {
    let user_id = require_identity(identity)?;
    if req.duration_minutes < 0 {
        return Err(AppError::validation("duration_minutes must be non-negative"));
    }
    let entry = NewActivityEntry {
        name: valid_name(&req.name)?,
        duration_minutes: req.duration_minutes,
        calories_burned: non_negative(Some(req.calories_burned), "calories_burned")?,
    };
    let log = resolve_for_append(logs, user_id, now, offset).await?;
    let row = logs
        .insert_activity_entry(log.id, user_id, &entry, now)
        .await?
        .ok_or(AppError::UpstreamCreateFailed("activity entry"))?;
    info!(%user_id, log_id = %log.id, entry_id = %row.id, "activity entry appended");
    Ok(row)
}

pub async fn append_water_entry(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    req: WaterRequest,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<WaterEntry, AppError> {
    let user_id = require_identity(identity)?;
    if req.amount_ml <= 0 || req.amount_ml > MAX_WATER_ML {
        return Err(AppError::validation(format!(
            "amount_ml must be between 1 and {MAX_WATER_ML}"
        )));
    }
    let log = resolve_for_append(logs, user_id, now, offset).await?;
    let row = logs
        .insert_water_entry(log.id, user_id, NewWaterEntry { amount_ml: req.amount_ml }, now)
        .await?
        .ok_or(AppError::UpstreamCreateFailed("water entry"))?;
    info!(%user_id, log_id = %log.id, amount_ml = row.amount_ml, "water entry appended");
    Ok(row)
}

// ---- maintenance ----

pub async fn update_food_entry(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    entry_id: Uuid,
    req: UpdateFoodEntryRequest,
) -> Result<FoodEntry, AppError> {
    let user_id = require_identity(identity)?;
    if req.name.is_none() && req.servings.is_none() {
        return Err(AppError::validation("nothing to update"));
    }
    let changes = FoodEntryChanges {
        name: req.name.as_deref().map(valid_name).transpose()?,
        servings: req.servings.map(valid_servings).transpose()?,
    };
    logs.update_food_entry(user_id, entry_id, &changes)
        .await?
        .ok_or(AppError::NotFound("food entry"))
}

pub async fn delete_food_entry(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    entry_id: Uuid,
) -> Result<(), AppError> {
    let user_id = require_identity(identity)?;
    if !logs.delete_food_entry(user_id, entry_id).await? {
        return Err(AppError::NotFound("food entry"));
    }
    debug!(%user_id, %entry_id, "food entry deleted");
    Ok(())
}

pub async fn delete_activity_entry(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    entry_id: Uuid,
) -> Result<(), AppError> {
    let user_id = require_identity(identity)?;
    if !logs.delete_activity_entry(user_id, entry_id).await? {
        return Err(AppError::NotFound("activity entry"));
    }
    debug!(%user_id, %entry_id, "activity entry deleted");
    Ok(())
}

pub async fn delete_water_entry(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    entry_id: Uuid,
) -> Result<(), AppError> {
    let user_id = require_identity(identity)?;
    if !logs.delete_water_entry(user_id, entry_id).await? {
        return Err(AppError::NotFound("water entry"));
    }
    debug!(%user_id, %entry_id, "water entry deleted");
    Ok(())
}

// ---- queries ----

pub async fn get_log(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    log_id: Uuid,
) -> Result<DailyLogWithEntries, AppError> {
    let user_id = require_identity(identity)?;
    let log = logs
        .get_log(user_id, log_id)
        .await?
        .ok_or(AppError::NotFound("daily log"))?;
    with_entries(logs, log).await
}

/// Defaults to the last seven days ending today.
pub fn resolve_range(
    query: &RangeQuery,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<DayRange, AppError> {
    let parse = |raw: &str, field: &str| {
        iso_date::parse(raw)
            .map_err(|_| AppError::validation(format!("{field} must be a YYYY-MM-DD date")))
    };
    let to = match query.to.as_deref() {
        Some(raw) => parse(raw, "to")?,
        None => now.to_offset(offset).date(),
    };
    if to.next_day().is_none() {
        return Err(AppError::validation("to is out of range"));
    }
    let from = match query.from.as_deref() {
        Some(raw) => parse(raw, "from")?,
        None => to
            .checked_sub(Duration::days(DEFAULT_RANGE_DAYS - 1))
            .ok_or_else(|| AppError::validation("to is out of range"))?,
    };
    DayRange::new(from, to, offset).ok_or_else(|| {
        AppError::validation(format!(
            "from must not be after to, and the range may span at most {} days",
            DayRange::MAX_DAYS
        ))
    })
}

async fn logs_in_range(
    logs: &dyn LogStore,
    user_id: Uuid,
    range: &DayRange,
) -> Result<Vec<DailyLogWithEntries>, AppError> {
    let rows = logs.list_logs(user_id, range.start(), range.end()).await?;
    let ids: Vec<Uuid> = rows.iter().map(|l| l.id).collect();
    let mut entries = logs.load_entries(&ids).await?;
    Ok(rows
        .into_iter()
        .map(|log| {
            let e = entries.remove(&log.id).unwrap_or_default();
            DailyLogWithEntries { log, entries: e }
        })
        .collect())
}

pub async fn list_logs(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    query: RangeQuery,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<Vec<LogWithSummary>, AppError> {
    let user_id = require_identity(identity)?;
    let range = resolve_range(&query, now, offset)?;
    let rows = logs_in_range(logs, user_id, &range).await?;
    Ok(rows
        .into_iter()
        .map(|log| {
            let summary = DailySummary::of(&log);
            LogWithSummary { log, summary }
        })
        .collect())
}

pub async fn range_summary(
    logs: &dyn LogStore,
    identity: Option<Uuid>,
    query: RangeQuery,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Result<RangeSummary, AppError> {
    let user_id = require_identity(identity)?;
    let range = resolve_range(&query, now, offset)?;
    let days = logs_in_range(logs, user_id, &range)
        .await?
        .iter()
        .map(DailySummary::of)
        .collect();
    Ok(RangeSummary::new(range.from.date, range.to.date, days))
}
