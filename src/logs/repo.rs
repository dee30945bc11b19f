use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::day::DayWindow;
use super::repo_types::{
    ActivityEntry, DailyLog, FoodEntry, FoodEntryChanges, LogEntries, NewActivityEntry,
    NewFoodEntry, NewWaterEntry, WaterEntry,
};

/// Persistence for daily logs and their child entries.
///
/// Every lookup is scoped to the owning user. `create_log` must be an
/// insert-or-return-existing on `(user_id, day)`.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn find_log_in_window(
        &self,
        user_id: Uuid,
        window: &DayWindow,
    ) -> anyhow::Result<Option<DailyLog>>;

    async fn create_log(
        &self,
        user_id: Uuid,
        window: &DayWindow,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<DailyLog>>;

    async fn get_log(&self, user_id: Uuid, log_id: Uuid) -> anyhow::Result<Option<DailyLog>>;

    async fn list_logs(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<DailyLog>>;

    async fn load_entries(&self, log_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, LogEntries>>;

    async fn insert_food_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: &NewFoodEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<FoodEntry>>;

    async fn update_food_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: &FoodEntryChanges,
    ) -> anyhow::Result<Option<FoodEntry>>;

    async fn delete_food_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool>;

    async fn insert_activity_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: &NewActivityEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<ActivityEntry>>;

    async fn delete_activity_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool>;

    async fn insert_water_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: NewWaterEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<WaterEntry>>;

    async fn delete_water_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgLogStore {
    db: PgPool,
}

impl PgLogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const FOOD_ENTRY_COLUMNS: &str = "id, log_id, user_id, food_id, name, servings, calories, \
     protein_g, carbs_g, fat_g, created_at";

#[async_trait]
impl LogStore for PgLogStore {
    async fn find_log_in_window(
        &self,
        user_id: Uuid,
        window: &DayWindow,
    ) -> anyhow::Result<Option<DailyLog>> {
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT id, user_id, log_date, created_at
              FROM daily_logs
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
             ORDER BY created_at ASC
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_optional(&self.db)
        .await
        .context("find daily log in window")?;
        Ok(log)
    }

    async fn create_log(
        &self,
        user_id: Uuid,
        window: &DayWindow,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<DailyLog>> {
        // The no-op update makes RETURNING yield the row that won the race.
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            INSERT INTO daily_logs (id, user_id, log_date, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, log_date)
            DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, log_date, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(window.date)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("upsert daily log")?;
        Ok(log)
    }

    async fn get_log(&self, user_id: Uuid, log_id: Uuid) -> anyhow::Result<Option<DailyLog>> {
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT id, user_id, log_date, created_at
              FROM daily_logs
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(log_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("get daily log")?;
        Ok(log)
    }

    async fn list_logs(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<DailyLog>> {
        let rows = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT id, user_id, log_date, created_at
              FROM daily_logs
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
             ORDER BY log_date ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await
        .context("list daily logs")?;
        Ok(rows)
    }

    async fn load_entries(&self, log_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, LogEntries>> {
        let mut out: HashMap<Uuid, LogEntries> =
            log_ids.iter().map(|id| (*id, LogEntries::default())).collect();
        if log_ids.is_empty() {
            return Ok(out);
        }

        let foods = sqlx::query_as::<_, FoodEntry>(&format!(
            "SELECT {FOOD_ENTRY_COLUMNS} FROM food_entries \
             WHERE log_id = ANY($1) ORDER BY created_at ASC"
        ))
        .bind(log_ids)
        .fetch_all(&self.db)
        .await
        .context("load food entries")?;

        let activities = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, log_id, user_id, name, duration_minutes, calories_burned, created_at
              FROM activity_entries
             WHERE log_id = ANY($1)
             ORDER BY created_at ASC
            "#,
        )
        .bind(log_ids)
        .fetch_all(&self.db)
        .await
        .context("load activity entries")?;

        let water = sqlx::query_as::<_, WaterEntry>(
            r#"
            SELECT id, log_id, user_id, amount_ml, created_at
              FROM water_entries
             WHERE log_id = ANY($1)
             ORDER BY created_at ASC
            "#,
        )
        .bind(log_ids)
        .fetch_all(&self.db)
        .await
        .context("load water entries")?;

        for f in foods {
            out.entry(f.log_id).or_default().foods.push(f);
        }
        for a in activities {
            out.entry(a.log_id).or_default().activities.push(a);
        }
        for w in water {
            out.entry(w.log_id).or_default().water.push(w);
        }
        Ok(out)
    }

    async fn insert_food_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: &NewFoodEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<FoodEntry>> {
        let row = sqlx::query_as::<_, FoodEntry>(&format!(
            "INSERT INTO food_entries \
               (id, log_id, user_id, food_id, name, servings, calories, protein_g, carbs_g, fat_g, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {FOOD_ENTRY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(log_id)
        .bind(user_id)
        .bind(entry.food_id)
        .bind(&entry.name)
        .bind(entry.servings)
        .bind(entry.calories)
        .bind(entry.protein_g)
        .bind(entry.carbs_g)
        .bind(entry.fat_g)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("insert food entry")?;
        Ok(row)
    }

    async fn update_food_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: &FoodEntryChanges,
    ) -> anyhow::Result<Option<FoodEntry>> {
        let row = sqlx::query_as::<_, FoodEntry>(&format!(
            "UPDATE food_entries \
                SET name = COALESCE($3, name), servings = COALESCE($4, servings) \
              WHERE id = $1 AND user_id = $2 \
             RETURNING {FOOD_ENTRY_COLUMNS}"
        ))
        .bind(entry_id)
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.servings)
        .fetch_optional(&self.db)
        .await
        .context("update food entry")?;
        Ok(row)
    }

    async fn delete_food_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM food_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete food entry")?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_activity_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: &NewActivityEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<ActivityEntry>> {
        let row = sqlx::query_as::<_, ActivityEntry>(
            r#"
            INSERT INTO activity_entries
                (id, log_id, user_id, name, duration_minutes, calories_burned, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, log_id, user_id, name, duration_minutes, calories_burned, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(log_id)
        .bind(user_id)
        .bind(&entry.name)
        .bind(entry.duration_minutes)
        .bind(entry.calories_burned)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("insert activity entry")?;
        Ok(row)
    }

    async fn delete_activity_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM activity_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete activity entry")?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_water_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: NewWaterEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<WaterEntry>> {
        let row = sqlx::query_as::<_, WaterEntry>(
            r#"
            INSERT INTO water_entries (id, log_id, user_id, amount_ml, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, log_id, user_id, amount_ml, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(log_id)
        .bind(user_id)
        .bind(entry.amount_ml)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("insert water entry")?;
        Ok(row)
    }

    async fn delete_water_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM water_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete water entry")?;
        Ok(res.rows_affected() > 0)
    }
}
