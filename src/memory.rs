//! In-process store backing `AppState::fake()` and service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::foods::{
    repo::FoodStore,
    repo_types::{Food, FoodSearch, NewFood},
};
use crate::logs::{
    day::DayWindow,
    repo::LogStore,
    repo_types::{
        ActivityEntry, DailyLog, FoodEntry, FoodEntryChanges, LogEntries, NewActivityEntry,
        NewFoodEntry, NewWaterEntry, WaterEntry,
    },
};

#[derive(Default)]
struct Tables {
    logs: Vec<DailyLog>,
    food_entries: Vec<FoodEntry>,
    activities: Vec<ActivityEntry>,
    water: Vec<WaterEntry>,
    foods: Vec<Food>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_log_creates: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Make `create_log` return no row, as a misbehaving database would.
    pub fn fail_log_creates(&self) {
        self.fail_log_creates.store(true, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn logs_snapshot(&self) -> Vec<DailyLog> {
        self.tables.read().await.logs.clone()
    }

    pub async fn foods_snapshot(&self) -> Vec<Food> {
        self.tables.read().await.foods.clone()
    }

    pub async fn seed_catalog_food(&self, food: NewFood, now: OffsetDateTime) -> Food {
        let row = food_row(None, &food, now);
        self.tables.write().await.foods.push(row.clone());
        row
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn food_row(owner_id: Option<Uuid>, food: &NewFood, now: OffsetDateTime) -> Food {
    Food {
        id: Uuid::new_v4(),
        owner_id,
        name: food.name.clone(),
        brand: food.brand.clone(),
        serving_size_g: food.serving_size_g,
        calories: food.calories,
        protein_g: food.protein_g,
        carbs_g: food.carbs_g,
        fat_g: food.fat_g,
        created_at: now,
    }
}

/// Catalog items plus the viewer's own.
fn visible_to(food: &Food, viewer: Uuid) -> bool {
    food.owner_id.map_or(true, |owner| owner == viewer)
}

fn delete_where<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|r| !pred(r));
    rows.len() != before
}

impl MemoryStore {
    fn delete_counted<T>(&self, rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
        let removed = delete_where(rows, pred);
        if removed {
            self.wrote();
        }
        removed
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn find_log_in_window(
        &self,
        user_id: Uuid,
        window: &DayWindow,
    ) -> anyhow::Result<Option<DailyLog>> {
        let t = self.tables.read().await;
        Ok(t.logs
            .iter()
            .filter(|l| l.user_id == user_id && window.contains(l.created_at))
            .min_by_key(|l| l.created_at)
            .cloned())
    }

    async fn create_log(
        &self,
        user_id: Uuid,
        window: &DayWindow,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<DailyLog>> {
        if self.fail_log_creates.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut t = self.tables.write().await;
        if let Some(existing) = t
            .logs
            .iter()
            .find(|l| l.user_id == user_id && l.log_date == window.date)
        {
            return Ok(Some(existing.clone()));
        }
        let log = DailyLog {
            id: Uuid::new_v4(),
            user_id,
            log_date: window.date,
            created_at: now,
        };
        t.logs.push(log.clone());
        self.wrote();
        Ok(Some(log))
    }

    async fn get_log(&self, user_id: Uuid, log_id: Uuid) -> anyhow::Result<Option<DailyLog>> {
        let t = self.tables.read().await;
        Ok(t.logs
            .iter()
            .find(|l| l.id == log_id && l.user_id == user_id)
            .cloned())
    }

    async fn list_logs(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<DailyLog>> {
        let t = self.tables.read().await;
        let mut logs: Vec<DailyLog> = t
            .logs
            .iter()
            .filter(|l| l.user_id == user_id && start <= l.created_at && l.created_at < end)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.log_date);
        Ok(logs)
    }

    async fn load_entries(&self, log_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, LogEntries>> {
        let t = self.tables.read().await;
        let mut out = HashMap::new();
        for id in log_ids {
            out.insert(
                *id,
                LogEntries {
                    foods: t.food_entries.iter().filter(|e| e.log_id == *id).cloned().collect(),
                    activities: t.activities.iter().filter(|e| e.log_id == *id).cloned().collect(),
                    water: t.water.iter().filter(|e| e.log_id == *id).cloned().collect(),
                },
            );
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
        let row = FoodEntry {
            id: Uuid::new_v4(),
            log_id,
            user_id,
            food_id: entry.food_id,
            name: entry.name.clone(),
            servings: entry.servings,
            calories: entry.calories,
            protein_g: entry.protein_g,
            carbs_g: entry.carbs_g,
            fat_g: entry.fat_g,
            created_at: now,
        };
        self.tables.write().await.food_entries.push(row.clone());
        self.wrote();
        Ok(Some(row))
    }

    async fn update_food_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        changes: &FoodEntryChanges,
    ) -> anyhow::Result<Option<FoodEntry>> {
        let mut t = self.tables.write().await;
        let Some(row) = t
            .food_entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            row.name = name.clone();
        }
        if let Some(servings) = changes.servings {
            row.servings = servings;
        }
        let updated = row.clone();
        drop(t);
        self.wrote();
        Ok(Some(updated))
    }

    async fn delete_food_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        Ok(self.delete_counted(&mut t.food_entries, |e| {
            e.id == entry_id && e.user_id == user_id
        }))
    }

    async fn insert_activity_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: &NewActivityEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<ActivityEntry>> {
        let row = ActivityEntry {
            id: Uuid::new_v4(),
            log_id,
            user_id,
            name: entry.name.clone(),
            duration_minutes: entry.duration_minutes,
            calories_burned: entry.calories_burned,
            created_at: now,
        };
        self.tables.write().await.activities.push(row.clone());
        self.wrote();
        Ok(Some(row))
    }

    async fn delete_activity_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        Ok(self.delete_counted(&mut t.activities, |e| {
            e.id == entry_id && e.user_id == user_id
        }))
    }

    async fn insert_water_entry(
        &self,
        log_id: Uuid,
        user_id: Uuid,
        entry: NewWaterEntry,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<WaterEntry>> {
        let row = WaterEntry {
            id: Uuid::new_v4(),
            log_id,
            user_id,
            amount_ml: entry.amount_ml,
            created_at: now,
        };
        self.tables.write().await.water.push(row.clone());
        self.wrote();
        Ok(Some(row))
    }

    async fn delete_water_entry(&self, user_id: Uuid, entry_id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        Ok(self.delete_counted(&mut t.water, |e| {
            e.id == entry_id && e.user_id == user_id
        }))
    }
}

#[async_trait]
impl FoodStore for MemoryStore {
    async fn list_foods(&self, viewer: Uuid, search: &FoodSearch) -> anyhow::Result<Vec<Food>> {
        let t = self.tables.read().await;
        let needle = search.text.as_deref().map(str::to_lowercase);
        let mut rows: Vec<Food> = t
            .foods
            .iter()
            .filter(|f| visible_to(f, viewer))
            .filter(|f| match &needle {
                None => true,
                Some(n) => {
                    f.name.to_lowercase().contains(n)
                        || f.brand.as_deref().is_some_and(|b| b.to_lowercase().contains(n))
                }
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows
            .into_iter()
            .skip(search.offset.max(0) as usize)
            .take(search.limit.max(0) as usize)
            .collect())
    }

    async fn get_food(&self, viewer: Uuid, food_id: Uuid) -> anyhow::Result<Option<Food>> {
        let t = self.tables.read().await;
        Ok(t.foods
            .iter()
            .find(|f| f.id == food_id && visible_to(f, viewer))
            .cloned())
    }

    async fn create_food(
        &self,
        owner: Uuid,
        food: &NewFood,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Food>> {
        let row = food_row(Some(owner), food, now);
        self.tables.write().await.foods.push(row.clone());
        self.wrote();
        Ok(Some(row))
    }

    async fn update_food(
        &self,
        owner: Uuid,
        food_id: Uuid,
        food: &NewFood,
    ) -> anyhow::Result<Option<Food>> {
        let mut t = self.tables.write().await;
        let Some(row) = t
            .foods
            .iter_mut()
            .find(|f| f.id == food_id && f.owner_id == Some(owner))
        else {
            return Ok(None);
        };
        row.name = food.name.clone();
        row.brand = food.brand.clone();
        row.serving_size_g = food.serving_size_g;
        row.calories = food.calories;
        row.protein_g = food.protein_g;
        row.carbs_g = food.carbs_g;
        row.fat_g = food.fat_g;
        let updated = row.clone();
        drop(t);
        self.wrote();
        Ok(Some(updated))
    }

    async fn delete_food(&self, owner: Uuid, food_id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        Ok(self.delete_counted(&mut t.foods, |f| {
            f.id == food_id && f.owner_id == Some(owner)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

    fn oats() -> NewFood {
        NewFood {
            name: "Oats".into(),
            brand: None,
            serving_size_g: 40.0,
            calories: 150.0,
            protein_g: 5.0,
            carbs_g: 27.0,
            fat_g: 3.0,
        }
    }

    #[tokio::test]
    async fn every_mutation_counts_as_a_write() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();

        let food = store.create_food(user, &oats(), NOW).await.unwrap().unwrap();
        assert_eq!(store.write_count(), 1);
        store.update_food(user, food.id, &oats()).await.unwrap().unwrap();
        assert_eq!(store.write_count(), 2);
        assert!(store.delete_food(user, food.id).await.unwrap());
        assert_eq!(store.write_count(), 3);

        let window = DayWindow::containing(NOW, time::UtcOffset::UTC).unwrap();
        let log = store.create_log(user, &window, NOW).await.unwrap().unwrap();
        let water = store
            .insert_water_entry(log.id, user, NewWaterEntry { amount_ml: 250 }, NOW)
            .await
            .unwrap()
            .unwrap();
        let before = store.write_count();
        assert!(store.delete_water_entry(user, water.id).await.unwrap());
        assert_eq!(store.write_count(), before + 1);
    }

    #[tokio::test]
    async fn misses_do_not_count() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        assert!(!store.delete_food(user, Uuid::new_v4()).await.unwrap());
        assert!(!store.delete_activity_entry(user, Uuid::new_v4()).await.unwrap());
        assert!(store.update_food(user, Uuid::new_v4(), &oats()).await.unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }
}
