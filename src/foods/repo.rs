use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Food, FoodSearch, NewFood};

#[async_trait]
pub trait FoodStore: Send + Sync {
    /// Catalog items plus the viewer's own, ordered by name.
    async fn list_foods(&self, viewer: Uuid, search: &FoodSearch) -> anyhow::Result<Vec<Food>>;

    async fn get_food(&self, viewer: Uuid, food_id: Uuid) -> anyhow::Result<Option<Food>>;

    async fn create_food(
        &self,
        owner: Uuid,
        food: &NewFood,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Food>>;

    /// Replaces all fields of a food owned by `owner`.
    async fn update_food(
        &self,
        owner: Uuid,
        food_id: Uuid,
        food: &NewFood,
    ) -> anyhow::Result<Option<Food>>;

    async fn delete_food(&self, owner: Uuid, food_id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgFoodStore {
    db: PgPool,
}

impl PgFoodStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const FOOD_COLUMNS: &str = "id, owner_id, name, brand, serving_size_g, calories, \
     protein_g, carbs_g, fat_g, created_at";

/// `%text%` with LIKE metacharacters escaped.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl FoodStore for PgFoodStore {
    async fn list_foods(&self, viewer: Uuid, search: &FoodSearch) -> anyhow::Result<Vec<Food>> {
        let pattern = search.text.as_deref().map(like_pattern);
        let rows = sqlx::query_as::<_, Food>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods \
              WHERE (owner_id IS NULL OR owner_id = $1) \
                AND ($2::text IS NULL OR name ILIKE $2 OR brand ILIKE $2) \
              ORDER BY name ASC, id ASC \
              LIMIT $3 OFFSET $4"
        ))
        .bind(viewer)
        .bind(pattern)
        .bind(search.limit)
        .bind(search.offset)
        .fetch_all(&self.db)
        .await
        .context("list foods")?;
        Ok(rows)
    }

    async fn get_food(&self, viewer: Uuid, food_id: Uuid) -> anyhow::Result<Option<Food>> {
        let row = sqlx::query_as::<_, Food>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods \
              WHERE id = $1 AND (owner_id IS NULL OR owner_id = $2)"
        ))
        .bind(food_id)
        .bind(viewer)
        .fetch_optional(&self.db)
        .await
        .context("get food")?;
        Ok(row)
    }

    async fn create_food(
        &self,
        owner: Uuid,
        food: &NewFood,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Food>> {
        let row = sqlx::query_as::<_, Food>(&format!(
            "INSERT INTO foods \
               (id, owner_id, name, brand, serving_size_g, calories, protein_g, carbs_g, fat_g, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {FOOD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&food.name)
        .bind(food.brand.as_deref())
        .bind(food.serving_size_g)
        .bind(food.calories)
        .bind(food.protein_g)
        .bind(food.carbs_g)
        .bind(food.fat_g)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("insert food")?;
        Ok(row)
    }

    async fn update_food(
        &self,
        owner: Uuid,
        food_id: Uuid,
        food: &NewFood,
    ) -> anyhow::Result<Option<Food>> {
        let row = sqlx::query_as::<_, Food>(&format!(
            "UPDATE foods \
                SET name = $3, brand = $4, serving_size_g = $5, calories = $6, \
                    protein_g = $7, carbs_g = $8, fat_g = $9 \
              WHERE id = $1 AND owner_id = $2 \
             RETURNING {FOOD_COLUMNS}"
        ))
        .bind(food_id)
        .bind(owner)
        .bind(&food.name)
        .bind(food.brand.as_deref())
        .bind(food.serving_size_g)
        .bind(food.calories)
        .bind(food.protein_g)
        .bind(food.carbs_g)
        .bind(food.fat_g)
        .fetch_optional(&self.db)
        .await
        .context("update food")?;
        Ok(row)
    }

    async fn delete_food(&self, owner: Uuid, food_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM foods WHERE id = $1 AND owner_id = $2")
            .bind(food_id)
            .bind(owner)
            .execute(&self.db)
            .await
            .context("delete food")?;
        Ok(res.rows_affected() > 0)
    }
}
