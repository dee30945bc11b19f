use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{FoodListQuery, FoodRequest};
use super::repo::FoodStore;
use super::repo_types::{Food, FoodSearch, NewFood};
use crate::{auth::services::require_identity, error::AppError, nutrition::calories_from_macros};

const MAX_PAGE: i64 = 100;

fn non_negative(value: f64, field: &str) -> Result<f64, AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AppError::validation(format!("{field} must be a non-negative number")))
    }
}

pub(crate) fn validate_food(req: FoodRequest) -> Result<NewFood, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if !(req.serving_size_g.is_finite() && req.serving_size_g > 0.0) {
        return Err(AppError::validation("serving_size_g must be positive"));
    }
    let protein_g = non_negative(req.protein_g, "protein_g")?;
    let carbs_g = non_negative(req.carbs_g, "carbs_g")?;
    let fat_g = non_negative(req.fat_g, "fat_g")?;
    let calories = match req.calories {
        Some(c) => non_negative(c, "calories")?,
        None => calories_from_macros(protein_g, carbs_g, fat_g),
    };
    let brand = req
        .brand
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    Ok(NewFood {
        name,
        brand,
        serving_size_g: req.serving_size_g,
        calories,
        protein_g,
        carbs_g,
        fat_g,
    })
}

pub async fn list_foods(
    store: &dyn FoodStore,
    identity: Option<Uuid>,
    query: FoodListQuery,
) -> Result<Vec<Food>, AppError> {
    let user_id = require_identity(identity)?;
    let search = FoodSearch {
        text: query
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
        limit: query.limit.clamp(1, MAX_PAGE),
        offset: query.offset.max(0),
    };
    let foods = store.list_foods(user_id, &search).await?;
    debug!(%user_id, count = foods.len(), "foods listed");
    Ok(foods)
}

pub async fn get_food(
    store: &dyn FoodStore,
    identity: Option<Uuid>,
    food_id: Uuid,
) -> Result<Food, AppError> {
    let user_id = require_identity(identity)?;
    store
        .get_food(user_id, food_id)
        .await?
        .ok_or(AppError::NotFound("food"))
}

pub async fn create_food(
    store: &dyn FoodStore,
    identity: Option<Uuid>,
    req: FoodRequest,
    now: OffsetDateTime,
) -> Result<Food, AppError> {
    let user_id = require_identity(identity)?;
    let new_food = validate_food(req)?;
    let food = store
        .create_food(user_id, &new_food, now)
        .await?
        .ok_or(AppError::UpstreamCreateFailed("food"))?;
    info!(%user_id, food_id = %food.id, name = %food.name, "food created");
    Ok(food)
}

/// Only the owner may change a food; catalog items are read-only.
async fn ensure_owned(store: &dyn FoodStore, user_id: Uuid, food_id: Uuid) -> Result<(), AppError> {
    let food = store
        .get_food(user_id, food_id)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    if food.owner_id != Some(user_id) {
        return Err(AppError::Forbidden("catalog foods are read-only"));
    }
    Ok(())
}

pub async fn update_food(
    store: &dyn FoodStore,
    identity: Option<Uuid>,
    food_id: Uuid,
    req: FoodRequest,
) -> Result<Food, AppError> {
    let user_id = require_identity(identity)?;
    let new_food = validate_food(req)?;
    ensure_owned(store, user_id, food_id).await?;
    let food = store
        .update_food(user_id, food_id, &new_food)
        .await?
        .ok_or(AppError::NotFound("food"))?;
    info!(%user_id, %food_id, "food updated");
    Ok(food)
}

pub async fn delete_food(
    store: &dyn FoodStore,
    identity: Option<Uuid>,
    food_id: Uuid,
) -> Result<(), AppError> {
    let user_id = require_identity(identity)?;
    ensure_owned(store, user_id, food_id).await?;
    if !store.delete_food(user_id, food_id).await? {
        return Err(AppError::NotFound("food"));
    }
    info!(%user_id, %food_id, "food deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use time::macros::datetime;

    fn request(name: &str) -> FoodRequest {
        FoodRequest {
            name: name.into(),
            brand: None,
            serving_size_g: 100.0,
            calories: None,
            protein_g: 10.0,
            carbs_g: 20.0,
            fat_g: 5.0,
        }
    }

    fn query(q: Option<&str>) -> FoodListQuery {
        FoodListQuery {
            q: q.map(Into::into),
            limit: 20,
            offset: 0,
        }
    }

    const NOW: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

    #[test]
    fn calories_default_to_macro_energy() {
        let food = validate_food(request("Oats")).unwrap();
        assert_eq!(food.calories, 40.0 + 80.0 + 45.0);

        let mut explicit = request("Oats");
        explicit.calories = Some(150.0);
        assert_eq!(validate_food(explicit).unwrap().calories, 150.0);
    }

    #[test]
    fn rejects_bad_fields() {
        assert!(validate_food(request("   ")).is_err());
        let mut r = request("Oats");
        r.fat_g = -1.0;
        assert!(validate_food(r).is_err());
        let mut r = request("Oats");
        r.serving_size_g = 0.0;
        assert!(validate_food(r).is_err());
    }

    #[tokio::test]
    async fn requires_identity() {
        let store = MemoryStore::default();
        let err = create_food(&store, None, request("Oats"), NOW).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        assert!(store.foods_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn search_sees_catalog_and_own_items_only() {
        let store = MemoryStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.seed_catalog_food(validate_food(request("Banana")).unwrap(), NOW).await;
        create_food(&store, Some(alice), request("Banana bread"), NOW).await.unwrap();
        create_food(&store, Some(bob), request("Banana split"), NOW).await.unwrap();

        let names: Vec<String> = list_foods(&store, Some(alice), query(Some("banana")))
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Banana".to_string(), "Banana bread".to_string()]);
    }

    #[tokio::test]
    async fn catalog_items_are_read_only() {
        let store = MemoryStore::default();
        let alice = Uuid::new_v4();
        let catalog = store.seed_catalog_food(validate_food(request("Rice")).unwrap(), NOW).await;

        let err = delete_food(&store, Some(alice), catalog.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = update_food(&store, Some(alice), catalog.id, request("Brown rice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn owner_can_update_and_delete() {
        let store = MemoryStore::default();
        let alice = Uuid::new_v4();
        let food = create_food(&store, Some(alice), request("Shake"), NOW).await.unwrap();

        let mut changed = request("Protein shake");
        changed.calories = Some(200.0);
        let updated = update_food(&store, Some(alice), food.id, changed).await.unwrap();
        assert_eq!(updated.name, "Protein shake");
        assert_eq!(updated.calories, 200.0);

        delete_food(&store, Some(alice), food.id).await.unwrap();
        let err = get_food(&store, Some(alice), food.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("food")));
    }

    #[tokio::test]
    async fn other_users_items_are_invisible() {
        let store = MemoryStore::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let food = create_food(&store, Some(alice), request("Secret stew"), NOW).await.unwrap();
        let err = get_food(&store, Some(bob), food.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
