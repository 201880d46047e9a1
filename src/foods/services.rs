use tracing::{error, info, warn};

use super::dto::CreateFoodForm;
use super::model::NutrientRecord;
use crate::decode::{normalize_name, nutrient_amount};
use crate::error::AppError;
use crate::images::services::{discard_images, store_food_images, UploadItem};
use crate::state::AppState;

/// Registers a custom food: images first, then the durable store, then the
/// live index. A failure at any step leaves no partial food behind.
pub async fn create_food(
    st: &AppState,
    form: CreateFoodForm,
    images: Vec<UploadItem>,
) -> Result<NutrientRecord, AppError> {
    let name = normalize_name(form.name.as_deref().unwrap_or_default());
    if name.is_empty() {
        warn!("custom food without a name");
        return Err(AppError::NameRequired);
    }

    let stored = store_food_images(st, images).await?;
    let record = NutrientRecord::custom(
        nutrient_amount(form.calories.as_deref()),
        nutrient_amount(form.protein.as_deref()),
        nutrient_amount(form.carbs.as_deref()),
        nutrient_amount(form.fats.as_deref()),
        stored.iter().map(|img| img.reference.clone()).collect(),
    );

    // publish under the document lock so the index and the store agree on
    // the last writer of a name
    if let Err(e) = st
        .custom_foods
        .update_then(
            |foods| foods.insert(&name, record.clone()),
            |_, _| st.foods.publish(&name, record.clone()),
        )
        .await
    {
        error!(food = %name, error = %format!("{e:#}"), "persisting custom food failed");
        discard_images(st, &stored).await;
        return Err(e.into());
    }

    info!(food = %name, images = stored.len(), indexed = st.foods.len(), "custom food created");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::dto::Resolution;
    use crate::foods::index::FoodTable;
    use crate::persistence::JsonDocument;
    use crate::storage::MemoryBlobStore;
    use bytes::Bytes;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn form(name: &str, calories: &str) -> CreateFoodForm {
        CreateFoodForm {
            name: Some(name.into()),
            calories: Some(calories.into()),
            ..CreateFoodForm::default()
        }
    }

    fn image(name: &str) -> UploadItem {
        UploadItem {
            filename: Some(name.into()),
            content_type: "image/png".into(),
            body: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn created_food_resolves_immediately() {
        let tmp = TempDir::new().expect("tmp");
        let state = AppState::fake(tmp.path(), Arc::new(MemoryBlobStore::default()));

        let food = create_food(&state, form("Test", "200"), vec![]).await.expect("create");
        assert_eq!(food.nutrients.calories, 200.0);
        assert_eq!(food.images, Some(vec![]));

        match state.foods.resolve("test", 100.0) {
            Resolution::Found(found) => assert_eq!(found.nutrients.calories, 200.0),
            other => panic!("expected exact hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lenient_numbers_and_zeroed_micros() {
        let tmp = TempDir::new().expect("tmp");
        let state = AppState::fake(tmp.path(), Arc::new(MemoryBlobStore::default()));

        let food = create_food(
            &state,
            CreateFoodForm {
                name: Some("shake".into()),
                calories: Some("abc".into()),
                protein: Some("25".into()),
                carbs: Some("".into()),
                fats: None,
            },
            vec![],
        )
        .await
        .expect("create");

        let n = food.nutrients;
        assert_eq!((n.calories, n.protein, n.carbohydrates, n.fats), (0.0, 25.0, 0.0, 0.0));
        assert_eq!((n.free_sugar, n.fibre, n.sodium, n.folate), (0.0, 0.0, 0.0, 0.0));
    }

    #[tokio::test]
    async fn blank_name_is_rejected_without_side_effects() {
        let tmp = TempDir::new().expect("tmp");
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::fake(tmp.path(), blobs.clone());

        let err = create_food(&state, form("   ", "10"), vec![image("a.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NameRequired));
        assert!(blobs.keys().is_empty());
        assert!(state.custom_foods.read().await.is_empty());
        assert!(state.foods.is_empty());
    }

    #[tokio::test]
    async fn images_are_capped_and_recorded() {
        let tmp = TempDir::new().expect("tmp");
        let state = AppState::fake(tmp.path(), Arc::new(MemoryBlobStore::default()));

        let images = ["a.png", "b.png", "c.png", "d.png", "e.png"].map(image).to_vec();
        let food = create_food(&state, form("granola", "450"), images).await.expect("create");
        let refs = food.images.expect("custom food has images");
        assert_eq!(refs.len(), 4);
        assert!(refs[0].starts_with("mem://custom_") && refs[0].ends_with("_a.png"));
        assert!(refs[3].ends_with("_d.png"));
    }

    #[tokio::test]
    async fn store_merges_by_name_and_survives_reload() {
        let tmp = TempDir::new().expect("tmp");
        let state = AppState::fake(tmp.path(), Arc::new(MemoryBlobStore::default()));

        create_food(&state, form("bar", "300"), vec![]).await.expect("create");
        create_food(&state, form("shake", "150"), vec![]).await.expect("create");
        create_food(&state, form("BAR", "320"), vec![]).await.expect("overwrite");

        let reloaded: FoodTable = JsonDocument::new(state.custom_foods.path())
            .read()
            .await;
        let names: Vec<_> = reloaded.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(names, vec!["bar", "shake"]);
        assert_eq!(reloaded.get("bar").map(|r| r.nutrients.calories), Some(320.0));
        assert_eq!(reloaded, state.custom_foods.read().await);
    }

    #[tokio::test]
    async fn unwritable_store_fails_and_cleans_up_images() {
        let tmp = TempDir::new().expect("tmp");
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::fake(tmp.path(), blobs.clone());

        // a directory where the document should be makes the write fail
        std::fs::create_dir_all(format!("{}.tmp", state.custom_foods.path().display()))
            .expect("block store");

        let err = create_food(&state, form("bar", "300"), vec![image("a.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(blobs.keys().is_empty());
        assert!(state.foods.is_empty());
    }

    #[tokio::test]
    async fn concurrent_creates_leave_index_and_store_in_step() {
        let tmp = TempDir::new().expect("tmp");
        let state = AppState::fake(tmp.path(), Arc::new(MemoryBlobStore::default()));

        let (a, b) = tokio::join!(
            create_food(&state, form("bar", "300"), vec![]),
            create_food(&state, form("bar", "320"), vec![]),
        );
        a.expect("first create");
        b.expect("second create");

        let stored = state.custom_foods.read().await;
        let stored_calories = stored.get("bar").map(|r| r.nutrients.calories);
        match state.foods.resolve("bar", 100.0) {
            Resolution::Found(found) => assert_eq!(Some(found.nutrients.calories), stored_calories),
            other => panic!("expected exact hit, got {other:?}"),
        }
    }
}
