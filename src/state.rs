use std::sync::Arc;

use crate::config::AppConfig;
use crate::favorites::repo::FavoritesStore;
use crate::foods::index::{FoodIndex, FoodTable};
use crate::ids::MillisIds;
use crate::meals::repo::MealLedger;
use crate::persistence::JsonDocument;
use crate::storage::{BlobStore, LocalBlobStore, S3BlobStore};

#[derive(Clone)]
pub struct AppState {
    pub foods: FoodIndex,
    pub custom_foods: Arc<JsonDocument<FoodTable>>,
    pub meals: Arc<MealLedger>,
    pub favorites: Arc<FavoritesStore>,
    pub storage: Arc<dyn BlobStore>,
    pub blob_ids: Arc<MillisIds>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let storage = match &config.s3 {
            Some(s3) => {
                tracing::info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "using s3 blob store");
                Arc::new(S3BlobStore::new(s3).await?) as Arc<dyn BlobStore>
            }
            None => Arc::new(LocalBlobStore::new(&config.upload_dir)) as Arc<dyn BlobStore>,
        };

        let custom_foods = JsonDocument::<FoodTable>::new(config.custom_foods_path());
        let foods = FoodIndex::load(&config.seed_path, custom_foods.read().await).await;

        Ok(Self::from_parts(&config, foods, custom_foods, storage))
    }

    pub fn from_parts(
        config: &AppConfig,
        foods: FoodIndex,
        custom_foods: JsonDocument<FoodTable>,
        storage: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            meals: Arc::new(MealLedger::new(config.meals_path())),
            favorites: Arc::new(FavoritesStore::new(config.favorites_path())),
            custom_foods: Arc::new(custom_foods),
            foods,
            storage,
            blob_ids: Arc::new(MillisIds::new()),
        }
    }

    /// State over a scratch directory with an empty index.
    #[cfg(test)]
    pub fn fake(dir: &std::path::Path, storage: Arc<dyn BlobStore>) -> Self {
        let config = fake_config(dir);
        let custom_foods = JsonDocument::new(config.custom_foods_path());
        Self::from_parts(&config, FoodIndex::default(), custom_foods, storage)
    }
}

#[cfg(test)]
fn fake_config(dir: &std::path::Path) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        data_dir: dir.join("data"),
        seed_path: dir.join("db").join("food_data.json"),
        upload_dir: dir.join("uploads"),
        s3: None,
    }
}
