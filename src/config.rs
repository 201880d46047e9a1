use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding meals.json, favs.json and custom_foods.json.
    pub data_dir: PathBuf,
    /// Seed nutrient index produced by the CSV import.
    pub seed_path: PathBuf,
    pub upload_dir: PathBuf,
    /// When set, images go to S3/MinIO instead of `upload_dir`.
    pub s3: Option<S3Config>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().with_context(|| format!("invalid APP_PORT {v}"))?,
            Err(_) => 5000,
        };

        let s3 = match std::env::var("S3_ENDPOINT") {
            Ok(endpoint) => Some(S3Config {
                endpoint,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY")?,
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            }),
            Err(_) => None,
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            data_dir: env_path("DATA_DIR", "data"),
            seed_path: env_path("SEED_PATH", "db/food_data.json"),
            upload_dir: env_path("UPLOAD_DIR", "uploads"),
            s3,
        })
    }

    pub fn meals_path(&self) -> PathBuf {
        self.data_dir.join("meals.json")
    }

    pub fn favorites_path(&self) -> PathBuf {
        self.data_dir.join("favs.json")
    }

    pub fn custom_foods_path(&self) -> PathBuf {
        self.data_dir.join("custom_foods.json")
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_paths_live_under_data_dir() {
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 5000,
            data_dir: PathBuf::from("/var/lib/nutri"),
            seed_path: PathBuf::from("db/food_data.json"),
            upload_dir: PathBuf::from("uploads"),
            s3: None,
        };
        assert_eq!(config.meals_path(), PathBuf::from("/var/lib/nutri/meals.json"));
        assert_eq!(config.favorites_path(), PathBuf::from("/var/lib/nutri/favs.json"));
        assert_eq!(
            config.custom_foods_path(),
            PathBuf::from("/var/lib/nutri/custom_foods.json")
        );
    }
}
