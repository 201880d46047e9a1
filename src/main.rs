mod app;
mod config;
mod decode;
mod error;
mod favorites;
mod foods;
mod ids;
mod images;
mod meals;
mod persistence;
mod state;
mod storage;
mod suggest;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutriledger=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config.clone()).await?;
    if app_state.foods.is_empty() {
        tracing::warn!(seed = %config.seed_path.display(), "nutrient index is empty, every lookup will miss");
    } else {
        tracing::info!(foods = app_state.foods.len(), "nutrient index ready");
    }

    app::serve(app::build_app(app_state), &config).await
}
