use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use super::dto::{FavoriteRequest, FavoritesResponse};
use crate::{decode, error::AppError, state::AppState};

pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/fav/add", post(add_favorite))
        .route("/fav/remove", post(remove_favorite))
        .route("/fav/list", get(list_favorites))
}

fn requested_name(body: &[u8]) -> Result<String, AppError> {
    match decode::json_body::<FavoriteRequest>(body) {
        Some(FavoriteRequest { name: Some(name) }) => Ok(name),
        _ => {
            warn!("favorite payload missing name");
            Err(AppError::BadRequest)
        }
    }
}

#[instrument(skip(state, body))]
pub async fn add_favorite(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FavoritesResponse>, AppError> {
    let name = requested_name(&body)?;
    let favs = state.favorites.add(&name).await?;
    debug!(name = %name, count = favs.len(), "favorite added");
    Ok(Json(FavoritesResponse { ok: true, favs }))
}

#[instrument(skip(state, body))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FavoritesResponse>, AppError> {
    let name = requested_name(&body)?;
    let favs = state.favorites.remove(&name).await?;
    debug!(name = %name, count = favs.len(), "favorite removed");
    Ok(Json(FavoritesResponse { ok: true, favs }))
}

#[instrument(skip(state))]
pub async fn list_favorites(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.favorites.list().await)
}
