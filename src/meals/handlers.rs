use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use super::dto::{note_text, AddMealRequest, AddedMealResponse};
use super::repo::{MealEntry, NewMeal};
use crate::{decode, error::AppError, state::AppState};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meal/add", post(add_meal))
        .route("/meal/list", get(list_meals))
}

/// POST /meal/add { items: [...], note?, timestamp? }
#[instrument(skip(state, body))]
pub async fn add_meal(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AddedMealResponse>, AppError> {
    let Some(AddMealRequest {
        items: Some(items),
        note,
        timestamp,
    }) = decode::json_body::<AddMealRequest>(&body)
    else {
        warn!("meal payload missing items");
        return Err(AppError::BadRequest);
    };

    let entry = state
        .meals
        .add(NewMeal {
            items,
            note: note_text(note),
            timestamp: timestamp.as_ref().and_then(decode::timestamp_secs),
        })
        .await?;

    info!(meal_id = entry.id, items = entry.items.len(), total_calories = entry.total_calories, "meal added");
    Ok(Json(AddedMealResponse { ok: true, entry }))
}

#[instrument(skip(state))]
pub async fn list_meals(State(state): State<AppState>) -> Json<Vec<MealEntry>> {
    Json(state.meals.list().await)
}
