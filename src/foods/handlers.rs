use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{AutocompleteQuery, CreateFoodForm, CreatedFoodResponse, LookupQuery, Resolution};
use super::services;
use crate::{
    decode,
    error::AppError,
    images::{
        handlers::{read_upload, MAX_UPLOAD_BYTES},
        services::{UploadItem, MAX_FOOD_IMAGES},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/lookup", get(lookup))
        .route("/autocomplete", get(autocomplete))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/food/create", post(create_food))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// GET /lookup?name=..&qty_g=..
#[instrument(skip(state))]
pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Resolution> {
    let q = LookupQuery::from_params(&params);
    let quantity_g = decode::quantity_grams(q.qty_g.as_deref());
    Json(state.foods.resolve(&q.name, quantity_g))
}

/// GET /autocomplete?query=..
#[instrument(skip(state))]
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<String>> {
    let q = AutocompleteQuery::from_params(&params);
    Json(state.foods.autocomplete(&q.query))
}

/// POST /food/create (multipart)
/// Text fields name/calories/protein/carbs/fats, files under `images`.
#[instrument(skip(state, mp))]
pub async fn create_food(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<CreatedFoodResponse>, AppError> {
    // a body that is not multipart has no name field
    let Ok(mut mp) = mp else {
        warn!("food create without multipart body");
        return Err(AppError::NameRequired);
    };

    let mut form = CreateFoodForm::default();
    let mut images: Vec<UploadItem> = Vec::new();
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart form");
        AppError::BadRequest
    })? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let slot = match name.as_str() {
            "images" | "images[]" => {
                let item = read_upload(field).await.map_err(|_| AppError::BadRequest)?;
                // browsers send an empty part when no file was picked
                let empty = item.body.is_empty()
                    && item.filename.as_deref().map_or(true, str::is_empty);
                if !empty && images.len() < MAX_FOOD_IMAGES {
                    images.push(item);
                }
                continue;
            }
            "name" => &mut form.name,
            "calories" => &mut form.calories,
            "protein" => &mut form.protein,
            "carbs" => &mut form.carbs,
            "fats" => &mut form.fats,
            _ => continue,
        };
        let text = field.text().await.map_err(|_| AppError::BadRequest)?;
        slot.get_or_insert(text);
    }

    let food = services::create_food(&state, form, images).await?;
    Ok(Json(CreatedFoodResponse { ok: true, food }))
}
