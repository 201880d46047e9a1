use serde::{Deserialize, Serialize};

/// Body of `POST /fav/add` and `POST /fav/remove`.
#[derive(Debug, Default, Deserialize)]
pub struct FavoriteRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub ok: bool,
    pub favs: Vec<String>,
}
