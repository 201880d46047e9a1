use serde::Serialize;

use super::model::{NutrientRecord, Nutrients};

/// Raw query pairs; a repeated key keeps its first value.
fn first_value(params: &[(String, String)], key: &str) -> Option<String> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

/// Query string of `GET /lookup`. Values stay raw so bad numbers can fall
/// back to defaults instead of rejecting the request.
#[derive(Debug, Default)]
pub struct LookupQuery {
    pub name: String,
    pub qty_g: Option<String>,
}

impl LookupQuery {
    pub fn from_params(params: &[(String, String)]) -> Self {
        Self {
            name: first_value(params, "name").unwrap_or_default(),
            qty_g: first_value(params, "qty_g"),
        }
    }
}

#[derive(Debug, Default)]
pub struct AutocompleteQuery {
    pub query: String,
}

impl AutocompleteQuery {
    pub fn from_params(params: &[(String, String)]) -> Self {
        Self {
            query: first_value(params, "query").unwrap_or_default(),
        }
    }
}

/// Exact hit, scaled to the requested serving.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedNutrients {
    pub name: String,
    pub quantity_g: f64,
    #[serde(flatten)]
    pub nutrients: Nutrients,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotFound {
    pub matches: Vec<String>,
    pub error: &'static str,
}

impl NotFound {
    pub fn new(matches: Vec<String>) -> Self {
        Self {
            matches,
            error: "not_found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    Found(ResolvedNutrients),
    NotFound(NotFound),
}

/// Form fields of `POST /food/create`, kept as raw text.
#[derive(Debug, Default)]
pub struct CreateFoodForm {
    pub name: Option<String>,
    pub calories: Option<String>,
    pub protein: Option<String>,
    pub carbs: Option<String>,
    pub fats: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedFoodResponse {
    pub ok: bool,
    pub food: NutrientRecord,
}
