//! Static meal plans keyed by a goal label.

use axum::{routing::post, Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{decode, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SuggestRequest {
    pub goal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedMeal {
    pub meal: &'static str,
    pub items: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<PlannedMeal>,
}

const fn planned(meal: &'static str, items: &'static [&'static str]) -> PlannedMeal {
    PlannedMeal { meal, items }
}

const LOSE_WEIGHT: [PlannedMeal; 3] = [
    planned("Breakfast", &["oats", "banana"]),
    planned("Lunch", &["brown rice", "grilled chicken"]),
    planned("Dinner", &["roti", "dal"]),
];

const GAIN_MUSCLE: [PlannedMeal; 3] = [
    planned("Breakfast", &["eggs", "milk"]),
    planned("Lunch", &["rice", "paneer"]),
    planned("Dinner", &["roti", "lentils"]),
];

const MAINTAIN: [PlannedMeal; 3] = [
    planned("Breakfast", &["poha"]),
    planned("Lunch", &["rice", "dal"]),
    planned("Dinner", &["roti", "sabzi"]),
];

/// Unknown goals get the maintenance plan.
pub fn plan_for(goal: &str) -> Vec<PlannedMeal> {
    match goal {
        "lose_weight" => LOSE_WEIGHT.to_vec(),
        "gain_muscle" => GAIN_MUSCLE.to_vec(),
        _ => MAINTAIN.to_vec(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ai/suggest", post(suggest))
}

/// POST /ai/suggest { goal? }
#[instrument(skip(body))]
pub async fn suggest(body: Bytes) -> Json<SuggestResponse> {
    let req: SuggestRequest = decode::json_body(&body).unwrap_or_default();
    let goal = req.goal.as_deref().unwrap_or("maintain");
    Json(SuggestResponse {
        suggestions: plan_for(goal),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plans_by_goal() {
        assert_eq!(plan_for("lose_weight")[1].items, ["brown rice", "grilled chicken"]);
        assert_eq!(plan_for("gain_muscle")[0].items, ["eggs", "milk"]);
        assert_eq!(plan_for("maintain"), plan_for("something else"));
    }

    #[tokio::test]
    async fn malformed_body_falls_back_to_maintain() {
        let Json(resp) = suggest(Bytes::from_static(b"nope")).await;
        assert_eq!(
            serde_json::to_value(&resp).expect("encode"),
            json!({"suggestions": [
                {"meal": "Breakfast", "items": ["poha"]},
                {"meal": "Lunch", "items": ["rice", "dal"]},
                {"meal": "Dinner", "items": ["roti", "sabzi"]}
            ]})
        );
    }
}
