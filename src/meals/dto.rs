use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::repo::MealEntry;

/// Body of `POST /meal/add`. `items` is required; everything else is lenient.
#[derive(Debug, Default, Deserialize)]
pub struct AddMealRequest {
    pub items: Option<Vec<Value>>,
    #[serde(default)]
    pub note: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AddedMealResponse {
    pub ok: bool,
    pub entry: MealEntry,
}

/// Free-text note of a meal; non-string JSON is kept as its JSON text.
pub fn note_text(note: Option<Value>) -> String {
    match note {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn note_text_variants() {
        assert_eq!(note_text(None), "");
        assert_eq!(note_text(Some(Value::Null)), "");
        assert_eq!(note_text(Some(json!("post-run"))), "post-run");
        assert_eq!(note_text(Some(json!(42))), "42");
    }

    #[test]
    fn items_field_is_optional_in_decoding() {
        let req: AddMealRequest = serde_json::from_value(json!({"note": "x"})).expect("decode");
        assert!(req.items.is_none());
    }
}
