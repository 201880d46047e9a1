use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::decode::{item_calories, round2, timestamp_secs};
use crate::ids::{now_secs, MillisIds};
use crate::meals::dto::note_text;
use crate::persistence::JsonDocument;

/// A recorded meal. Entries are never edited after creation.
///
/// Older ledgers may hold a `null` note, or a string or fractional
/// timestamp. Those decode the same way request input does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    pub items: Vec<Value>,
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_note")]
    pub note: String,
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(timestamp_secs(&Value::deserialize(d)?).unwrap_or(0))
}

fn lenient_note<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(note_text(Some(Value::deserialize(d)?)))
}

/// One element of the stored ledger. Elements that are not a readable meal
/// are carried through untouched so a rewrite never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerRow {
    Meal(MealEntry),
    Unreadable(Value),
}

impl LedgerRow {
    fn meal(&self) -> Option<&MealEntry> {
        match self {
            LedgerRow::Meal(m) => Some(m),
            LedgerRow::Unreadable(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewMeal {
    pub items: Vec<Value>,
    pub note: String,
    pub timestamp: Option<i64>,
}

/// Sum of the caller-computed calories on each line item.
pub fn total_calories(items: &[Value]) -> f64 {
    round2(items.iter().map(item_calories).sum())
}

/// Newest-first meal log stored as one JSON array.
#[derive(Debug)]
pub struct MealLedger {
    doc: JsonDocument<Vec<LedgerRow>>,
    ids: MillisIds,
}

impl MealLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
            ids: MillisIds::new(),
        }
    }

    pub async fn add(&self, meal: NewMeal) -> anyhow::Result<MealEntry> {
        let ids = &self.ids;
        let (_, entry) = self
            .doc
            .update(move |meals| {
                let head = meals
                    .iter()
                    .filter_map(LedgerRow::meal)
                    .map(|m| m.id)
                    .max()
                    .unwrap_or(i64::MIN);
                let entry = MealEntry {
                    id: ids.next_after(head),
                    total_calories: total_calories(&meal.items),
                    items: meal.items,
                    timestamp: meal.timestamp.unwrap_or_else(now_secs),
                    note: meal.note,
                };
                meals.insert(0, LedgerRow::Meal(entry.clone()));
                entry
            })
            .await?;
        Ok(entry)
    }

    pub async fn list(&self) -> Vec<MealEntry> {
        self.doc
            .read()
            .await
            .into_iter()
            .filter_map(|row| match row {
                LedgerRow::Meal(m) => Some(m),
                LedgerRow::Unreadable(raw) => {
                    warn!(row = %raw, "skipping unreadable meal entry");
                    None
                }
            })
            .collect()
    }
}
