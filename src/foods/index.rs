use std::{collections::HashMap, path::Path, sync::Arc};

use parking_lot::RwLock;
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::{info, warn};

use super::dto::{NotFound, Resolution, ResolvedNutrients};
use super::model::NutrientRecord;
use crate::decode::normalize_name;
use crate::persistence;

/// Maximum number of names a fuzzy scan returns.
pub const MAX_MATCHES: usize = 10;

/// Insertion-ordered map of normalized food name to record.
///
/// Overwriting a name keeps its original position, so iteration order is the
/// order names were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodTable {
    entries: Vec<(String, NutrientRecord)>,
    positions: HashMap<String, usize>,
}

impl FoodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, record: NutrientRecord) {
        let key = normalize_name(name);
        match self.positions.get(&key) {
            Some(&i) => self.entries[i].1 = record,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, record));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&NutrientRecord> {
        self.positions.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NutrientRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies every entry of `other` over this table.
    pub fn merge(&mut self, other: FoodTable) {
        for (name, record) in other.entries {
            self.insert(&name, record);
        }
    }

    /// Names containing `needle` (already normalized), in table order.
    pub fn names_containing(&self, needle: &str, limit: usize) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, _)| k)
            .filter(|k| k.to_lowercase().contains(needle))
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Serialize for FoodTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, record) in &self.entries {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FoodTable {
    /// Malformed entries are skipped so one bad row does not drop the table.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        let mut table = FoodTable::new();
        for (name, value) in raw {
            match serde_json::from_value::<NutrientRecord>(value) {
                Ok(record) => table.insert(&name, record),
                Err(e) => warn!(food = %name, error = %e, "skipping malformed food entry"),
            }
        }
        Ok(table)
    }
}

/// The live nutrient index shared by every request.
///
/// Readers take the read lock for the duration of one lookup; the custom-food
/// registry is the only writer.
#[derive(Debug, Clone, Default)]
pub struct FoodIndex {
    table: Arc<RwLock<FoodTable>>,
}

impl FoodIndex {
    pub fn new(table: FoodTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Seed table first, custom foods on top. Either file may be missing or
    /// corrupt; the index then just holds less.
    pub async fn load(seed_path: &Path, custom: FoodTable) -> Self {
        let mut table: FoodTable = persistence::read_or_default(seed_path).await;
        info!(path = %seed_path.display(), foods = table.len(), "seed foods loaded");

        if !custom.is_empty() {
            info!(foods = custom.len(), "custom foods loaded");
        }
        table.merge(custom);
        Self::new(table)
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    pub fn publish(&self, name: &str, record: NutrientRecord) {
        self.table.write().insert(name, record);
    }

    pub fn resolve(&self, name: &str, quantity_g: f64) -> Resolution {
        let name = normalize_name(name);
        let table = self.table.read();

        match table.get(&name) {
            Some(record) => Resolution::Found(ResolvedNutrients {
                name,
                quantity_g,
                nutrients: record.nutrients.scaled_to(quantity_g),
            }),
            None => Resolution::NotFound(NotFound::new(
                table.names_containing(&name, MAX_MATCHES),
            )),
        }
    }

    pub fn autocomplete(&self, query: &str) -> Vec<String> {
        let query = normalize_name(query);
        if query.is_empty() {
            return Vec::new();
        }
        self.table.read().names_containing(&query, MAX_MATCHES)
    }
}
