use std::path::PathBuf;

use crate::decode::normalize_name;
use crate::persistence::JsonDocument;

/// Favorite food names, newest first, each name at most once.
#[derive(Debug)]
pub struct FavoritesStore {
    doc: JsonDocument<Vec<String>>,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }

    /// Adding a name that is already a favorite leaves the list unchanged.
    pub async fn add(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let name = normalize_name(name);
        let (favs, _) = self
            .doc
            .update(|favs| {
                if !favs.contains(&name) {
                    favs.insert(0, name.clone());
                }
            })
            .await?;
        Ok(favs)
    }

    /// Removing a name that is not a favorite is a successful no-op.
    pub async fn remove(&self, name: &str) -> anyhow::Result<Vec<String>> {
        let name = normalize_name(name);
        let (favs, _) = self.doc.update(|favs| favs.retain(|f| *f != name)).await?;
        Ok(favs)
    }

    pub async fn list(&self) -> Vec<String> {
        self.doc.read().await
    }
}
