use anyhow::Context;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Images accepted per custom food; extras are dropped.
pub const MAX_FOOD_IMAGES: usize = 4;

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub filename: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

/// A blob written to the store: `key` addresses it there, `reference` is what
/// clients see.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub key: String,
    pub reference: String,
}

/// Reduces a client filename to `[A-Za-z0-9_.-]`, whitespace becoming `_`.
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    lazy_static! {
        static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
        static ref UNSAFE: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
    }
    // drop any directory part a browser may send
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let joined = WHITESPACE.replace_all(base.trim(), "_");
    let cleaned = UNSAFE.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(['.', '_']);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Filename part of a blob key, with a generated one when the client's is unusable.
fn safe_name(item: &UploadItem) -> String {
    item.filename
        .as_deref()
        .and_then(sanitize_filename)
        .unwrap_or_else(|| {
            let ext = ext_from_mime(&item.content_type).unwrap_or("bin");
            format!("{}.{}", Uuid::new_v4().simple(), ext)
        })
}

/// Stores up to [`MAX_FOOD_IMAGES`] images as `custom_{millis}_{filename}`.
/// On failure every blob already written is removed again.
pub async fn store_food_images(
    st: &AppState,
    images: Vec<UploadItem>,
) -> anyhow::Result<Vec<StoredImage>> {
    let mut stored = Vec::with_capacity(images.len().min(MAX_FOOD_IMAGES));
    for img in images.into_iter().take(MAX_FOOD_IMAGES) {
        let key = format!("custom_{}_{}", st.blob_ids.next(), safe_name(&img));
        match st
            .storage
            .put_object(&key, img.body, &img.content_type)
            .await
            .with_context(|| format!("put_object {key}"))
        {
            Ok(reference) => {
                debug!(%key, %reference, "food image stored");
                stored.push(StoredImage { key, reference });
            }
            Err(e) => {
                discard_images(st, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

/// Best-effort removal; failures are logged, not returned.
pub async fn discard_images(st: &AppState, images: &[StoredImage]) {
    for img in images {
        if let Err(e) = st.storage.delete_object(&img.key).await {
            warn!(key = %img.key, error = %format!("{e:#}"), "failed to discard image");
        }
    }
}

/// Raw upload kept under its sanitized client filename.
pub async fn store_upload(st: &AppState, item: UploadItem) -> anyhow::Result<String> {
    let key = safe_name(&item);
    st.storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {key}"))
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::state::AppState;
    use crate::storage::MemoryBlobStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn item(name: &str) -> UploadItem {
        UploadItem {
            filename: Some(name.to_string()),
            content_type: "image/jpeg".into(),
            body: Bytes::from_static(b"jpeg"),
        }
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("lunch.jpg").as_deref(), Some("lunch.jpg"));
        assert_eq!(sanitize_filename("my lunch  pic.png").as_deref(), Some("my_lunch_pic.png"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename(r"C:\photos\dal.jpg").as_deref(), Some("dal.jpg"));
        assert_eq!(sanitize_filename("ñandú.jpg").as_deref(), Some("and.jpg"));
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn unusable_filename_gets_generated_name() {
        let mut img = item("???");
        img.content_type = "image/png".into();
        let name = safe_name(&img);
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 32 + 4);
    }

    #[tokio::test]
    async fn keeps_at_most_four_images_with_distinct_keys() {
        let tmp = TempDir::new().expect("tmp");
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::fake(tmp.path(), blobs.clone());

        let images = (0..6).map(|_| item("same.jpg")).collect();
        let stored = store_food_images(&state, images).await.expect("store");

        assert_eq!(stored.len(), MAX_FOOD_IMAGES);
        let keys = blobs.keys();
        assert!(keys.iter().all(|k| k.starts_with("custom_") && k.ends_with("_same.jpg")));
        let distinct: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(distinct.len(), MAX_FOOD_IMAGES);
        assert_eq!(stored[0].reference, format!("mem://{}", stored[0].key));
    }

    #[tokio::test]
    async fn failed_store_reports_error() {
        let tmp = TempDir::new().expect("tmp");
        let blobs = Arc::new(MemoryBlobStore {
            fail_puts: true,
            ..MemoryBlobStore::default()
        });
        let state = AppState::fake(tmp.path(), blobs.clone());

        let err = store_food_images(&state, vec![item("a.jpg")]).await.unwrap_err();
        assert!(format!("{err:#}").contains("blob store unavailable"));
        assert!(blobs.keys().is_empty());
    }

    #[tokio::test]
    async fn discard_removes_stored_blobs() {
        let tmp = TempDir::new().expect("tmp");
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::fake(tmp.path(), blobs.clone());

        let stored = store_food_images(&state, vec![item("a.jpg"), item("b.jpg")])
            .await
            .expect("store");
        discard_images(&state, &stored).await;
        assert!(blobs.keys().is_empty());
    }

    #[tokio::test]
    async fn upload_uses_sanitized_name() {
        let tmp = TempDir::new().expect("tmp");
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::fake(tmp.path(), blobs.clone());

        let reference = store_upload(&state, item("my plate.jpg")).await.expect("upload");
        assert_eq!(reference, "mem://my_plate.jpg");
    }
}
