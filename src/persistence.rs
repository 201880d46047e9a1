//! Whole-document JSON persistence.
//!
//! Every durable collection is one JSON file. Reads never fail: a missing or
//! corrupt document reads as `T::default()`. Writes replace the whole file via
//! a sibling temp file and a rename, so a failed write keeps the previous
//! document. An update over a document that does not parse first moves it
//! aside to `<name>.corrupt-<ms>`, so its bytes are never overwritten.
//!
//! The mutex below only serializes writers inside this process. Two processes
//! sharing a data directory can still lose each other's updates.

use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::ids::now_millis;

#[derive(Debug)]
pub struct JsonDocument<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> T {
        read_or_default(&self.path).await
    }

    #[cfg(test)]
    pub async fn write(&self, value: &T) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        write_document(&self.path, value).await
    }

    /// Read-modify-write under the document lock. Returns the new document
    /// together with whatever the closure produced.
    pub async fn update<R, F>(&self, f: F) -> anyhow::Result<(T, R)>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.update_then(f, |_, _| ()).await
    }

    /// Like [`update`](Self::update), but `after_write` runs once the new
    /// document is on disk, before the lock is released. It does not run
    /// when the write fails.
    pub async fn update_then<R, F, A>(&self, f: F, after_write: A) -> anyhow::Result<(T, R)>
    where
        F: FnOnce(&mut T) -> R,
        A: FnOnce(&T, &R),
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = read_for_update(&self.path).await?;
        let out = f(&mut doc);
        write_document(&self.path, &doc).await?;
        after_write(&doc, &out);
        Ok((doc, out))
    }
}

/// Current document for a read-modify-write. Missing means default; a file
/// that does not parse is renamed aside first, and anything else unreadable
/// fails the update.
async fn read_for_update<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    match serde_json::from_slice(&raw) {
        Ok(doc) => Ok(doc),
        Err(e) => {
            let aside = corrupt_path(path);
            tokio::fs::rename(path, &aside)
                .await
                .with_context(|| format!("move aside {}", path.display()))?;
            warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "document corrupt, starting a fresh one"
            );
            Ok(T::default())
        }
    }
}

pub async fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "document missing, using default");
            return T::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "document unreadable, using default");
            return T::default();
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "document corrupt, using default");
            T::default()
        }
    }
}

pub async fn write_document<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create dir {}", dir.display()))?;
    }

    let body = serde_json::to_vec_pretty(value).context("serialize document")?;
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &body)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("replace {}", path.display()));
    }
    debug!(path = %path.display(), bytes = body.len(), "document written");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

fn corrupt_path(path: &Path) -> PathBuf {
    sibling(path, &format!(".corrupt-{}", now_millis()))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
