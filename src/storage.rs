use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::S3Config;

/// Opaque image storage. `put_object` returns the reference recorded on the
/// food entry.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

/// Files under one directory; references are the joined paths.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create upload dir {}", self.root.display()))?;
        let path = self.root.join(key);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write blob {}", path.display()))?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.root.join(key);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("delete blob {}", path.display()))
    }
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub async fn new(cfg: &S3Config) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(format!("s3://{}/{}", self.bucket, key))
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }
}

/// In-memory store for tests; can be told to fail every write.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    pub objects: parking_lot::Mutex<Vec<(String, Bytes)>>,
    pub fail_puts: bool,
}

#[cfg(test)]
impl MemoryBlobStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().iter().map(|(k, _)| k.clone()).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        if self.fail_puts {
            anyhow::bail!("blob store unavailable");
        }
        self.objects.lock().push((key.to_string(), body));
        Ok(format!("mem://{key}"))
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().retain(|(k, _)| k != key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn local_store_writes_and_deletes() {
        let tmp = TempDir::new().expect("tmp");
        let store = LocalBlobStore::new(tmp.path().join("uploads"));

        let reference = store
            .put_object("custom_1_a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .expect("put");
        assert!(reference.ends_with("custom_1_a.jpg"));
        assert_eq!(std::fs::read(&reference).expect("read blob"), b"jpeg");

        store.delete_object("custom_1_a.jpg").await.expect("delete");
        assert!(!std::path::Path::new(&reference).exists());
    }
}
