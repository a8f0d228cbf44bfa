#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloud_file_manager::AppState;
use cloud_file_manager::config::AppConfig;
use cloud_file_manager::models::AssetRecord;
use cloud_file_manager::services::storage::ObjectStorage;
use cloud_file_manager::utils::validation::UploadPolicy;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};

pub const MEMORY_BASE: &str = "memory://bucket";

struct StoredObject {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory stand-in for the external storage provider, keyed exactly like
/// the real one (folder-prefixed object keys, URL-shaped references).
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(key: &str) -> String {
        format!("{}/{}", MEMORY_BASE, key)
    }

    pub fn seed(&self, key: &str, data: &[u8], modified: DateTime<Utc>) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                modified,
            },
        );
    }

    fn key_from_reference(reference: &str) -> Option<String> {
        reference
            .strip_prefix(&format!("{}/", MEMORY_BASE))
            .map(|k| k.to_string())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn list_assets(&self, folder: &str) -> anyhow::Result<Vec<AssetRecord>> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, stored)| AssetRecord {
                public_id: Some(key.clone()),
                bytes: stored.data.len() as i64,
                created_at: Some(stored.modified),
                updated_at: Some(stored.modified),
                secure_url: Some(Self::reference(key)),
            })
            .collect())
    }

    async fn upload_asset<'a>(
        &self,
        folder: &str,
        filename: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> anyhow::Result<AssetRecord> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        let key = format!("{}/{}", folder.trim_end_matches('/'), filename);
        let now = Utc::now();
        let bytes = data.len() as i64;
        self.objects.lock().unwrap().insert(
            key.clone(),
            StoredObject {
                data,
                modified: now,
            },
        );

        Ok(AssetRecord {
            secure_url: Some(Self::reference(&key)),
            public_id: Some(key),
            bytes,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn fetch_asset(&self, reference: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let Some(key) = Self::key_from_reference(reference) else {
            return Ok(None);
        };
        let objects = self.objects.lock().unwrap();
        Ok(objects.get(&key).map(|stored| stored.data.clone()))
    }

    async fn delete_asset(&self, reference: &str) -> anyhow::Result<bool> {
        let Some(key) = Self::key_from_reference(reference) else {
            return Ok(false);
        };
        Ok(self.objects.lock().unwrap().remove(&key).is_some())
    }
}

pub fn test_state(storage: Arc<MemoryStorage>) -> AppState {
    let config = AppConfig::development();
    let policy = UploadPolicy::new(&config.allowed_extensions);
    AppState {
        storage,
        policy,
        config,
    }
}

/// Encodes an opaque reference for use as a single path segment.
pub fn encode_reference(reference: &str) -> String {
    utf8_percent_encode(reference, NON_ALPHANUMERIC).to_string()
}

/// Builds a multipart/form-data body with one file field.
pub fn multipart_file_body(boundary: &str, filename: &str, content: &str) -> String {
    format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n\
        {content}\r\n\
        --{boundary}--\r\n",
    )
}
