use crate::models::AssetRecord;
use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Characters escaped when an object key is embedded in its public URL.
/// `/` is kept, keys are folder-qualified.
const URL_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'#')
    .add(b'?')
    .add(b'%');

/// Narrow interface to the external storage provider. Everything behind it
/// (durability, CDN distribution, retries) is the provider's concern; callers
/// treat references as opaque handles.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Lists every asset stored under `folder`.
    async fn list_assets(&self, folder: &str) -> Result<Vec<AssetRecord>>;

    /// Streams a new asset into `folder` under `filename` and returns the
    /// provider's record for it.
    async fn upload_asset<'a>(
        &self,
        folder: &str,
        filename: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<AssetRecord>;

    /// Fetches the full contents of the asset behind `reference`, or `None`
    /// if the reference does not resolve to a stored asset.
    async fn fetch_asset(&self, reference: &str) -> Result<Option<Vec<u8>>>;

    /// Deletes the asset behind `reference`. Returns `false` if the
    /// reference does not resolve to a stored asset.
    async fn delete_asset(&self, reference: &str) -> Result<bool>;
}

pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3ObjectStorage {
    pub fn new(client: Client, bucket: String, endpoint_url: String) -> Self {
        let public_base = format!("{}/{}", endpoint_url.trim_end_matches('/'), bucket);
        Self {
            client,
            bucket,
            public_base,
        }
    }

    fn asset_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base,
            utf8_percent_encode(key, URL_UNSAFE)
        )
    }

    /// Inverse of `asset_url`: recovers the object key from a reference
    /// minted by this store. Foreign references yield `None`.
    fn key_from_reference(&self, reference: &str) -> Option<String> {
        let encoded = reference.strip_prefix(&format!("{}/", self.public_base))?;
        let key = percent_decode_str(encoded).decode_utf8().ok()?;
        if key.is_empty() { None } else { Some(key.into_owned()) }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn list_assets(&self, folder: &str) -> Result<Vec<AssetRecord>> {
        let prefix = format!("{}/", folder.trim_end_matches('/'));
        let mut records = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await?;

            for object in response.contents() {
                let key = object.key().map(|k| k.to_string());
                let last_modified = object
                    .last_modified()
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

                records.push(AssetRecord {
                    secure_url: key.as_deref().map(|k| self.asset_url(k)),
                    public_id: key,
                    bytes: object.size().unwrap_or(0),
                    created_at: last_modified,
                    updated_at: last_modified,
                });
            }

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(records)
    }

    async fn upload_asset<'a>(
        &self,
        folder: &str,
        filename: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<AssetRecord> {
        let key = format!("{}/{}", folder.trim_end_matches('/'), filename);

        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| anyhow::anyhow!("No upload ID"))?;
        let mut chunk_index = 1;
        let mut completed_parts = Vec::new();
        let mut total_size: i64 = 0;

        let chunk_size = 10 * 1024 * 1024;
        let mut buffer = vec![0u8; chunk_size];

        loop {
            let mut n = 0;
            while n < chunk_size {
                let read = reader.read(&mut buffer[n..]).await?;
                if read == 0 {
                    break;
                }
                n += read;
            }

            if n == 0 && chunk_index > 1 {
                break;
            }

            total_size += n as i64;
            let body = ByteStream::from(buffer[..n].to_vec());
            let upload_part_res = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(&key)
                .upload_id(upload_id)
                .body(body)
                .part_number(chunk_index)
                .send()
                .await?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(chunk_index)
                    .build(),
            );

            if n < chunk_size {
                break;
            }
            chunk_index += 1;
        }

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await?;

        let now = Utc::now();
        Ok(AssetRecord {
            secure_url: Some(self.asset_url(&key)),
            public_id: Some(key),
            bytes: total_size,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn fetch_asset(&self, reference: &str) -> Result<Option<Vec<u8>>> {
        let Some(key) = self.key_from_reference(reference) else {
            return Ok(None);
        };

        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match res {
            Ok(output) => {
                let data = output.body.collect().await?.into_bytes();
                Ok(Some(data.to_vec()))
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(anyhow::anyhow!(service_error))
                }
            }
        }
    }

    async fn delete_asset(&self, reference: &str) -> Result<bool> {
        let Some(key) = self.key_from_reference(reference) else {
            return Ok(false);
        };

        // DeleteObject succeeds on missing keys, so existence is checked
        // first to report unknown references to the caller.
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        if let Err(e) = head {
            let service_error = e.into_service_error();
            if service_error.is_not_found() {
                return Ok(false);
            }
            return Err(anyhow::anyhow!(service_error));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await?;

        Ok(true)
    }
}
