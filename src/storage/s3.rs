//! S3-compatible object store backend

use crate::config::StorageConfig;
use crate::storage::traits::{generate_filename, PageStore, StorageError, StorageResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

const KEY_PREFIX: &str = "crawls";

/// Stores pages as objects keyed `crawls/{job_id}/{filename}`
#[derive(Debug, Clone)]
pub struct S3PageStore {
    client: S3Client,
    bucket: String,
}

impl S3PageStore {
    /// Wraps an already configured client
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Builds a client from the storage section of the configuration
    ///
    /// Credentials come from the default AWS provider chain. A custom
    /// endpoint switches to path-style addressing for S3-compatible stores.
    pub async fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        let bucket = config
            .bucket
            .clone()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| StorageError::Config("s3 backend requires a bucket".to_string()))?;

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::info!(
            "S3 page store configured (bucket: {}, region: {})",
            bucket,
            config.region
        );
        Ok(Self::new(S3Client::from_conf(builder.build()), bucket))
    }

    fn object_key(job_id: &str, filename: &str) -> String {
        format!("{}/{}/{}", KEY_PREFIX, job_id, filename)
    }
}

#[async_trait]
impl PageStore for S3PageStore {
    async fn save(&self, job_id: &str, source_url: &str, content: &[u8]) -> StorageResult<String> {
        let key = Self::object_key(job_id, &generate_filename(source_url));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("text/html; charset=utf-8")
            .body(ByteStream::from(content.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::ObjectStore(DisplayErrorContext(&e).to_string()))?;

        Ok(format!("s3://{}/{}", self.bucket, key))
    }

    async fn is_healthy(&self) -> bool {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    "S3 bucket {} unavailable: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                );
                false
            }
        }
    }

    fn base_location(&self, job_id: &str) -> String {
        format!("s3://{}/{}/{}", self.bucket, KEY_PREFIX, job_id)
    }

    fn kind(&self) -> &'static str {
        "s3"
    }
}
