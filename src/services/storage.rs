// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::StorageError;
use crate::models::storage::{file_extension, StorageFolder};
use async_trait::async_trait;
use chrono::Utc;
use s3::creds::Credentials;
use s3::Bucket;
use s3::Region;
use tracing::info;
use uuid::Uuid;

/// Object storage as seen by the probes: put bytes, get a public URL back.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `folder` and return the object's public URL.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
        folder: StorageFolder,
    ) -> Result<String, StorageError>;

    /// Remove an object previously returned by `upload`.
    async fn delete(&self, public_url: &str) -> Result<(), StorageError>;
}

/// Configuration for S3-compatible storage (Cloudflare R2 by default)
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL objects are publicly served from, without trailing slash
    pub public_url: String,
}

impl StorageConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, StorageError> {
        let account_id = std::env::var("R2_ACCOUNT_ID").ok();
        let access_key = std::env::var("R2_ACCESS_KEY_ID")
            .map_err(|_| StorageError::NotConfigured("R2_ACCESS_KEY_ID"))?;
        let secret_key = std::env::var("R2_SECRET_ACCESS_KEY")
            .map_err(|_| StorageError::NotConfigured("R2_SECRET_ACCESS_KEY"))?;

        let endpoint = match (std::env::var("S3_ENDPOINT").ok(), &account_id) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("https://{account}.r2.cloudflarestorage.com"),
            (None, None) => return Err(StorageError::NotConfigured("R2_ACCOUNT_ID")),
        };

        let public_url = match (std::env::var("R2_PUBLIC_URL").ok(), &account_id) {
            (Some(url), _) => url,
            (None, Some(account)) => format!("https://pub-{account}.r2.dev"),
            (None, None) => return Err(StorageError::NotConfigured("R2_PUBLIC_URL")),
        };

        let bucket = std::env::var("R2_BUCKET_NAME").unwrap_or_else(|_| "linktree-image".to_string());
        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string());

        Ok(Self {
            endpoint,
            region,
            bucket,
            access_key: access_key.trim().to_string(),
            secret_key: secret_key.trim().to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }
}

/// S3-compatible storage client for uploaded images and captured screenshots
pub struct StorageClient {
    bucket: Box<Bucket>,
    public_url: String,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region,
            endpoint: config.endpoint,
        };

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Client(format!("invalid credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Client(e.to_string()))?
            .with_path_style();

        info!(bucket = %config.bucket, "object storage configured");

        Ok(Self {
            bucket,
            public_url: config.public_url,
        })
    }

    /// Object key for a public URL served from this bucket.
    pub fn key_from_url(&self, public_url: &str) -> Option<String> {
        key_from_url(&self.public_url, public_url)
    }
}

#[async_trait]
impl ObjectStorage for StorageClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
        folder: StorageFolder,
    ) -> Result<String, StorageError> {
        let key = object_key(folder, filename, Uuid::now_v7(), Utc::now().timestamp_millis());

        let response = self
            .bucket
            .put_object_with_content_type(&key, &bytes, content_type)
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        if !(200..300).contains(&response.status_code()) {
            return Err(StorageError::Upload(format!(
                "unexpected status {} for {key}",
                response.status_code()
            )));
        }

        info!(key = %key, bytes = bytes.len(), content_type, "uploaded object");

        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn delete(&self, public_url: &str) -> Result<(), StorageError> {
        let key = self
            .key_from_url(public_url)
            .ok_or_else(|| StorageError::ForeignUrl(public_url.to_string()))?;

        self.bucket
            .delete_object(&key)
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        info!(key = %key, "deleted object");
        Ok(())
    }
}

/// `<folder>/<uuid>-<unix millis>.<ext>`
fn object_key(folder: StorageFolder, filename: &str, id: Uuid, millis: i64) -> String {
    format!("{}/{}-{}.{}", folder, id, millis, file_extension(filename))
}

fn key_from_url(public_base: &str, public_url: &str) -> Option<String> {
    public_url
        .strip_prefix(public_base)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}
