use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    operation::list_objects_v2::ListObjectsV2Output,
    presigning::PresigningConfig,
    types::{Delete, ObjectIdentifier},
    Client,
};
use log::debug;

use super::{DeleteOutcome, ObjectStore, StorageError};
use crate::config::StorageConfig;

/// `DeleteObjects` accepts at most this many keys per request.
const MAX_DELETE_BATCH: usize = 1000;

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "photo-events-config",
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint())
            .credentials_provider(credentials)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket_name.clone(),
        }
    }
}

fn request_error(e: impl std::error::Error) -> StorageError {
    StorageError::Request(DisplayErrorContext(e).to_string())
}

/// Token for the next page, if the listing was cut short.
fn next_page(page: &ListObjectsV2Output) -> Option<String> {
    match page.next_continuation_token() {
        Some(token) if page.is_truncated().unwrap_or(false) => Some(token.to_string()),
        _ => None,
    }
}

/// One `DeleteObjects` payload per `MAX_DELETE_BATCH` keys.
fn delete_batches(keys: &[String]) -> Result<Vec<Delete>, StorageError> {
    keys.chunks(MAX_DELETE_BATCH)
        .map(|batch| {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
            Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| StorageError::InvalidRequest(e.to_string()))
        })
        .collect()
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn presign_put(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign {
                key: key.to_string(),
                message: DisplayErrorContext(e).to_string(),
            })?;
        Ok(request.uri().to_string())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = vec![];
        let mut continuation_token = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(request_error)?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
            match next_page(&page) {
                Some(token) => {
                    debug!("listing {prefix}: {} keys so far, continuing", keys.len());
                    continuation_token = Some(token);
                }
                None => break,
            }
        }
        Ok(keys)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<DeleteOutcome, StorageError> {
        let mut outcome = DeleteOutcome::default();
        for delete in delete_batches(keys)? {
            let response = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(request_error)?;

            outcome.deleted.extend(
                response
                    .deleted()
                    .iter()
                    .filter_map(|deleted| deleted.key().map(str::to_string)),
            );
            outcome.failed.extend(response.errors().iter().map(|error| {
                (
                    error.key().unwrap_or_default().to_string(),
                    error.message().unwrap_or_default().to_string(),
                )
            }));
        }
        Ok(outcome)
    }
}
