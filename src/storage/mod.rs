//! Object storage seam. The CMS only ever needs three things from the bucket:
//! a signed PUT URL for direct uploads, a prefix listing and a bulk delete.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to presign {key}: {message}")]
    Presign { key: String, message: String },
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("invalid storage request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
    /// `(key, message)` for every object the backend refused to delete.
    pub failed: Vec<(String, String)>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn presign_put(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn delete_keys(&self, keys: &[String]) -> Result<DeleteOutcome, StorageError>;
}
