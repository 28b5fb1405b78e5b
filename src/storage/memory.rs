use std::{collections::BTreeSet, sync::Mutex, time::Duration};

use async_trait::async_trait;

use super::{DeleteOutcome, ObjectStore, StorageError};

/// Bucket kept in process memory. Presigned URLs use a `memory://` scheme and
/// are never fetched; tests and local runs insert objects directly.
#[derive(Default)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeSet<String>>,
    /// Keys that refuse deletion, to exercise partial failures.
    locked: Mutex<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn insert(&self, key: impl Into<String>) {
        self.objects.lock().unwrap().insert(key.into());
    }

    pub fn lock_key(&self, key: impl Into<String>) {
        self.locked.lock().unwrap().insert(key.into());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().iter().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn presign_put(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidRequest("empty key".to_string()));
        }
        Ok(format!(
            "memory://{}/{key}?expires_in={}",
            self.bucket,
            expires_in.as_secs()
        ))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<DeleteOutcome, StorageError> {
        let locked = self.locked.lock().unwrap();
        let mut objects = self.objects.lock().unwrap();
        let mut outcome = DeleteOutcome::default();
        for key in keys {
            if locked.contains(key) {
                outcome.failed.push((key.clone(), "AccessDenied".to_string()));
            } else if objects.remove(key) {
                outcome.deleted.push(key.clone());
            }
        }
        Ok(outcome)
    }
}
