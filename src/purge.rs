use log::{info, warn};
use prometheus::{register_int_counter, IntCounter};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::{ObjectStore, StorageError};

lazy_static::lazy_static! {
    static ref DELETED_OBJECTS: IntCounter = register_int_counter!("photo_events_deleted_objects", "objects removed from the bucket").unwrap();
}

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("Invalid id type")]
    InvalidId,
    #[error("Object is not found")]
    NotFound,
    #[error("An error has occurred during deleting an object")]
    PartialFailure { failed: Vec<(String, String)> },
    #[error("Object was not deleted")]
    NothingDeleted,
    #[error("Failed to delete the object")]
    Storage(#[from] StorageError),
}

/// Accepts only the 8-4-4-4-12 hyphenated form, in any case. Upload keys are
/// written lower-case, so callers should prefix-match on the parsed value.
pub fn parse_object_id(id: &str) -> Option<Uuid> {
    if id.len() != 36 {
        return None;
    }
    Uuid::parse_str(id).ok()
}

/// Removes the full-size upload and every thumbnail stored under `id`.
/// Returns the deleted keys.
pub async fn purge_objects(store: &dyn ObjectStore, id: &str) -> Result<Vec<String>, PurgeError> {
    let id = parse_object_id(id).ok_or(PurgeError::InvalidId)?;
    let prefix = id.hyphenated().to_string();

    let keys = store.list_keys(&prefix).await?;
    if keys.is_empty() {
        return Err(PurgeError::NotFound);
    }

    let outcome = store.delete_keys(&keys).await?;
    DELETED_OBJECTS.inc_by(outcome.deleted.len() as u64);
    if !outcome.failed.is_empty() {
        for (key, message) in &outcome.failed {
            warn!("failed to delete {key}: {message}");
        }
        return Err(PurgeError::PartialFailure {
            failed: outcome.failed,
        });
    }
    if outcome.deleted.is_empty() {
        return Err(PurgeError::NothingDeleted);
    }
    info!("deleted {} objects under {prefix}", outcome.deleted.len());
    Ok(outcome.deleted)
}
