use std::{fmt, str::FromStr, time::Duration};

use futures::future::try_join_all;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use prometheus::{register_int_counter_vec, IntCounterVec};
use serde::{Deserialize, Serialize};
use serde_with::{formats::CommaSeparator, serde_as, StringWithSeparator};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::{ObjectStore, StorageError};

lazy_static::lazy_static! {
    static ref SIGNED_URLS: IntCounterVec = register_int_counter_vec!("photo_events_signed_urls", "presigned upload urls issued", &["kind"]).unwrap();
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid file extension: {0:?}")]
    InvalidExtension(String),
    #[error("Invalid quantity: {0:?}")]
    InvalidQuantity(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    Jpg,
    Jpeg,
    Png,
    Webp,
    Avif,
    Jxl,
}

impl Extension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Jpg => "jpg",
            Extension::Jpeg => "jpeg",
            Extension::Png => "png",
            Extension::Webp => "webp",
            Extension::Avif => "avif",
            Extension::Jxl => "jxl",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Extension {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "jpg" => Extension::Jpg,
            "jpeg" => Extension::Jpeg,
            "png" => Extension::Png,
            "webp" => Extension::Webp,
            "avif" => Extension::Avif,
            "jxl" => Extension::Jxl,
            _ => return Err(UploadError::InvalidExtension(s.to_string())),
        })
    }
}

/// Raw query string of `GET /signed_url`.
#[serde_as]
#[derive(Deserialize, Debug, Default)]
pub struct SignedUrlQuery {
    pub quantity: Option<String>,
    pub extension: Option<String>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    pub thumbnail_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub quantity: usize,
    pub extension: Extension,
    pub thumbnail_extensions: IndexSet<Extension>,
}

impl UploadRequest {
    pub fn from_query(query: SignedUrlQuery, max_quantity: usize) -> Result<Self, UploadError> {
        let extension = match &query.extension {
            Some(extension) => extension.parse()?,
            None => Extension::Jpg,
        };
        let thumbnail_extensions = query
            .thumbnail_extensions
            .unwrap_or_default()
            .iter()
            .map(|extension| extension.parse())
            .collect::<Result<IndexSet<Extension>, _>>()?;
        let quantity = match query.quantity {
            None => 1,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(quantity) if quantity <= max_quantity => quantity,
                _ => return Err(UploadError::InvalidQuantity(raw)),
            },
        };
        Ok(Self {
            quantity,
            extension,
            thumbnail_extensions,
        })
    }
}

/// Upload slots for one photo. Thumbnail maps are only present when thumbnail
/// extensions were requested.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub id: Uuid,
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<IndexMap<Extension, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail: Option<IndexMap<Extension, String>>,
}

pub fn raw_key(id: Uuid, extension: Extension) -> String {
    format!("{id}.{extension}")
}

pub fn thumbnail_key(id: Uuid, extension: Extension) -> String {
    format!("{id}_thumbnail.{extension}")
}

pub fn small_thumbnail_key(id: Uuid, extension: Extension) -> String {
    format!("{id}_small.{extension}")
}

async fn issue_one(
    store: &dyn ObjectStore,
    request: &UploadRequest,
    expires_in: Duration,
) -> Result<SignedUpload, StorageError> {
    let id = Uuid::new_v4();

    let raw_key = raw_key(id, request.extension);
    let raw = store.presign_put(&raw_key, expires_in);
    let thumbnails = try_join_all(request.thumbnail_extensions.iter().map(|&extension| {
        async move {
            let thumbnail = store
                .presign_put(&thumbnail_key(id, extension), expires_in)
                .await?;
            let small = store
                .presign_put(&small_thumbnail_key(id, extension), expires_in)
                .await?;
            Ok::<_, StorageError>((extension, thumbnail, small))
        }
    }));
    let (raw, thumbnails) = futures::try_join!(raw, thumbnails)?;
    SIGNED_URLS.with_label_values(&["raw"]).inc();

    if thumbnails.is_empty() {
        return Ok(SignedUpload {
            id,
            raw,
            thumbnail: None,
            small_thumbnail: None,
        });
    }
    SIGNED_URLS
        .with_label_values(&["thumbnail"])
        .inc_by(thumbnails.len() as u64);
    SIGNED_URLS
        .with_label_values(&["small"])
        .inc_by(thumbnails.len() as u64);

    let mut thumbnail = IndexMap::new();
    let mut small_thumbnail = IndexMap::new();
    for (extension, url, small_url) in thumbnails {
        thumbnail.insert(extension, url);
        small_thumbnail.insert(extension, small_url);
    }
    Ok(SignedUpload {
        id,
        raw,
        thumbnail: Some(thumbnail),
        small_thumbnail: Some(small_thumbnail),
    })
}

/// Presigns a fresh set of upload keys for each requested photo. All presign
/// calls run concurrently and the first failure aborts the batch.
pub async fn issue_signed_urls(
    store: &dyn ObjectStore,
    request: &UploadRequest,
    expires_in: Duration,
) -> Result<Vec<SignedUpload>, UploadError> {
    debug!(
        "issuing {} upload slots ({} + {:?})",
        request.quantity, request.extension, request.thumbnail_extensions
    );
    let uploads =
        try_join_all((0..request.quantity).map(|_| issue_one(store, request, expires_in))).await?;
    Ok(uploads)
}
