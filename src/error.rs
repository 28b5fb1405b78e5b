//! Maps domain failures onto `axum_util` API errors. Client-visible messages
//! never carry backend details; those are logged here instead.

use axum::{http::StatusCode, response::IntoResponse, Json};
use axum_util::errors::{ApiError, ErrorBody};
use log::error;

use crate::{purge::PurgeError, upload::UploadError};

fn with_message(status: StatusCode, message: impl Into<String>) -> ApiError {
    ApiError::Response(
        (
            status,
            Json(ErrorBody {
                message: message.into(),
            }),
        )
            .into_response(),
    )
}

pub fn upload_error(e: UploadError) -> ApiError {
    match e {
        UploadError::InvalidExtension(_) => {
            ApiError::BadRequest("Invalid file extension".to_string())
        }
        UploadError::InvalidQuantity(_) => ApiError::BadRequest(e.to_string()),
        UploadError::Storage(e) => {
            error!("failed to presign upload: {e}");
            with_message(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate signed URL")
        }
    }
}

pub fn purge_error(e: PurgeError) -> ApiError {
    match e {
        PurgeError::InvalidId => ApiError::BadRequest(e.to_string()),
        PurgeError::NotFound => with_message(StatusCode::NOT_FOUND, e.to_string()),
        PurgeError::PartialFailure { .. } | PurgeError::NothingDeleted => {
            with_message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        PurgeError::Storage(ref inner) => {
            error!("failed to purge objects: {inner}");
            with_message(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
