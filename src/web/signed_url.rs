use axum::{
    extract::{Query, State},
    Json,
};
use axum_util::errors::ApiResult;

use crate::{
    error::upload_error,
    upload::{issue_signed_urls, SignedUpload, SignedUrlQuery, UploadRequest},
};

use super::AppState;

pub async fn signed_url(
    State(state): State<AppState>,
    Query(query): Query<SignedUrlQuery>,
) -> ApiResult<Json<Vec<SignedUpload>>> {
    let request =
        UploadRequest::from_query(query, state.upload.max_quantity).map_err(upload_error)?;
    let expires_in = state.upload.signed_url_lifetime();

    let uploads = issue_signed_urls(state.store.as_ref(), &request, expires_in)
        .await
        .map_err(upload_error)?;
    Ok(Json(uploads))
}
