use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use axum_util::errors::ApiResult;

use crate::{error::purge_error, purge::purge_objects};

use super::AppState;

pub async fn delete_contents(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    purge_objects(state.store.as_ref(), &id)
        .await
        .map_err(purge_error)?;
    Ok(StatusCode::NO_CONTENT)
}
