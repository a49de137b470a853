use axum::{extract::Extension, Json};

use crate::domains::websites::Website;
use crate::server::app::AxumAppState;
use crate::server::ApiError;

/// GET /websites - ordered by name.
pub async fn websites_handler(
    Extension(state): Extension<AxumAppState>,
) -> Result<Json<Vec<Website>>, ApiError> {
    Ok(Json(state.deps.store.list_websites().await?))
}
