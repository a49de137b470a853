//! POST /scrape - fire-and-forget trigger for a client-created job.

use axum::{extract::rejection::JsonRejection, extract::Extension, Json};
use serde::{Deserialize, Serialize};

use super::{json_body, parse_job_id, parse_website_ids};
use crate::domains::scraping::actions::dispatch_job;
use crate::server::app::AxumAppState;
use crate::server::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub job_id: String,
    #[serde(default)]
    pub website_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub message: String,
}

/// Responds as soon as execution is spawned; outcomes land on the job's rows.
pub async fn dispatch_handler(
    Extension(state): Extension<AxumAppState>,
    body: Result<Json<DispatchRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let request = json_body(body)?;
    let job_id = parse_job_id(&request.job_id)?;
    let website_ids = parse_website_ids(&request.website_ids)?;

    let count = dispatch_job(job_id, &website_ids, &state.deps).await?;

    Ok(Json(DispatchResponse {
        message: format!("Scraping started for {} websites", count),
    }))
}
