//! Job creation and the polled read surface.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{json_body, parse_job_id, parse_website_ids};
use crate::domains::scraping::actions::{
    create_job, get_job, get_results, job_history, load_progress, DEFAULT_HISTORY_LIMIT,
};
use crate::domains::scraping::{JobSummary, ProgressView, ScrapeJob, ScrapeResult};
use crate::server::app::AxumAppState;
use crate::server::ApiError;

/// Upper bound on `GET /jobs?limit=`
const MAX_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(default)]
    pub website_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// POST /jobs - create a job and start executing it.
pub async fn create_job_handler(
    Extension(state): Extension<AxumAppState>,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScrapeJob>), ApiError> {
    let request = json_body(body)?;
    let website_ids = parse_website_ids(&request.website_ids)?;

    let job = create_job(&website_ids, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn job_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<String>,
) -> Result<Json<ScrapeJob>, ApiError> {
    let job_id = parse_job_id(&id)?;
    Ok(Json(get_job(state.deps.store.as_ref(), job_id).await?))
}

pub async fn job_results_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ScrapeResult>>, ApiError> {
    let job_id = parse_job_id(&id)?;
    Ok(Json(get_results(state.deps.store.as_ref(), job_id).await?))
}

pub async fn job_progress_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<String>,
) -> Result<Json<ProgressView>, ApiError> {
    let job_id = parse_job_id(&id)?;
    Ok(Json(load_progress(state.deps.store.as_ref(), job_id).await?))
}

/// GET /jobs?limit=N - most recent jobs first.
pub async fn job_history_handler(
    Extension(state): Extension<AxumAppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<JobSummary>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(job_history(state.deps.store.as_ref(), limit).await?))
}
