// HTTP routes
pub mod health;
pub mod jobs;
pub mod scrape;
pub mod stream;
pub mod websites;

pub use health::*;
pub use jobs::*;
pub use scrape::*;
pub use stream::*;
pub use websites::*;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::common::{ScrapeJobId, WebsiteId};
use crate::server::ApiError;

/// Unwrap a JSON body, reporting malformed input as a 400 `{error}` body.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

pub(crate) fn parse_job_id(raw: &str) -> Result<ScrapeJobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid job id: {}", raw)))
}

pub(crate) fn parse_website_ids(raw: &[String]) -> Result<Vec<WebsiteId>, ApiError> {
    raw.iter()
        .map(|id| {
            id.parse()
                .map_err(|_| ApiError::bad_request(format!("Invalid website id: {}", id)))
        })
        .collect()
}
