//! Error taxonomy for the scrape job lifecycle.

use thiserror::Error;

use crate::common::ScrapeJobId;
use crate::domains::scraping::models::JobStatus;
use crate::kernel::store::StoreError;

/// Errors surfaced to callers of job creation and dispatch.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Empty selection or unknown website ids. No job was created or touched.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("scrape job {0} not found")]
    NotFound(ScrapeJobId),

    #[error("scrape job {job_id} is already {status}")]
    Conflict { job_id: ScrapeJobId, status: JobStatus },

    /// The store could not be read or written while orchestrating a job.
    #[error("{context}: {source}")]
    Orchestration {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl ScrapeError {
    pub fn orchestration(context: impl Into<String>, source: StoreError) -> Self {
        Self::Orchestration {
            context: context.into(),
            source,
        }
    }
}

/// A single site's scrape attempt failed. Recorded on that site's row only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiteScrapeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Timed out after {timeout_secs}s fetching {url}")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Connection failed: {0}")]
    Network(String),

    #[error("Could not parse page: {0}")]
    Parse(String),
}
