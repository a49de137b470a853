//! Read surface used by the HTTP routes, the poller and the CLI.

use futures::future::try_join_all;

use crate::common::{ScrapeJobId, WebsiteId};
use crate::domains::scraping::error::ScrapeError;
use crate::domains::scraping::models::{ScrapeJob, ScrapeResult};
use crate::domains::scraping::progress::{
    summarize_history, summarize_with_websites, JobSummary, ProgressView,
};
use crate::kernel::BaseScrapeStore;

/// Default size of the job history listing
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

fn read_error(context: &'static str) -> impl FnOnce(crate::kernel::StoreError) -> ScrapeError {
    move |e| ScrapeError::orchestration(context, e)
}

pub async fn get_job(store: &dyn BaseScrapeStore, job_id: ScrapeJobId) -> Result<ScrapeJob, ScrapeError> {
    store
        .find_job(job_id)
        .await
        .map_err(read_error("Failed to read scrape job"))?
        .ok_or(ScrapeError::NotFound(job_id))
}

pub async fn get_results(
    store: &dyn BaseScrapeStore,
    job_id: ScrapeJobId,
) -> Result<Vec<ScrapeResult>, ScrapeError> {
    get_job(store, job_id).await?;
    store
        .results_for_job(job_id)
        .await
        .map_err(read_error("Failed to read result rows"))
}

/// Current progress of a job, with website names resolved.
pub async fn load_progress(
    store: &dyn BaseScrapeStore,
    job_id: ScrapeJobId,
) -> Result<ProgressView, ScrapeError> {
    let job = get_job(store, job_id).await?;
    let results = store
        .results_for_job(job_id)
        .await
        .map_err(read_error("Failed to read result rows"))?;

    let mut website_ids: Vec<WebsiteId> = results.iter().map(|r| r.website_id).collect();
    website_ids.sort();
    website_ids.dedup();
    let websites = store
        .find_websites(&website_ids)
        .await
        .map_err(read_error("Failed to read websites"))?;

    Ok(summarize_with_websites(&job, &results, &websites))
}

/// Most recent jobs first, each with its summary counts.
pub async fn job_history(
    store: &dyn BaseScrapeStore,
    limit: usize,
) -> Result<Vec<JobSummary>, ScrapeError> {
    let jobs = store
        .recent_jobs(limit)
        .await
        .map_err(read_error("Failed to read scrape jobs"))?;

    try_join_all(jobs.iter().map(|job| async move {
        let results = store
            .results_for_job(job.id)
            .await
            .map_err(read_error("Failed to read result rows"))?;
        Ok::<_, ScrapeError>(summarize_history(job, &results))
    }))
    .await
}
