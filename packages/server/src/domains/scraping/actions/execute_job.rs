//! Execution half of a job: scrape every site, persist each outcome, finalize.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::common::ScrapeJobId;
use crate::domains::scraping::error::{ScrapeError, SiteScrapeError};
use crate::domains::scraping::events::publish_progress;
use crate::domains::scraping::models::{
    JobPatch, JobStatus, ResultPatch, ResultStatus, RowKind, ScrapeJob,
};
use crate::domains::websites::models::Website;
use crate::kernel::{ServerDeps, StoreResult};

/// What happened to one site during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteRun {
    /// Row was already claimed (or the run was aborted); nothing was scraped
    Skipped,
    Finished(ResultStatus),
}

/// Run [`run_job`] on a background task. Errors are logged, not returned.
pub fn spawn_job(job_id: ScrapeJobId, websites: Vec<Website>, deps: ServerDeps) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = run_job(job_id, websites, &deps).await {
            error!(job_id = %job_id, error = %e, "Scrape job failed");
        }
    })
}

/// Scrape `websites` for a job that is already `in_progress`, then finalize it.
///
/// Sites run concurrently up to `max_concurrent_scrapes`. A site failure only
/// marks that site's row. A store failure while persisting an outcome stops
/// further scrapes and fails the job.
///
/// Returns the job as finalized by this run, or `None` when rows are still
/// open elsewhere or another run already finalized it.
pub async fn run_job(
    job_id: ScrapeJobId,
    websites: Vec<Website>,
    deps: &ServerDeps,
) -> Result<Option<ScrapeJob>, ScrapeError> {
    info!(job_id = %job_id, sites = websites.len(), "Executing scrape job");

    let semaphore = Arc::new(Semaphore::new(deps.settings.max_concurrent_scrapes.max(1)));
    let abort = CancellationToken::new();

    let runs = websites.iter().map(|website| {
        let semaphore = semaphore.clone();
        let abort = abort.clone();
        async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return Ok(SiteRun::Skipped);
            };
            if abort.is_cancelled() {
                return Ok(SiteRun::Skipped);
            }
            let run = scrape_site(job_id, website, deps).await;
            if run.is_err() {
                abort.cancel();
            }
            run
        }
    });

    let outcomes = join_all(runs).await;

    if let Some(err) = outcomes.into_iter().find_map(Result::err) {
        let message = format!("Failed to persist scrape result: {}", err);
        fail_job(job_id, JobStatus::InProgress, &message, deps).await;
        return Err(ScrapeError::orchestration("Failed to persist scrape result", err));
    }

    finalize_job(job_id, deps)
        .await
        .map_err(|e| ScrapeError::orchestration("Failed to finalize scrape job", e))
}

/// Claim one site's row, scrape it, and write the terminal status.
pub async fn scrape_site(
    job_id: ScrapeJobId,
    website: &Website,
    deps: &ServerDeps,
) -> StoreResult<SiteRun> {
    let claimed = deps
        .store
        .transition_result(job_id, website.id, ResultStatus::Pending, &ResultPatch::in_progress())
        .await?;
    if claimed.is_none() {
        debug!(job_id = %job_id, website_id = %website.id, "Row already claimed, skipping");
        return Ok(SiteRun::Skipped);
    }
    publish_progress(deps, job_id).await;

    let timeout = deps.settings.scrape_timeout;
    let outcome = match tokio::time::timeout(timeout, deps.scraper.scrape(website)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SiteScrapeError::Timeout {
            url: website.url.clone(),
            timeout_secs: timeout.as_secs(),
        }),
    };

    let patch = match outcome {
        Ok(outcome) => {
            info!(job_id = %job_id, website_id = %website.id, title = %outcome.title, "Site scraped");
            ResultPatch::success(outcome)
        }
        Err(e) => {
            warn!(job_id = %job_id, website_id = %website.id, url = %website.url, error = %e, "Site scrape failed");
            ResultPatch::failed(e.to_string())
        }
    };
    let status = patch.status;

    let written = deps
        .store
        .transition_result(job_id, website.id, ResultStatus::InProgress, &patch)
        .await?;
    if written.is_none() {
        warn!(job_id = %job_id, website_id = %website.id, "Row left in_progress before outcome was written");
    }
    publish_progress(deps, job_id).await;

    Ok(SiteRun::Finished(status))
}

/// Mark the job `completed` once every task row is terminal.
///
/// Conditional on the job being `in_progress`, so repeating it is a no-op.
pub async fn finalize_job(job_id: ScrapeJobId, deps: &ServerDeps) -> StoreResult<Option<ScrapeJob>> {
    let results = deps.store.results_for_job(job_id).await?;
    let open = results
        .iter()
        .filter(|r| r.kind == Some(RowKind::Task) && !r.status.is_terminal())
        .count();
    if open > 0 {
        debug!(job_id = %job_id, open, "Task rows still open, not finalizing");
        return Ok(None);
    }

    let job = deps
        .store
        .transition_job(job_id, JobStatus::InProgress, &JobPatch::complete())
        .await?;

    match &job {
        Some(_) => {
            info!(job_id = %job_id, "Scrape job completed");
            publish_progress(deps, job_id).await;
        }
        None => debug!(job_id = %job_id, "Scrape job already finalized"),
    }
    Ok(job)
}

/// Move a job from `from` to `failed`. Returns whether this call failed it.
pub async fn fail_job(job_id: ScrapeJobId, from: JobStatus, message: &str, deps: &ServerDeps) -> bool {
    match deps
        .store
        .transition_job(job_id, from, &JobPatch::fail(message))
        .await
    {
        Ok(Some(_)) => {
            warn!(job_id = %job_id, reason = message, "Scrape job marked failed");
            publish_progress(deps, job_id).await;
            true
        }
        Ok(None) => false,
        Err(e) => {
            error!(job_id = %job_id, error = %e, "Could not mark scrape job failed");
            false
        }
    }
}
