use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{error, info, warn};

use super::execute_job::{fail_job, finalize_job, run_job};
use crate::common::{ScrapeJobId, WebsiteId};
use crate::config::ScrapeSettings;
use crate::domains::scraping::error::ScrapeError;
use crate::domains::scraping::events::publish_progress;
use crate::domains::scraping::models::{JobStatus, ResultPatch, ResultStatus, RowKind};
use crate::kernel::ServerDeps;

pub const INTERRUPTED_MESSAGE: &str = "Interrupted before completion";
pub const MISSING_WEBSITE_MESSAGE: &str = "Website no longer exists";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Jobs picked up
    pub jobs: usize,
    /// Rows a previous process left `in_progress`, now `failed`
    pub interrupted_rows: usize,
    /// Jobs that could not be resumed
    pub errors: usize,
}

/// Extra time past the scrape timeout before an `in_progress` row counts as abandoned.
pub const CLAIM_GRACE: Duration = Duration::from_secs(5);

/// How long a claimed row may stay `in_progress` while a live run owns it.
///
/// A live scrape ends within `scrape_timeout`; the grace covers the write of
/// its outcome.
pub fn claim_lease(settings: &ScrapeSettings) -> Duration {
    settings.scrape_timeout + CLAIM_GRACE
}

/// Resume every job a previous process left `in_progress`.
///
/// Pending rows are scraped right away. Rows already `in_progress` may belong
/// to a run that is still alive, so they are only failed once the claim lease
/// (counted from the start of recovery) has passed and they are still open.
pub async fn recover_orphaned_jobs(deps: &ServerDeps) -> Result<RecoveryReport, ScrapeError> {
    let lease_deadline = Instant::now() + claim_lease(&deps.settings);

    let jobs = deps
        .store
        .jobs_with_status(JobStatus::InProgress)
        .await
        .map_err(|e| ScrapeError::orchestration("Failed to list in-progress jobs", e))?;

    let mut report = RecoveryReport::default();
    for job in jobs {
        report.jobs += 1;
        match resume_job(job.id, lease_deadline, deps).await {
            Ok(interrupted) => report.interrupted_rows += interrupted,
            Err(e) => {
                report.errors += 1;
                error!(job_id = %job.id, error = %e, "Could not resume scrape job");
            }
        }
    }

    if report.jobs > 0 {
        info!(
            jobs = report.jobs,
            interrupted_rows = report.interrupted_rows,
            errors = report.errors,
            "Recovered orphaned scrape jobs"
        );
    }
    Ok(report)
}

/// Scrape the still-pending rows, fail rows whose claim outlived the lease,
/// finalize. Returns the number of interrupted rows.
async fn resume_job(
    job_id: ScrapeJobId,
    lease_deadline: Instant,
    deps: &ServerDeps,
) -> Result<usize, ScrapeError> {
    let rows = deps
        .store
        .results_for_job(job_id)
        .await
        .map_err(|e| ScrapeError::orchestration("Failed to read result rows", e))?;

    let mut claimed: Vec<WebsiteId> = Vec::new();
    let mut pending: Vec<WebsiteId> = Vec::new();
    for row in rows.iter().filter(|r| r.kind == Some(RowKind::Task)) {
        match row.status {
            ResultStatus::InProgress => claimed.push(row.website_id),
            ResultStatus::Pending => pending.push(row.website_id),
            ResultStatus::Success | ResultStatus::Failed => {}
        }
    }

    let websites = match deps.store.find_websites(&pending).await {
        Ok(websites) => websites,
        Err(e) => {
            fail_job(job_id, JobStatus::InProgress, "Failed to read websites", deps).await;
            return Err(ScrapeError::orchestration("Failed to read websites", e));
        }
    };

    // Rows whose website vanished can never be scraped; close them so the job can finish
    for website_id in pending.iter().filter(|id| !websites.iter().any(|w| w.id == **id)) {
        warn!(job_id = %job_id, website_id = %website_id, "Pending row references a missing website");
        deps.store
            .transition_result(
                job_id,
                *website_id,
                ResultStatus::Pending,
                &ResultPatch::failed(MISSING_WEBSITE_MESSAGE),
            )
            .await
            .map_err(|e| ScrapeError::orchestration("Failed to update result row", e))?;
    }

    info!(job_id = %job_id, pending = websites.len(), claimed = claimed.len(), "Resuming scrape job");
    if run_job(job_id, websites, deps).await?.is_some() || claimed.is_empty() {
        return Ok(0);
    }

    sleep_until(lease_deadline).await;

    // Only rows still open after the lease are abandoned; a live run has written its outcome by now
    let mut interrupted = 0;
    for website_id in claimed {
        let failed = deps
            .store
            .transition_result(
                job_id,
                website_id,
                ResultStatus::InProgress,
                &ResultPatch::failed(INTERRUPTED_MESSAGE),
            )
            .await
            .map_err(|e| ScrapeError::orchestration("Failed to update result row", e))?;
        if failed.is_some() {
            interrupted += 1;
        }
    }
    if interrupted > 0 {
        publish_progress(deps, job_id).await;
    }

    finalize_job(job_id, deps)
        .await
        .map_err(|e| ScrapeError::orchestration("Failed to finalize scrape job", e))?;
    Ok(interrupted)
}
