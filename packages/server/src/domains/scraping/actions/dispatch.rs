use std::collections::HashSet;

use tracing::info;

use super::create_job::dedupe;
use super::execute_job::{fail_job, spawn_job};
use crate::common::{ScrapeJobId, WebsiteId};
use crate::domains::scraping::error::ScrapeError;
use crate::domains::scraping::models::{JobPatch, JobStatus, RowKind};
use crate::kernel::ServerDeps;

/// Start execution for a job the client created itself.
///
/// Missing task rows are added for the selected sites, a `pending` job is
/// moved to `in_progress`, and execution is spawned. Returns how many
/// websites were dispatched.
pub async fn dispatch_job(
    job_id: ScrapeJobId,
    website_ids: &[WebsiteId],
    deps: &ServerDeps,
) -> Result<usize, ScrapeError> {
    let selected = dedupe(website_ids);
    if selected.is_empty() {
        return Err(ScrapeError::InvalidRequest(
            "websiteIds must not be empty".to_string(),
        ));
    }

    let job = deps
        .store
        .find_job(job_id)
        .await
        .map_err(|e| ScrapeError::orchestration("Failed to read scrape job", e))?
        .ok_or(ScrapeError::NotFound(job_id))?;

    if job.is_terminal() {
        return Err(ScrapeError::Conflict {
            job_id,
            status: job.status,
        });
    }

    let websites = match deps.store.find_websites(&selected).await {
        Ok(websites) => websites,
        Err(e) => {
            fail_job(job_id, job.status, "Failed to read websites", deps).await;
            return Err(ScrapeError::orchestration("Failed to read websites", e));
        }
    };
    if websites.is_empty() {
        return Err(ScrapeError::InvalidRequest("No websites found".to_string()));
    }

    let existing = match deps.store.results_for_job(job_id).await {
        Ok(rows) => rows,
        Err(e) => {
            fail_job(job_id, job.status, "Failed to read result rows", deps).await;
            return Err(ScrapeError::orchestration("Failed to read result rows", e));
        }
    };
    let covered: HashSet<WebsiteId> = existing
        .iter()
        .filter(|r| r.kind == Some(RowKind::Task))
        .map(|r| r.website_id)
        .collect();
    let missing: Vec<WebsiteId> = websites
        .iter()
        .map(|w| w.id)
        .filter(|id| !covered.contains(id))
        .collect();

    if !missing.is_empty() {
        if let Err(e) = deps.store.insert_placeholders(job_id, &missing).await {
            fail_job(job_id, job.status, "Failed to create result rows", deps).await;
            return Err(ScrapeError::orchestration("Failed to create result rows", e));
        }
    }

    if job.status == JobStatus::Pending {
        // None means a concurrent dispatch started it first, which is fine
        if let Err(e) = deps
            .store
            .transition_job(job_id, JobStatus::Pending, &JobPatch::start())
            .await
        {
            fail_job(job_id, JobStatus::Pending, "Failed to start scrape job", deps).await;
            return Err(ScrapeError::orchestration("Failed to start scrape job", e));
        }
    }

    let count = websites.len();
    info!(job_id = %job_id, sites = count, added_rows = missing.len(), "Scrape job dispatched");
    spawn_job(job_id, websites, deps.clone());
    Ok(count)
}
