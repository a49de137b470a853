use std::collections::HashSet;

use tracing::info;

use super::execute_job::{fail_job, spawn_job};
use crate::common::WebsiteId;
use crate::domains::scraping::error::ScrapeError;
use crate::domains::scraping::events::publish_progress;
use crate::domains::scraping::models::{JobPatch, JobStatus, ScrapeJob};
use crate::domains::websites::models::Website;
use crate::kernel::{ServerDeps, StoreError};

/// Drop repeated ids, keeping first-seen order.
pub(crate) fn dedupe(ids: &[WebsiteId]) -> Vec<WebsiteId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Create a job for the selected websites and start executing it in the background.
pub async fn create_job(website_ids: &[WebsiteId], deps: &ServerDeps) -> Result<ScrapeJob, ScrapeError> {
    let (job, websites) = start_job(website_ids, deps).await?;
    spawn_job(job.id, websites, deps.clone());
    Ok(job)
}

/// Creation half of [`create_job`]: validate, insert the job and one `pending`
/// task row per site, then move the job to `in_progress`.
///
/// Returns the started job and its websites in selection order. Nothing is
/// scraped yet.
pub async fn start_job(
    website_ids: &[WebsiteId],
    deps: &ServerDeps,
) -> Result<(ScrapeJob, Vec<Website>), ScrapeError> {
    let selected = dedupe(website_ids);
    if selected.is_empty() {
        return Err(ScrapeError::InvalidRequest(
            "Select at least one website".to_string(),
        ));
    }

    let found = deps
        .store
        .find_websites(&selected)
        .await
        .map_err(|e| ScrapeError::orchestration("Failed to read websites", e))?;

    let mut websites = Vec::with_capacity(selected.len());
    let mut unknown = Vec::new();
    for id in &selected {
        match found.iter().find(|w| w.id == *id) {
            Some(website) => websites.push(website.clone()),
            None => unknown.push(id.to_string()),
        }
    }
    if !unknown.is_empty() {
        return Err(ScrapeError::InvalidRequest(format!(
            "Unknown website ids: {}",
            unknown.join(", ")
        )));
    }

    let job = deps
        .store
        .insert_job(&ScrapeJob::new_pending())
        .await
        .map_err(|e| ScrapeError::orchestration("Failed to create scrape job", e))?;
    info!(job_id = %job.id, sites = selected.len(), "Scrape job created");

    if let Err(e) = deps.store.insert_placeholders(job.id, &selected).await {
        fail_job(job.id, JobStatus::Pending, "Failed to create result rows", deps).await;
        return Err(ScrapeError::orchestration("Failed to create result rows", e));
    }

    let started = deps
        .store
        .transition_job(job.id, JobStatus::Pending, &JobPatch::start())
        .await
        .and_then(|job| job.ok_or_else(|| StoreError::MissingRow("scrape job start".to_string())));

    let job = match started {
        Ok(job) => job,
        Err(e) => {
            fail_job(job.id, JobStatus::Pending, "Failed to start scrape job", deps).await;
            return Err(ScrapeError::orchestration("Failed to start scrape job", e));
        }
    };

    publish_progress(deps, job.id).await;
    Ok((job, websites))
}
